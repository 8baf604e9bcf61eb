use std::env;
use std::fmt;
use std::time::Duration;

use anyhow::{Context as _, bail};
use poise::serenity_prelude as serenity;

use hearth_utils::parse::{parse_positive_secs, parse_snowflake, parse_snowflake_list};

/// Default hold time of the welcome cooldown window.
pub const DEFAULT_WELCOME_COOLDOWN: Duration = Duration::from_secs(60);
/// Default spacing between liveness reports.
pub const DEFAULT_LIVENESS_INTERVAL: Duration = Duration::from_secs(3600);

/// Process configuration, validated once at startup and read-only afterwards.
#[derive(Clone)]
pub struct Config {
    pub token: String,
    pub role_id: Option<serenity::RoleId>,
    pub welcome_channel_id: Option<serenity::ChannelId>,
    pub operator_ids: Vec<serenity::UserId>,
    pub owner_ids: Vec<serenity::UserId>,
    pub guild_id: Option<serenity::GuildId>,
    pub welcome_cooldown: Duration,
    pub liveness_interval: Duration,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = lookup("DISCORD_TOKEN")
            .map(|value| value.trim().to_owned())
            .unwrap_or_default();
        if token.is_empty() {
            bail!("DISCORD_TOKEN is not set; the bot cannot start");
        }

        let role_id = optional_id(&lookup, "DISCORD_ROLE_ID")?.map(serenity::RoleId::new);
        let welcome_channel_id =
            optional_id(&lookup, "DISCORD_WELCOME_CHANNEL_ID")?.map(serenity::ChannelId::new);
        let guild_id = optional_id(&lookup, "DISCORD_GUILD_ID")?.map(serenity::GuildId::new);

        let operator_ids = id_list(&lookup, "ERROR_REPORT_USER_IDS")?
            .into_iter()
            .map(serenity::UserId::new)
            .collect();
        let owner_ids = id_list(&lookup, "BOT_OWNER_IDS")?
            .into_iter()
            .map(serenity::UserId::new)
            .collect();

        let welcome_cooldown = Duration::from_secs(parse_positive_secs(
            lookup("WELCOME_COOLDOWN_SECONDS").as_deref(),
            DEFAULT_WELCOME_COOLDOWN.as_secs(),
        ));
        let liveness_interval = Duration::from_secs(parse_positive_secs(
            lookup("LIVENESS_INTERVAL_SECONDS").as_deref(),
            DEFAULT_LIVENESS_INTERVAL.as_secs(),
        ));

        Ok(Self {
            token,
            role_id,
            welcome_channel_id,
            operator_ids,
            owner_ids,
            guild_id,
            welcome_cooldown,
            liveness_interval,
        })
    }
}

fn optional_id<F>(lookup: &F, key: &str) -> anyhow::Result<Option<u64>>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => parse_snowflake(&raw).with_context(|| format!("invalid {key}")),
        None => Ok(None),
    }
}

fn id_list<F>(lookup: &F, key: &str) -> anyhow::Result<Vec<u64>>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => parse_snowflake_list(&raw).with_context(|| format!("invalid {key}")),
        None => Ok(Vec::new()),
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("token", &"<redacted>")
            .field("role_id", &self.role_id)
            .field("welcome_channel_id", &self.welcome_channel_id)
            .field("operator_ids", &self.operator_ids)
            .field("owner_ids", &self.owner_ids)
            .field("guild_id", &self.guild_id)
            .field("welcome_cooldown", &self.welcome_cooldown)
            .field("liveness_interval", &self.liveness_interval)
            .finish()
    }
}
