use poise::serenity_prelude as serenity;
use poise::serenity_prelude::Mentionable as _;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::cooldown::CooldownGate;
use crate::escalation::Escalator;
use crate::notify::NotificationSink;

/// Where new members are sent to agree to the rules and verify.
pub const RULES_URL: &str =
    "https://discord.com/channels/1165775639798878288/1165775640918773843";

/// Build the welcome post for the members of `role_id`.
pub fn welcome_message(role_id: serenity::RoleId) -> String {
    format!(
        "Welcome, {}!\n\
         You should see a notice saying there are a few more steps before you can start chatting,\n\
         so press the confirmation button to agree to the rules.\n\
         Then verify at {} and come chat with everyone!",
        role_id.mention(),
        RULES_URL
    )
}

/// Entry points for gateway events that carry core behaviour.
#[derive(Clone)]
pub struct EventDispatcher {
    sink: NotificationSink,
    escalator: Escalator,
    gate: CooldownGate,
    role_id: Option<serenity::RoleId>,
    welcome_channel_id: Option<serenity::ChannelId>,
}

impl EventDispatcher {
    pub fn new(config: &Config, sink: NotificationSink, escalator: Escalator) -> Self {
        Self {
            sink,
            escalator,
            gate: CooldownGate::new(config.welcome_cooldown),
            role_id: config.role_id,
            welcome_channel_id: config.welcome_channel_id,
        }
    }

    pub fn gate(&self) -> &CooldownGate {
        &self.gate
    }

    /// Post the welcome message unless the cooldown window is already taken.
    ///
    /// Never fails: lookup or send errors are escalated to the operators.
    pub async fn on_member_join(&self, guild_id: serenity::GuildId, user_id: serenity::UserId) {
        self.escalator
            .guard("on_member_join", self.welcome(guild_id, user_id))
            .await;
    }

    async fn welcome(
        &self,
        guild_id: serenity::GuildId,
        user_id: serenity::UserId,
    ) -> anyhow::Result<()> {
        let (Some(role_id), Some(channel_id)) = (self.role_id, self.welcome_channel_id) else {
            debug!(%user_id, "welcome role or channel not configured; skipping");
            return Ok(());
        };

        let transport = self.sink.transport();
        let role = transport.resolve_role(guild_id, role_id).await?;
        let channel = transport.resolve_channel(channel_id).await?;

        let (Some(role_id), Some(channel_id)) = (role, channel) else {
            warn!(%guild_id, %role_id, %channel_id, "welcome role or channel not found; skipping");
            return Ok(());
        };

        let Some(claim) = self.gate.try_claim() else {
            debug!(%user_id, "welcome cooldown active; join dropped");
            return Ok(());
        };

        // Only a delivered welcome uses up the window.
        match self.sink.post(channel_id, &welcome_message(role_id)).await {
            Ok(()) => {
                claim.hold();
                info!(%guild_id, %user_id, "welcome message sent");
                Ok(())
            }
            Err(error) => {
                claim.release();
                Err(error)
            }
        }
    }

    pub fn on_ready(&self, user_tag: &str) {
        info!(user = user_tag, "connected to Discord");
    }

    pub fn on_disconnect(&self) {
        warn!("disconnected from Discord; waiting for reconnect");
    }

    pub fn on_resume(&self) {
        info!("Discord session resumed");
    }

    /// Catch-all for failures surfaced by other callbacks.
    pub async fn on_internal_error(&self, event_name: &str, error: &anyhow::Error) {
        error!(event = event_name, error = %format!("{error:#}"), "error while handling event");
        self.escalator.escalate(event_name, error).await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use anyhow::anyhow;
    use poise::serenity_prelude as serenity;

    use crate::config::Config;
    use crate::escalation::Escalator;
    use crate::notify::NotificationSink;
    use crate::testing::FakeTransport;

    use super::{EventDispatcher, RULES_URL};

    const ROLE: u64 = 100;
    const CHANNEL: u64 = 200;
    const GUILD: u64 = 300;

    fn config(role: Option<u64>, channel: Option<u64>) -> Config {
        let role = role.map(|id| id.to_string());
        let channel = channel.map(|id| id.to_string());
        Config::from_lookup(|key| match key {
            "DISCORD_TOKEN" => Some("token".to_owned()),
            "DISCORD_ROLE_ID" => role.clone(),
            "DISCORD_WELCOME_CHANNEL_ID" => channel.clone(),
            "ERROR_REPORT_USER_IDS" => Some("1,2".to_owned()),
            _ => None,
        })
        .unwrap()
    }

    fn dispatcher(transport: &Arc<FakeTransport>, config: &Config) -> EventDispatcher {
        let sink = NotificationSink::new(transport.clone());
        let escalator = Escalator::new(sink.clone(), config.operator_ids.clone());
        EventDispatcher::new(config, sink, escalator)
    }

    async fn join(dispatcher: &EventDispatcher, user: u64) {
        dispatcher
            .on_member_join(serenity::GuildId::new(GUILD), serenity::UserId::new(user))
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn join_posts_the_welcome_message() {
        let transport = Arc::new(FakeTransport::welcoming(ROLE, CHANNEL));
        let dispatcher = dispatcher(&transport, &config(Some(ROLE), Some(CHANNEL)));

        join(&dispatcher, 10).await;

        let posts = transport.channel_posts();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].0.get(), CHANNEL);
        assert!(posts[0].1.contains(&format!("<@&{ROLE}>")));
        assert!(posts[0].1.contains(RULES_URL));
        assert!(transport.direct_messages().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn burst_of_joins_sends_one_welcome_per_window() {
        let transport = Arc::new(FakeTransport::welcoming(ROLE, CHANNEL));
        let dispatcher = dispatcher(&transport, &config(Some(ROLE), Some(CHANNEL)));

        for user in 10..20 {
            join(&dispatcher, user).await;
            tokio::time::sleep(Duration::from_secs(5)).await;
        }
        assert_eq!(transport.channel_posts().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn window_reopens_after_sixty_seconds() {
        let transport = Arc::new(FakeTransport::welcoming(ROLE, CHANNEL));
        let dispatcher = dispatcher(&transport, &config(Some(ROLE), Some(CHANNEL)));

        join(&dispatcher, 10).await;
        tokio::time::sleep(Duration::from_secs(59)).await;
        join(&dispatcher, 11).await;
        assert_eq!(transport.channel_posts().len(), 1);

        tokio::time::sleep(Duration::from_secs(2)).await;
        join(&dispatcher, 12).await;
        assert_eq!(transport.channel_posts().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn unresolved_role_sends_nothing() {
        let transport = Arc::new(FakeTransport {
            channel: Some(serenity::ChannelId::new(CHANNEL)),
            ..Default::default()
        });
        let dispatcher = dispatcher(&transport, &config(Some(ROLE), Some(CHANNEL)));

        join(&dispatcher, 10).await;

        assert!(transport.channel_posts().is_empty());
        assert!(transport.direct_messages().is_empty());
        assert!(dispatcher.gate().is_open());
    }

    #[tokio::test(start_paused = true)]
    async fn unresolved_channel_sends_nothing() {
        let transport = Arc::new(FakeTransport {
            role: Some(serenity::RoleId::new(ROLE)),
            channel: None,
            ..Default::default()
        });
        let dispatcher = dispatcher(&transport, &config(Some(ROLE), Some(CHANNEL)));

        join(&dispatcher, 10).await;

        assert!(transport.channel_posts().is_empty());
        assert!(transport.direct_messages().is_empty());
        assert!(dispatcher.gate().is_open());
    }

    #[tokio::test(start_paused = true)]
    async fn unconfigured_welcome_is_a_no_op() {
        let transport = Arc::new(FakeTransport::welcoming(ROLE, CHANNEL));
        let dispatcher = dispatcher(&transport, &config(None, Some(CHANNEL)));

        join(&dispatcher, 10).await;

        assert!(transport.channel_posts().is_empty());
        assert!(transport.direct_messages().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn lookup_failure_escalates_once_per_operator() {
        let transport = Arc::new(FakeTransport {
            fail_lookups: true,
            ..FakeTransport::welcoming(ROLE, CHANNEL)
        });
        let dispatcher = dispatcher(&transport, &config(Some(ROLE), Some(CHANNEL)));

        join(&dispatcher, 10).await;

        let messages = transport.direct_messages();
        let recipients: Vec<u64> = messages.iter().map(|(user, _)| user.get()).collect();
        assert_eq!(recipients, vec![1, 2]);
        assert!(messages[0].1.contains("on_member_join"));
        assert!(transport.channel_posts().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_send_escalates_and_leaves_the_window_open() {
        let transport = Arc::new(FakeTransport {
            fail_channel_sends: AtomicBool::new(true),
            ..FakeTransport::welcoming(ROLE, CHANNEL)
        });
        let dispatcher = dispatcher(&transport, &config(Some(ROLE), Some(CHANNEL)));

        join(&dispatcher, 10).await;
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert!(transport.channel_posts().is_empty());
        assert_eq!(transport.direct_messages().len(), 2);
        assert!(dispatcher.gate().is_open());

        transport.fail_channel_sends.store(false, Ordering::SeqCst);
        join(&dispatcher, 11).await;

        assert_eq!(transport.channel_posts().len(), 1);
        assert!(!dispatcher.gate().is_open());
    }

    #[tokio::test]
    async fn internal_errors_are_escalated_with_the_event_name() {
        let transport = Arc::new(FakeTransport::default());
        let dispatcher = dispatcher(&transport, &config(None, None));

        dispatcher
            .on_internal_error("guild_create", &anyhow!("cache miss"))
            .await;

        let messages = transport.direct_messages();
        assert_eq!(messages.len(), 2);
        assert!(messages.iter().all(|(_, text)| text.contains("`guild_create`")));
    }
}
