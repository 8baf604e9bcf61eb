use std::sync::Arc;

use anyhow::Context as _;
use async_trait::async_trait;
use poise::serenity_prelude as serenity;

/// Operations the coordination core needs from the chat connection.
///
/// Lookups return `Ok(None)` when the target does not exist; `Err` is kept
/// for transport failures.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn resolve_role(
        &self,
        guild_id: serenity::GuildId,
        role_id: serenity::RoleId,
    ) -> anyhow::Result<Option<serenity::RoleId>>;

    async fn resolve_channel(
        &self,
        channel_id: serenity::ChannelId,
    ) -> anyhow::Result<Option<serenity::ChannelId>>;

    async fn send_channel(&self, channel_id: serenity::ChannelId, content: &str)
    -> anyhow::Result<()>;

    /// Fetch the user, open a DM channel and post `content` there.
    async fn send_direct(&self, user_id: serenity::UserId, content: &str) -> anyhow::Result<()>;
}

/// [`Transport`] backed by a live serenity client.
#[derive(Clone, Debug)]
pub struct SerenityTransport {
    http: Arc<serenity::Http>,
    cache: Arc<serenity::Cache>,
}

impl SerenityTransport {
    pub fn new(http: Arc<serenity::Http>, cache: Arc<serenity::Cache>) -> Self {
        Self { http, cache }
    }

    pub fn from_context(ctx: &serenity::Context) -> Self {
        Self::new(ctx.http.clone(), ctx.cache.clone())
    }
}

#[async_trait]
impl Transport for SerenityTransport {
    async fn resolve_role(
        &self,
        guild_id: serenity::GuildId,
        role_id: serenity::RoleId,
    ) -> anyhow::Result<Option<serenity::RoleId>> {
        let cached = self
            .cache
            .guild(guild_id)
            .map(|guild| guild.roles.contains_key(&role_id));
        if let Some(found) = cached {
            return Ok(found.then_some(role_id));
        }

        match guild_id.roles(self.http.as_ref()).await {
            Ok(roles) => Ok(roles.contains_key(&role_id).then_some(role_id)),
            Err(source) if is_not_found(&source) => Ok(None),
            Err(source) => Err(source).context("failed to fetch guild roles"),
        }
    }

    async fn resolve_channel(
        &self,
        channel_id: serenity::ChannelId,
    ) -> anyhow::Result<Option<serenity::ChannelId>> {
        match channel_id
            .to_channel((&self.cache, self.http.as_ref()))
            .await
        {
            Ok(channel) => Ok(Some(channel.id())),
            Err(source) if is_not_found(&source) => Ok(None),
            Err(source) => Err(source).context("failed to resolve channel"),
        }
    }

    async fn send_channel(
        &self,
        channel_id: serenity::ChannelId,
        content: &str,
    ) -> anyhow::Result<()> {
        channel_id
            .send_message(
                self.http.as_ref(),
                serenity::CreateMessage::new().content(content),
            )
            .await
            .with_context(|| format!("failed to post to channel {channel_id}"))?;
        Ok(())
    }

    async fn send_direct(&self, user_id: serenity::UserId, content: &str) -> anyhow::Result<()> {
        let user = self
            .http
            .get_user(user_id)
            .await
            .with_context(|| format!("failed to fetch user {user_id}"))?;
        let dm_channel = user
            .create_dm_channel(self.http.as_ref())
            .await
            .with_context(|| format!("failed to open DM with user {user_id}"))?;
        dm_channel
            .send_message(
                self.http.as_ref(),
                serenity::CreateMessage::new().content(content),
            )
            .await
            .with_context(|| format!("failed to DM user {user_id}"))?;
        Ok(())
    }
}

fn is_not_found(source: &serenity::Error) -> bool {
    matches!(
        source,
        serenity::Error::Http(serenity::HttpError::UnsuccessfulRequest(response))
            if response.status_code.as_u16() == 404
    )
}
