use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use anyhow::bail;
use async_trait::async_trait;
use poise::serenity_prelude as serenity;

use crate::transport::Transport;

/// In-memory transport that records every successful send.
#[derive(Default)]
pub(crate) struct FakeTransport {
    pub role: Option<serenity::RoleId>,
    pub channel: Option<serenity::ChannelId>,
    pub fail_lookups: bool,
    pub fail_channel_sends: AtomicBool,
    pub unreachable_users: HashSet<serenity::UserId>,
    pub direct_attempts: AtomicUsize,
    pub posts: Mutex<Vec<(serenity::ChannelId, String)>>,
    pub dms: Mutex<Vec<(serenity::UserId, String)>>,
}

impl FakeTransport {
    pub fn welcoming(role: u64, channel: u64) -> Self {
        Self {
            role: Some(serenity::RoleId::new(role)),
            channel: Some(serenity::ChannelId::new(channel)),
            ..Default::default()
        }
    }

    pub fn channel_posts(&self) -> Vec<(serenity::ChannelId, String)> {
        self.posts.lock().unwrap().clone()
    }

    pub fn direct_messages(&self) -> Vec<(serenity::UserId, String)> {
        self.dms.lock().unwrap().clone()
    }

    pub fn direct_attempts(&self) -> usize {
        self.direct_attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn resolve_role(
        &self,
        _guild_id: serenity::GuildId,
        role_id: serenity::RoleId,
    ) -> anyhow::Result<Option<serenity::RoleId>> {
        if self.fail_lookups {
            bail!("role lookup exploded");
        }
        Ok(self.role.filter(|known| *known == role_id))
    }

    async fn resolve_channel(
        &self,
        channel_id: serenity::ChannelId,
    ) -> anyhow::Result<Option<serenity::ChannelId>> {
        if self.fail_lookups {
            bail!("channel lookup exploded");
        }
        Ok(self.channel.filter(|known| *known == channel_id))
    }

    async fn send_channel(
        &self,
        channel_id: serenity::ChannelId,
        content: &str,
    ) -> anyhow::Result<()> {
        if self.fail_channel_sends.load(Ordering::SeqCst) {
            bail!("missing access to channel {channel_id}");
        }
        self.posts
            .lock()
            .unwrap()
            .push((channel_id, content.to_owned()));
        Ok(())
    }

    async fn send_direct(&self, user_id: serenity::UserId, content: &str) -> anyhow::Result<()> {
        self.direct_attempts.fetch_add(1, Ordering::SeqCst);
        if self.unreachable_users.contains(&user_id) {
            bail!("cannot send messages to user {user_id}");
        }
        self.dms
            .lock()
            .unwrap()
            .push((user_id, content.to_owned()));
        Ok(())
    }
}

pub(crate) fn users(ids: &[u64]) -> Vec<serenity::UserId> {
    ids.iter().copied().map(serenity::UserId::new).collect()
}
