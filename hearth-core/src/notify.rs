use std::sync::Arc;

use poise::serenity_prelude as serenity;
use tracing::warn;

use hearth_utils::formatting::{MESSAGE_CHAR_LIMIT, truncate_message};

use crate::transport::Transport;

/// Outcome of sending one message to a list of recipients.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FanOut {
    pub delivered: usize,
    pub failed: usize,
}

/// Stateless "DM an operator" / "post to a channel" primitives shared by the core.
#[derive(Clone)]
pub struct NotificationSink {
    transport: Arc<dyn Transport>,
}

impl NotificationSink {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    pub async fn direct_message(
        &self,
        user_id: serenity::UserId,
        content: &str,
    ) -> anyhow::Result<()> {
        let content = truncate_message(content, MESSAGE_CHAR_LIMIT);
        self.transport.send_direct(user_id, &content).await
    }

    pub async fn post(&self, channel_id: serenity::ChannelId, content: &str) -> anyhow::Result<()> {
        let content = truncate_message(content, MESSAGE_CHAR_LIMIT);
        self.transport.send_channel(channel_id, &content).await
    }

    /// DM every recipient in order. A failed send is logged and skipped so
    /// the remaining recipients are still attempted.
    pub async fn direct_message_all(
        &self,
        recipients: &[serenity::UserId],
        content: &str,
        purpose: &'static str,
    ) -> FanOut {
        let mut outcome = FanOut::default();
        for user_id in recipients {
            match self.direct_message(*user_id, content).await {
                Ok(()) => outcome.delivered += 1,
                Err(source) => {
                    outcome.failed += 1;
                    warn!(?source, operator_id = %user_id, purpose, "failed to DM operator");
                }
            }
        }
        outcome
    }
}
