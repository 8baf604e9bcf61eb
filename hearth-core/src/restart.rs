use std::future::Future;
use std::sync::Arc;

use poise::serenity_prelude as serenity;
use tracing::{info, warn};

use crate::lifecycle::Lifecycle;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RestartDecision {
    Denied,
    Accepted,
}

/// Reply the invoker receives for a `restart` attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RestartReply {
    PermissionDenied,
    Restarting,
}

impl RestartReply {
    pub fn text(self) -> &'static str {
        match self {
            Self::PermissionDenied => "You do not have permission to run this command.",
            Self::Restarting => "Restarting the bot...",
        }
    }

    /// Rejections are only shown to the invoker.
    pub fn is_ephemeral(self) -> bool {
        matches!(self, Self::PermissionDenied)
    }
}

/// Owner-gated restart: acknowledge, then hand off to the process lifecycle.
///
/// The process is expected to run under a supervisor that relaunches it
/// after the clean exit.
#[derive(Clone, Debug)]
pub struct RestartHandler {
    owners: Arc<[serenity::UserId]>,
    lifecycle: Lifecycle,
}

impl RestartHandler {
    pub fn new(owners: impl Into<Arc<[serenity::UserId]>>, lifecycle: Lifecycle) -> Self {
        Self {
            owners: owners.into(),
            lifecycle,
        }
    }

    pub fn authorize(&self, caller: serenity::UserId) -> RestartDecision {
        if self.owners.contains(&caller) {
            RestartDecision::Accepted
        } else {
            RestartDecision::Denied
        }
    }

    /// Authorize `caller`, send the matching reply through `reply`, and
    /// request shutdown when accepted.
    ///
    /// An accepted restart proceeds even if the acknowledgement fails to send.
    pub async fn handle<F, Fut>(
        &self,
        caller: serenity::UserId,
        reply: F,
    ) -> anyhow::Result<RestartDecision>
    where
        F: FnOnce(RestartReply) -> Fut,
        Fut: Future<Output = anyhow::Result<()>>,
    {
        let decision = self.authorize(caller);
        match decision {
            RestartDecision::Denied => {
                warn!(caller_id = %caller, "unauthorized restart attempt");
                reply(RestartReply::PermissionDenied).await?;
            }
            RestartDecision::Accepted => {
                let replied = reply(RestartReply::Restarting).await;
                info!(caller_id = %caller, "restart triggered");
                self.lifecycle.request_shutdown();
                replied?;
            }
        }

        Ok(decision)
    }
}
