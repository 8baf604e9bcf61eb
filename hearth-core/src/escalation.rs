use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt as _;
use poise::serenity_prelude as serenity;
use tracing::{error, warn};

use hearth_utils::formatting::neutralize_mentions;

use crate::notify::{FanOut, NotificationSink};

/// A failure on its way to the operators. Built, fanned out, discarded.
#[derive(Debug)]
pub struct EscalationRecord<'a> {
    pub context: &'a str,
    pub error: &'a anyhow::Error,
}

impl EscalationRecord<'_> {
    pub fn message(&self) -> String {
        format!(
            "Error report:\nAn error occurred during `{}`:\n{}",
            self.context,
            neutralize_mentions(&format!("{:#}", self.error)),
        )
    }
}

/// Funnels failures from anywhere in the core to every operator by DM.
///
/// Never returns an error: delivery problems are only logged, so a broken
/// notification path cannot recurse into another escalation.
#[derive(Clone)]
pub struct Escalator {
    sink: NotificationSink,
    operators: Arc<[serenity::UserId]>,
}

impl Escalator {
    pub fn new(sink: NotificationSink, operators: impl Into<Arc<[serenity::UserId]>>) -> Self {
        Self {
            sink,
            operators: operators.into(),
        }
    }

    pub async fn escalate(&self, context: &str, error: &anyhow::Error) -> FanOut {
        let record = EscalationRecord { context, error };
        if self.operators.is_empty() {
            warn!(context, "no operators configured; escalation dropped");
            return FanOut::default();
        }

        self.sink
            .direct_message_all(&self.operators, &record.message(), "escalation")
            .await
    }

    /// Run `task` and escalate whatever it fails with, including panics.
    pub async fn guard<F>(&self, context: &str, task: F)
    where
        F: Future<Output = anyhow::Result<()>>,
    {
        let error = match AssertUnwindSafe(task).catch_unwind().await {
            Ok(Ok(())) => return,
            Ok(Err(error)) => error,
            Err(payload) => anyhow::anyhow!("handler panicked: {}", panic_message(&*payload)),
        };

        error!(context, error = %format!("{error:#}"), "handler failed; escalating");
        self.escalate(context, &error).await;
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}
