use std::sync::Arc;
use std::time::Duration;

use poise::serenity_prelude as serenity;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use hearth_utils::formatting::format_interval;

use crate::notify::{FanOut, NotificationSink};

/// Periodic "still alive, nothing broke" DM to every operator.
///
/// Send failures are logged per operator and never escalated.
#[derive(Clone)]
pub struct LivenessReporter {
    sink: NotificationSink,
    operators: Arc<[serenity::UserId]>,
    interval: Duration,
}

impl LivenessReporter {
    pub fn new(
        sink: NotificationSink,
        operators: impl Into<Arc<[serenity::UserId]>>,
        interval: Duration,
    ) -> Self {
        Self {
            sink,
            operators: operators.into(),
            interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn message(&self) -> String {
        format!(
            "No errors occurred in the last {}.",
            format_interval(self.interval)
        )
    }

    pub async fn report_once(&self) -> FanOut {
        let outcome = self
            .sink
            .direct_message_all(&self.operators, &self.message(), "liveness")
            .await;
        if outcome.failed > 0 {
            warn!(
                delivered = outcome.delivered,
                failed = outcome.failed,
                "liveness report partially failed"
            );
        } else {
            debug!(delivered = outcome.delivered, "liveness report sent");
        }
        outcome
    }

    /// Report, then sleep one interval, until `token` is cancelled.
    ///
    /// Cancellation is observed at the sleep; no ticks queue up behind a
    /// slow round because the sleep only starts after the round finishes.
    pub async fn run(self, token: CancellationToken) {
        info!(
            interval_secs = self.interval.as_secs(),
            operators = self.operators.len(),
            "liveness reporter started"
        );

        while !token.is_cancelled() {
            self.report_once().await;

            tokio::select! {
                _ = token.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        info!("liveness reporter stopped");
    }

    pub fn spawn(self, token: CancellationToken) -> LivenessHandle {
        let join = tokio::spawn(self.run(token.clone()));
        LivenessHandle { token, join }
    }
}

/// Owned handle to the running reporter task.
#[derive(Debug)]
pub struct LivenessHandle {
    token: CancellationToken,
    join: JoinHandle<()>,
}

impl LivenessHandle {
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Cancel the reporter and wait up to `grace` for it to exit; abort it otherwise.
    pub async fn stop(mut self, grace: Duration) {
        self.token.cancel();
        if tokio::time::timeout(grace, &mut self.join).await.is_err() {
            warn!(
                grace_secs = grace.as_secs(),
                "liveness reporter did not stop in time; aborting"
            );
            self.join.abort();
        }
    }
}
