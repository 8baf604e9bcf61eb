use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::liveness::{LivenessHandle, LivenessReporter};

/// Grace period the liveness task gets to exit on shutdown.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Process-wide shutdown signal plus the background tasks tied to it.
#[derive(Clone, Debug, Default)]
pub struct Lifecycle {
    shutdown: CancellationToken,
    liveness: Arc<Mutex<Option<LivenessHandle>>>,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_shutdown(&self) {
        if !self.shutdown.is_cancelled() {
            info!("shutdown requested");
        }
        self.shutdown.cancel();
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Resolves once [`Lifecycle::request_shutdown`] has been called.
    pub async fn shutdown_requested(&self) {
        self.shutdown.cancelled().await;
    }

    /// Wait for a shutdown request or for `signal`, then run `close` once.
    ///
    /// A signal also requests shutdown. If `signal` fails to register, only
    /// an explicit request ends the wait.
    pub async fn watch_shutdown<S, C, Fut>(&self, signal: S, close: C)
    where
        S: Future<Output = std::io::Result<()>>,
        C: FnOnce() -> Fut,
        Fut: Future<Output = ()>,
    {
        tokio::select! {
            _ = self.shutdown_requested() => {}
            result = signal => {
                match result {
                    Ok(()) => info!("termination signal received"),
                    Err(err) => {
                        error!(?err, "failed to listen for termination signals");
                        self.shutdown_requested().await;
                    }
                }
                self.request_shutdown();
            }
        }

        info!("closing gateway connection");
        close().await;
    }

    /// Start the reporter unless one is already running. Returns whether it was started.
    pub async fn start_liveness(&self, reporter: LivenessReporter) -> bool {
        let mut slot = self.liveness.lock().await;
        if slot.is_some() || self.is_shutting_down() {
            debug!("liveness reporter already running or shutting down; not starting");
            return false;
        }

        *slot = Some(reporter.spawn(self.shutdown.child_token()));
        true
    }

    /// Cancel the reporter and wait for it within `grace`.
    pub async fn stop_liveness(&self, grace: Duration) {
        let handle = self.liveness.lock().await.take();
        if let Some(handle) = handle {
            handle.stop(grace).await;
        }
    }
}
