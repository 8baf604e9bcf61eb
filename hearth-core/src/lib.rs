pub mod config;
pub mod cooldown;
pub mod dispatcher;
pub mod escalation;
pub mod lifecycle;
pub mod liveness;
pub mod notify;
pub mod restart;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

use std::fmt;
use std::sync::Arc;

pub use config::Config;
pub use dispatcher::EventDispatcher;
pub use escalation::Escalator;
pub use lifecycle::Lifecycle;
pub use liveness::LivenessReporter;
pub use notify::NotificationSink;
pub use restart::RestartHandler;
pub use transport::{SerenityTransport, Transport};

pub type Error = anyhow::Error;

/// State shared with every command and event handler.
#[derive(Clone)]
pub struct Data {
    pub config: Arc<Config>,
    pub dispatcher: EventDispatcher,
    pub liveness: LivenessReporter,
    pub restart: RestartHandler,
    pub lifecycle: Lifecycle,
}

impl fmt::Debug for Data {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Data")
            .field("config", &self.config)
            .field("restart", &self.restart)
            .field("lifecycle", &self.lifecycle)
            .finish_non_exhaustive()
    }
}

impl Data {
    /// Wire the core components over one shared transport.
    pub fn new(config: Arc<Config>, transport: Arc<dyn Transport>, lifecycle: Lifecycle) -> Self {
        let sink = NotificationSink::new(transport);
        let escalator = Escalator::new(sink.clone(), config.operator_ids.clone());
        let dispatcher = EventDispatcher::new(&config, sink.clone(), escalator);
        let liveness =
            LivenessReporter::new(sink, config.operator_ids.clone(), config.liveness_interval);
        let restart = RestartHandler::new(config.owner_ids.clone(), lifecycle.clone());

        Self {
            config,
            dispatcher,
            liveness,
            restart,
            lifecycle,
        }
    }
}

pub type Context<'a> = poise::Context<'a, Data, Error>;
