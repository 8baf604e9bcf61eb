use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::debug;

use crate::config::DEFAULT_WELCOME_COOLDOWN;

/// Debounce for welcome bursts: at most one window per `hold` period.
///
/// Joins that arrive while the gate is closed are dropped, and they do not
/// extend the hold. Once a window is held, the scheduled reopen is never
/// cancelled.
#[derive(Clone, Debug)]
pub struct CooldownGate {
    open: Arc<AtomicBool>,
    hold: Duration,
}

impl CooldownGate {
    pub fn new(hold: Duration) -> Self {
        Self {
            open: Arc::new(AtomicBool::new(true)),
            hold,
        }
    }

    /// Atomically close the gate if it is open.
    ///
    /// The caller settles the claim: [`CooldownClaim::hold`] after a
    /// successful dispatch, [`CooldownClaim::release`] otherwise. A claim
    /// dropped unsettled releases the gate.
    pub fn try_claim(&self) -> Option<CooldownClaim> {
        self.open
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| CooldownClaim {
                gate: self.clone(),
                settled: false,
            })
    }

    /// Claim and immediately hold a window. Returns whether the caller won it.
    ///
    /// Must be called from within a tokio runtime.
    pub fn try_open_window(&self) -> bool {
        match self.try_claim() {
            Some(claim) => {
                claim.hold();
                true
            }
            None => false,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    fn reopen(&self) {
        self.open.store(true, Ordering::Release);
    }
}

impl Default for CooldownGate {
    fn default() -> Self {
        Self::new(DEFAULT_WELCOME_COOLDOWN)
    }
}

/// A closed gate waiting for the outcome of its dispatch.
#[derive(Debug)]
pub struct CooldownClaim {
    gate: CooldownGate,
    settled: bool,
}

impl CooldownClaim {
    /// Keep the gate closed for the hold period, then reopen it.
    ///
    /// Must be called from within a tokio runtime.
    pub fn hold(mut self) {
        self.settled = true;
        let gate = self.gate.clone();
        tokio::spawn(async move {
            tokio::time::sleep(gate.hold).await;
            gate.reopen();
            debug!("welcome cooldown elapsed");
        });
    }

    /// Reopen the gate right away; no window was used.
    pub fn release(mut self) {
        self.settled = true;
        self.gate.reopen();
    }
}

impl Drop for CooldownClaim {
    fn drop(&mut self) {
        if !self.settled {
            self.gate.reopen();
        }
    }
}
