//! Reconciliation scheduler
//!
//! Background task that re-attempts pending reactions on a fixed period.

use std::sync::Arc;
use std::time::Duration;

use chat_common::ReactionConfig;
use serde::Serialize;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, trace};

/// Counts from one pass over the pending reactions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub attempted: usize,
    pub resolved: usize,
}

impl SweepReport {
    /// Still waiting on a target after this pass
    pub fn still_pending(&self) -> usize {
        self.attempted - self.resolved
    }

    pub(crate) fn record(&mut self, resolved: bool) {
        self.attempted += 1;
        if resolved {
            self.resolved += 1;
        }
    }
}

impl std::ops::AddAssign for SweepReport {
    fn add_assign(&mut self, rhs: Self) {
        self.attempted += rhs.attempted;
        self.resolved += rhs.resolved;
    }
}

/// Anything that can retry its pending reactions
pub trait Sweep: Send {
    fn sweep(&mut self) -> SweepReport;
}

/// Fixed-period sweep driver
#[derive(Debug, Clone, Copy)]
pub struct ReconciliationScheduler {
    period: Duration,
}

impl Default for ReconciliationScheduler {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PERIOD)
    }
}

impl ReconciliationScheduler {
    pub const DEFAULT_PERIOD: Duration = Duration::from_secs(2);

    /// A zero period is raised to one millisecond
    pub fn new(period: Duration) -> Self {
        Self {
            period: period.max(Duration::from_millis(1)),
        }
    }

    pub fn from_config(config: &ReactionConfig) -> Self {
        Self::new(config.sweep_interval())
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Run the sweep every period until `shutdown` flips to `true` or its
    /// sender is dropped
    pub fn spawn<S>(self, target: Arc<Mutex<S>>, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()>
    where
        S: Sweep + 'static,
    {
        tokio::spawn(async move {
            let mut ticker = interval(self.period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately
            ticker.tick().await;

            info!(period_ms = self.period.as_millis(), "Reaction sweep started");

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let report = target.lock().await.sweep();
                        trace!(
                            attempted = report.attempted,
                            resolved = report.resolved,
                            "Reaction sweep tick"
                        );
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }

            info!("Reaction sweep stopped");
        })
    }
}
