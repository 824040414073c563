//! Poll loop
//!
//! Each cycle runs fetch, diff, dispatch and delivery in sequence, then
//! replaces the retained snapshot. A failed fetch leaves the snapshot alone
//! so a transient outage never reads as "everything logged off".
//!
//! Cycles never overlap: the loop awaits each one before waiting for the
//! next tick, and a tick that falls due mid-cycle is delayed rather than
//! bunched up.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::callsign::ActiveSet;
use super::diff::{Delta, diff};
use super::dispatch::{MessageFormat, dispatch};
use super::registry::{self, SharedRegistry};
use crate::feed::SnapshotSource;
use crate::notify::{DeliveryReport, Notifier, deliver_all};

/// The snapshot retained between cycles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollState {
    previous: ActiveSet,
}

impl PollState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_previous(previous: ActiveSet) -> Self {
        Self { previous }
    }

    pub fn previous(&self) -> &ActiveSet {
        &self.previous
    }

    pub fn replace(&mut self, current: ActiveSet) {
        self.previous = current;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The feed could not be read; nothing was sent and the snapshot is unchanged.
    FetchFailed,
    Completed {
        delta: Delta,
        report: DeliveryReport,
    },
}

pub struct PollLoop {
    source: Arc<dyn SnapshotSource>,
    notifier: Arc<dyn Notifier>,
    registry: SharedRegistry,
    format: MessageFormat,
    state: PollState,
}

impl PollLoop {
    pub fn new(
        source: Arc<dyn SnapshotSource>,
        notifier: Arc<dyn Notifier>,
        registry: SharedRegistry,
        format: MessageFormat,
    ) -> Self {
        Self {
            source,
            notifier,
            registry,
            format,
            state: PollState::new(),
        }
    }

    pub fn with_state(mut self, state: PollState) -> Self {
        self.state = state;
        self
    }

    pub fn state(&self) -> &PollState {
        &self.state
    }

    /// Run one fetch/diff/dispatch cycle.
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        let current = match self.source.fetch().await {
            Ok(active) => active,
            Err(e) => {
                error!("{} fetch failed, keeping previous snapshot: {e}", self.source.name());
                return CycleOutcome::FetchFailed;
            }
        };

        let delta = diff(self.state.previous(), &current);

        let messages = if delta.is_empty() {
            Vec::new()
        } else {
            // Released before delivery starts.
            let registry = registry::lock(&self.registry);
            dispatch(&delta, &registry, &self.format)
        };

        let report = deliver_all(self.notifier.as_ref(), &messages).await;

        if delta.is_empty() {
            debug!("no change ({} watched position(s) online)", current.len());
        } else {
            info!(
                "{} logged on, {} logged off; {} message(s) delivered, {} failed",
                delta.logged_on.len(),
                delta.logged_off.len(),
                report.delivered,
                report.failed
            );
        }

        self.state.replace(current);
        CycleOutcome::Completed { delta, report }
    }

    /// Poll every `period` until `cancel` fires. Returns the final state.
    ///
    /// The first cycle runs immediately.
    pub async fn run(mut self, period: Duration, cancel: CancellationToken) -> PollState {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            "polling {} every {}s",
            self.source.name(),
            period.as_secs_f64()
        );

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("poll loop stopped");
                    break;
                }
                _ = ticker.tick() => {}
            }

            self.run_cycle().await;
        }

        self.state
    }

    /// Run the loop as a background task.
    pub fn spawn(self, period: Duration) -> PollHandle {
        let cancel = CancellationToken::new();
        let task = tokio::spawn(self.run(period, cancel.clone()));
        PollHandle { cancel, task }
    }
}

/// Handle to a spawned poll loop.
pub struct PollHandle {
    cancel: CancellationToken,
    task: JoinHandle<PollState>,
}

impl PollHandle {
    /// Stop the loop after the in-flight cycle, if any, and wait for it.
    pub async fn shutdown(self) -> Option<PollState> {
        self.cancel.cancel();
        match self.task.await {
            Ok(state) => Some(state),
            Err(e) => {
                error!("poll loop task failed: {e}");
                None
            }
        }
    }
}
