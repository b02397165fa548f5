use std::sync::{Arc, Mutex};
use std::time::Duration;

use jdkwatch_telemetry as telemetry;
use tokio::sync::watch;
use tokio::task::AbortHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::collab::InstanceContributor;
use crate::error::CheckError;
use crate::evaluate::UpdateEvaluator;
use crate::gate::UpdateCheckGate;
use crate::types::ScopeContext;

pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(12 * 60 * 60);
pub const INTERVAL_ENV: &str = "JDKWATCH_INTERVAL_SECS";

pub fn cancel_requested(cancel: &watch::Receiver<bool>) -> bool {
    *cancel.borrow()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CheckState {
    Idle,
    Queued,
    Running,
}

/// Periodic timer plus event-triggered re-checks for one consumer. Cycles
/// never overlap; requests arriving mid-cycle collapse into one queued
/// follow-up.
#[derive(Clone)]
pub struct CheckScheduler {
    inner: Arc<Inner>,
}

struct Inner {
    scope: ScopeContext,
    gate: Arc<dyn UpdateCheckGate>,
    contributors: Vec<Arc<dyn InstanceContributor>>,
    evaluator: UpdateEvaluator,
    state: Mutex<CheckState>,
    cancel_tx: watch::Sender<bool>,
    cancel_rx: watch::Receiver<bool>,
    timer: Mutex<Option<AbortHandle>>,
}

impl CheckScheduler {
    pub fn new(
        scope: ScopeContext,
        gate: Arc<dyn UpdateCheckGate>,
        contributors: Vec<Arc<dyn InstanceContributor>>,
        evaluator: UpdateEvaluator,
    ) -> Self {
        let (cancel_tx, cancel_rx) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                scope,
                gate,
                contributors,
                evaluator,
                state: Mutex::new(CheckState::Idle),
                cancel_tx,
                cancel_rx,
                timer: Mutex::new(None),
            }),
        }
    }

    pub fn request_check(&self) {
        Inner::request(&self.inner);
    }

    /// Structural-change trigger (module/dependency roots changed).
    pub fn roots_changed(&self) {
        debug!(scope = %self.inner.scope.name(), "roots changed; requesting update check");
        Inner::request(&self.inner);
    }

    /// Spawns the fixed-interval timer. `JDKWATCH_INTERVAL_SECS` overrides
    /// the 12h default.
    pub fn start(&self) {
        let period = jdkwatch_util::env_duration_secs(INTERVAL_ENV, DEFAULT_CHECK_INTERVAL);
        self.start_with_interval(period);
    }

    pub fn start_with_interval(&self, period: Duration) {
        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // interval() fires immediately; the first real tick is one
            // period out.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if cancel_requested(&inner.cancel_rx) {
                    return;
                }
                Inner::request(&inner);
            }
        });
        let mut timer = self.inner.timer.lock().unwrap();
        if let Some(previous) = timer.replace(handle.abort_handle()) {
            previous.abort();
        }
    }

    /// Cancels the timer and flags in-flight work to abort cooperatively.
    pub fn dispose(&self) {
        let _ = self.inner.cancel_tx.send(true);
        if let Some(handle) = self.inner.timer.lock().unwrap().take() {
            handle.abort();
        }
    }

    #[cfg(test)]
    fn current_state(&self) -> CheckState {
        *self.inner.state.lock().unwrap()
    }
}

impl Inner {
    fn request(inner: &Arc<Inner>) {
        {
            let mut state = inner.state.lock().unwrap();
            match *state {
                CheckState::Running => {
                    // Burst collapse: one follow-up at most, never a queue.
                    *state = CheckState::Queued;
                    return;
                }
                CheckState::Queued => return,
                CheckState::Idle => *state = CheckState::Running,
            }
        }
        let inner = Arc::clone(inner);
        tokio::spawn(async move {
            loop {
                // The cycle runs in its own task so a panic in external
                // code (a sink render, a contributor) unwinds that task
                // alone and the state machine below still resets.
                let cycle = Arc::clone(&inner);
                if let Err(err) = tokio::spawn(async move { cycle.run_one_cycle().await }).await {
                    warn!("update check cycle aborted: {err}");
                }
                let drained = {
                    let mut state = inner.state.lock().unwrap();
                    match *state {
                        // Drain the single queued follow-up with freshly
                        // derived context.
                        CheckState::Queued => {
                            *state = CheckState::Running;
                            false
                        }
                        _ => {
                            *state = CheckState::Idle;
                            true
                        }
                    }
                };
                if drained {
                    return;
                }
            }
        });
    }

    async fn run_one_cycle(&self) {
        // Re-evaluated on every entry, never cached: flags can flip while
        // the process runs.
        if !self.gate.enabled(&self.scope) {
            debug!(scope = %self.scope.name(), "update checks disabled; skipping cycle");
            return;
        }
        if cancel_requested(&self.cancel_rx) {
            return;
        }

        let mut snapshot = Vec::new();
        for contributor in &self.contributors {
            snapshot.extend(contributor.contribute(&self.scope));
        }

        match self.evaluator.run_cycle(snapshot, &self.cancel_rx).await {
            Ok(report) => {
                info!(
                    scope = %self.scope.name(),
                    examined = report.examined,
                    shown = report.shown,
                    hidden = report.hidden,
                    "update check finished"
                );
                telemetry::event(
                    "check.cycle",
                    &[
                        ("scope", self.scope.name()),
                        ("examined", report.examined.to_string().as_str()),
                        ("shown", report.shown.to_string().as_str()),
                        ("hidden", report.hidden.to_string().as_str()),
                    ],
                );
            }
            // Cooperative cancellation terminates the cycle silently.
            Err(CheckError::Cancelled) => {}
            Err(err) => {
                warn!(scope = %self.scope.name(), "update check failed: {err}");
            }
        }
    }
}
