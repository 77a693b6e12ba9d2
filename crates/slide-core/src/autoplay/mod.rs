//! Auto-play timer loop
//!
//! One cycle samples the clock when it starts, then on every frame reports
//! `min(1.0, elapsed / interval)` and, once the interval has elapsed, hands
//! control back to its host exactly once. A cycle is identified by a
//! [`CycleId`]; the host decides on every frame whether that cycle is still
//! the live one, so a loop that was stopped between two frames exits without
//! acting.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Weak;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::state::CycleId;

/// Shortest frame period the loop accepts
const MIN_FRAME: Duration = Duration::from_millis(1);

/// The side of the controller a running cycle talks to
#[async_trait]
pub(crate) trait AutoPlayHost: Send + Sync {
    /// Report the progress of `cycle`. Returns `false` once the cycle is
    /// stale; nothing reported for it is left standing after that.
    fn report_progress(&self, cycle: CycleId, progress: f64) -> bool;

    /// The interval of `cycle` has elapsed
    async fn cycle_elapsed(&self, cycle: CycleId);
}

/// Fraction of `interval` covered by `elapsed`, clamped to `1.0`
pub fn progress(elapsed: Duration, interval: Duration) -> f64 {
    if interval.is_zero() {
        return 1.0;
    }
    (elapsed.as_secs_f64() / interval.as_secs_f64()).min(1.0)
}

/// Owns the task running the current auto-play cycle
#[derive(Debug, Default)]
pub struct AutoPlayScheduler {
    task: Mutex<Option<JoinHandle<()>>>,
    cycles: AtomicU64,
}

impl AutoPlayScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the id of the next cycle
    pub(crate) fn next_cycle(&self) -> CycleId {
        self.cycles.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Spawn the loop for `cycle` on the current tokio runtime.
    ///
    /// Returns `false` when called outside a runtime.
    pub(crate) fn launch(
        &self,
        host: Weak<dyn AutoPlayHost>,
        cycle: CycleId,
        started: Instant,
        interval: Duration,
        frame: Duration,
    ) -> bool {
        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                tracing::warn!("Cannot start auto play without a tokio runtime: {}", e);
                return false;
            }
        };

        let task = runtime.spawn(run_cycle(host, cycle, started, interval, frame));
        if let Some(stale) = self.task.lock().replace(task) {
            stale.abort();
        }
        true
    }

    /// Cancel the pending frame of the running loop, if any
    pub(crate) fn cancel(&self) {
        if let Some(task) = self.task.lock().take() {
            task.abort();
        }
    }

    /// Forget the running loop without aborting it.
    ///
    /// Used by a loop that is ending itself and still has work to finish.
    pub(crate) fn detach(&self) {
        self.task.lock().take();
    }

    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .as_ref()
            .map(|task| !task.is_finished())
            .unwrap_or(false)
    }
}

impl Drop for AutoPlayScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn run_cycle(
    host: Weak<dyn AutoPlayHost>,
    cycle: CycleId,
    started: Instant,
    interval: Duration,
    frame: Duration,
) {
    let mut frames = tokio::time::interval(frame.max(MIN_FRAME));
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        frames.tick().await;

        let Some(host) = host.upgrade() else {
            return;
        };
        let elapsed = started.elapsed();
        if !host.report_progress(cycle, progress(elapsed, interval)) {
            tracing::trace!("Auto play cycle {} is stale, exiting", cycle);
            return;
        }

        if elapsed >= interval {
            host.cycle_elapsed(cycle).await;
            return;
        }
    }
}
