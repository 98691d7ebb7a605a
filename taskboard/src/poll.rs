//! Owned background tasks and poll timers.
//!
//! Every recurring fetch and every derived stream runs in a tokio task owned
//! by a [`Poller`]. Dropping or stopping the `Poller` aborts the task, so no
//! timer outlives the service or view that started it.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Interval, MissedTickBehavior};

/// Handle to a spawned background loop. Aborts the loop on drop.
#[derive(Debug)]
pub struct Poller {
    name: &'static str,
    handle: JoinHandle<()>,
}

impl Poller {
    /// Spawns `task` on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn spawn<F>(name: &'static str, task: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        tracing::debug!(poller = name, "starting background task");
        Self {
            name,
            handle: tokio::spawn(task),
        }
    }

    /// Name given at spawn time, used in logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Whether the task is still running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Aborts the task.
    pub fn stop(&self) {
        if !self.handle.is_finished() {
            tracing::debug!(poller = self.name, "stopping background task");
        }
        self.handle.abort();
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Shortest period a [`ticker`] will run at.
pub const MIN_POLL_PERIOD: Duration = Duration::from_millis(1);

/// Builds a poll timer whose first tick completes immediately.
///
/// A fetch that overruns the period delays the schedule instead of bursting
/// to catch up. Periods below [`MIN_POLL_PERIOD`] are raised to it.
#[must_use]
pub fn ticker(period: Duration) -> Interval {
    if period < MIN_POLL_PERIOD {
        tracing::warn!(?period, "poll period too short, using minimum");
    }
    let mut interval = tokio::time::interval(period.max(MIN_POLL_PERIOD));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}
