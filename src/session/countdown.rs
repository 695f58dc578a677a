//! Cancellable periodic countdown tick.

use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

/// Shortest tick period; tokio intervals reject a zero period.
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Owns the task that emits countdown ticks.
///
/// The task is aborted when the timer is cancelled or dropped, so no tick can
/// fire after the session leaves the countdown.
#[derive(Debug)]
pub struct CountdownTimer {
    token: u64,
    task: JoinHandle<()>,
}

impl CountdownTimer {
    /// Start sending `make_tick(token)` every `period`, first one after one period.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start<E, F>(token: u64, period: Duration, tx: UnboundedSender<E>, make_tick: F) -> Self
    where
        E: Send + 'static,
        F: Fn(u64) -> E + Send + 'static,
    {
        let period = period.max(MIN_PERIOD);
        let task = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if tx.send(make_tick(token)).is_err() {
                    break;
                }
            }
        });
        Self { token, task }
    }

    pub fn token(&self) -> u64 {
        self.token
    }

    /// Stop the tick task.
    pub fn cancel(self) {
        // Drop aborts
    }
}

impl Drop for CountdownTimer {
    fn drop(&mut self) {
        self.task.abort();
    }
}
