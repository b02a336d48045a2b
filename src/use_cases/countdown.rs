// Countdown scheduling port and its tokio-backed implementation.

use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

pub type TickFn = Box<dyn FnMut(u32) + Send + 'static>;
pub type ExpireFn = Box<dyn FnOnce() + Send + 'static>;

/// Fixed-interval countdown driver.
///
/// A run started with `initial` calls `on_tick` with `initial - 1` down to `0`,
/// one call per interval, then calls `on_expire` exactly once.
pub trait CountdownScheduler: Send {
    /// No-op while a run is in progress.
    fn start(&mut self, initial: u32, on_tick: TickFn, on_expire: ExpireFn);
    /// Cancels the current run; no-op when idle.
    fn stop(&mut self);
    fn is_running(&self) -> bool;
}

/// Runs each countdown on its own tokio task.
///
/// The task is aborted on `stop` and on drop, so the timer never outlives its owner.
#[derive(Debug)]
pub struct TokioCountdown {
    period: Duration,
    run: Option<JoinHandle<()>>,
}

impl TokioCountdown {
    pub fn new(period: Duration) -> Self {
        Self { period, run: None }
    }
}

impl CountdownScheduler for TokioCountdown {
    fn start(&mut self, initial: u32, mut on_tick: TickFn, on_expire: ExpireFn) {
        if self.is_running() {
            return;
        }

        let period = self.period;
        self.run = Some(tokio::spawn(async move {
            // First tick lands one full period after start.
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            for remaining in (0..initial).rev() {
                interval.tick().await;
                on_tick(remaining);
            }
            on_expire();
        }));
    }

    fn stop(&mut self) {
        if let Some(run) = self.run.take() {
            run.abort();
        }
    }

    fn is_running(&self) -> bool {
        self.run.as_ref().is_some_and(|run| !run.is_finished())
    }
}

impl Drop for TokioCountdown {
    fn drop(&mut self) {
        self.stop();
    }
}
