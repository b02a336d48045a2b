use std::sync::{Arc, Mutex};

use super::countdown::{CountdownScheduler, ExpireFn, TickFn};

#[derive(Default)]
struct ManualRun {
    remaining: u32,
    on_tick: Option<TickFn>,
    on_expire: Option<ExpireFn>,
}

#[derive(Default)]
struct ManualInner {
    run: Option<ManualRun>,
    starts: u32,
    stops: u32,
}

// Deterministic scheduler for session tests; clones share one timeline.
#[derive(Clone, Default)]
pub(crate) struct ManualCountdown {
    inner: Arc<Mutex<ManualInner>>,
}

impl ManualCountdown {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    // Fires one tick; returns false when no run is active.
    pub(crate) fn advance(&self) -> bool {
        let mut guard = self.inner.lock().expect("countdown mutex poisoned");
        let Some(run) = guard.run.as_mut() else {
            return false;
        };

        run.remaining = run.remaining.saturating_sub(1);
        let remaining = run.remaining;
        if let Some(on_tick) = run.on_tick.as_mut() {
            on_tick(remaining);
        }
        if remaining == 0 {
            if let Some(on_expire) = run.on_expire.take() {
                on_expire();
            }
            guard.run = None;
        }
        true
    }

    pub(crate) fn starts(&self) -> u32 {
        self.inner.lock().expect("countdown mutex poisoned").starts
    }

    pub(crate) fn stops(&self) -> u32 {
        self.inner.lock().expect("countdown mutex poisoned").stops
    }
}

impl CountdownScheduler for ManualCountdown {
    fn start(&mut self, initial: u32, on_tick: TickFn, on_expire: ExpireFn) {
        let mut guard = self.inner.lock().expect("countdown mutex poisoned");
        if guard.run.is_some() {
            return;
        }
        guard.starts += 1;
        if initial == 0 {
            on_expire();
            return;
        }
        guard.run = Some(ManualRun {
            remaining: initial,
            on_tick: Some(on_tick),
            on_expire: Some(on_expire),
        });
    }

    fn stop(&mut self) {
        let mut guard = self.inner.lock().expect("countdown mutex poisoned");
        if guard.run.take().is_some() {
            guard.stops += 1;
        }
    }

    fn is_running(&self) -> bool {
        self.inner
            .lock()
            .expect("countdown mutex poisoned")
            .run
            .is_some()
    }
}
