//! Cancellable single-shot timers.
//!
//! Timers sleep as tokio tasks on the runtime that was current when the owning
//! component was built, then post their callback to the UI executor. Each
//! timer carries a generation number; the callback only runs if the owner
//! still considers that generation current, so a timer that fires while being
//! cancelled can never act on newer state.

use crate::platform::UiExecutor;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::AbortHandle;

/// Owned handle to a scheduled timer. Dropping the handle cancels the timer.
#[derive(Debug)]
pub struct TimerHandle {
    abort: AbortHandle,
}

impl TimerHandle {
    /// Cancel the timer. Safe to call after it fired.
    pub fn cancel(self) {
        // Drop does the work.
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.abort.abort();
    }
}

/// Schedules timers for one component and tracks the current generation.
#[derive(Clone)]
pub struct TimerScheduler {
    runtime: Option<Handle>,
    ui: Arc<dyn UiExecutor>,
    generation: Arc<AtomicU64>,
}

impl TimerScheduler {
    /// Capture the current tokio runtime, if any. Callbacks run on `ui`.
    ///
    /// Without a runtime every `schedule` call returns `None` and the caller
    /// must treat the timer as having fired immediately.
    pub fn from_current(component: &'static str, ui: Arc<dyn UiExecutor>) -> Self {
        let runtime = Handle::try_current().ok();
        if runtime.is_none() {
            tracing::warn!("{}: no tokio runtime, timers are disabled", component);
        }
        Self {
            runtime,
            ui,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Invalidate every outstanding timer from this scheduler.
    pub fn invalidate(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Whether `generation` is still the newest one issued.
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Run `callback` on the UI executor once `delay` has passed, unless
    /// cancelled or superseded.
    ///
    /// The callback receives its generation so it can re-check
    /// [`is_current`](Self::is_current) under the owner's lock; the timer may
    /// be cancelled between posting and running.
    ///
    /// Scheduling a new timer invalidates all previous ones from the same
    /// scheduler, which is what single-shot auto-collapse and debounce need.
    pub fn schedule<F>(&self, delay: Duration, callback: F) -> Option<TimerHandle>
    where
        F: FnOnce(u64) + Send + 'static,
    {
        let runtime = self.runtime.as_ref()?;
        let generation = self.invalidate();
        let current = Arc::clone(&self.generation);
        let ui = Arc::clone(&self.ui);

        let task = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if current.load(Ordering::SeqCst) == generation {
                ui.post(Box::new(move || callback(generation)));
            }
        });

        Some(TimerHandle {
            abort: task.abort_handle(),
        })
    }
}
