//! Cancel-and-reschedule delayed task.

use std::sync::Mutex;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Runs a task once a quiet period has elapsed since the last `schedule`.
///
/// Each call to `schedule` aborts the previously pending task, so a burst
/// of triggers collapses into a single execution.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Mutex::new(None),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedule `task` to run after the delay, replacing any pending one.
    ///
    /// Returns `false` without scheduling when called outside a tokio
    /// runtime; the caller decides whether to run the task inline.
    pub fn schedule<F>(&self, task: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        let Ok(runtime) = Handle::try_current() else {
            return false;
        };

        let delay = self.delay;
        let handle = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            task();
        });

        let mut pending = self.pending.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(previous) = pending.replace(handle) {
            previous.abort();
        }
        true
    }

    /// Abort the pending task, if any.
    pub fn cancel(&self) {
        let mut pending = self.pending.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(previous) = pending.take() {
            previous.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        let pending = self.pending.lock().unwrap_or_else(|p| p.into_inner());
        pending.as_ref().is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
