use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;

/// Trailing-edge debounce around a zero-argument action.
///
/// Each [`call`](Debounce::call) cancels the pending timer (if any) and
/// schedules the action `delay` from now. A burst of N calls inside the
/// delay window therefore runs the action exactly once, `delay` after the
/// last call. At most one timer task exists at a time, so rapid-fire call
/// sites never leak timers.
///
/// Must be called from within a tokio runtime (the timer is a spawned task).
#[derive(Clone)]
pub struct Debounce {
    inner: Arc<DebounceInner>,
}

struct DebounceInner {
    delay: Duration,
    action: Box<dyn Fn() + Send + Sync>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debounce {
    pub fn new(delay: Duration, action: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(DebounceInner {
                delay,
                action: Box::new(action),
                pending: Mutex::new(None),
            }),
        }
    }

    /// Schedule the action, superseding any pending schedule.
    pub fn call(&self) {
        let mut pending = self.inner.pending.lock().unwrap();
        if let Some(handle) = pending.take() {
            handle.abort();
        }
        let inner = Arc::clone(&self.inner);
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(inner.delay).await;
            (inner.action)();
        }));
    }
}

impl std::fmt::Debug for Debounce {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Debounce")
            .field("delay", &self.inner.delay)
            .finish_non_exhaustive()
    }
}
