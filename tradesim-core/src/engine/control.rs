//! Session control — stop requests observed by the candle loop at safe points.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// The host session the simulation runs in.
///
/// `stop` is a request, not an unwind: the driver observes it through the
/// flags the next time it reaches a safe point between cycles.
pub trait SessionController: Send + Sync {
    fn stop(&self, reason: &str);

    /// The session was asked to stop.
    fn session_stop_requested(&self) -> bool;

    /// The hosting process is shutting down gracefully.
    fn task_stop_requested(&self) -> bool;
}

#[derive(Debug, Default)]
struct StopFlags {
    session: AtomicBool,
    task: AtomicBool,
    reason: Mutex<Option<String>>,
}

/// Cloneable cancellation token shared between the host and the driver.
#[derive(Debug, Clone, Default)]
pub struct StopToken {
    inner: Arc<StopFlags>,
}

impl StopToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_session_stop(&self, reason: &str) {
        if let Ok(mut slot) = self.inner.reason.lock() {
            *slot = Some(reason.to_string());
        }
        self.inner.session.store(true, Ordering::SeqCst);
    }

    pub fn request_task_stop(&self) {
        self.inner.task.store(true, Ordering::SeqCst);
    }

    /// Reason given with the last session stop request.
    pub fn stop_reason(&self) -> Option<String> {
        self.inner.reason.lock().ok().and_then(|slot| slot.clone())
    }
}

impl SessionController for StopToken {
    fn stop(&self, reason: &str) {
        tracing::info!(reason, "session stop requested");
        self.request_session_stop(reason);
    }

    fn session_stop_requested(&self) -> bool {
        self.inner.session.load(Ordering::SeqCst)
    }

    fn task_stop_requested(&self) -> bool {
        self.inner.task.load(Ordering::SeqCst)
    }
}
