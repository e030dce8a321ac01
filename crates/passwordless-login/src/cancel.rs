//! Cooperative cancellation for the polling loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cancellation handle for [`verify`](crate::PasswordlessFlow::verify).
///
/// A clonable boolean flag with an optional completion callback. The flag is
/// only sampled after each polling round trip, never during the sleep, so
/// cancellation latency is bounded by the polling interval. The completion
/// callback fires once the loop acknowledges the cancellation.
#[derive(Clone, Default)]
pub struct CancellationSignal {
    cancelled: Arc<AtomicBool>,
    on_complete: Option<Arc<dyn Fn() + Send + Sync>>,
}

impl CancellationSignal {
    /// A signal with no completion callback.
    pub fn new() -> Self {
        Self::default()
    }

    /// A signal that runs `on_complete` when the polling loop acknowledges
    /// the cancellation.
    pub fn with_completion(on_complete: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            on_complete: Some(Arc::new(on_complete)),
        }
    }

    /// Request cancellation. The loop observes it after its next round trip.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Invoked by the polling loop when it returns due to this signal.
    pub(crate) fn acknowledge(&self) {
        if let Some(on_complete) = &self.on_complete {
            on_complete();
        }
    }
}

impl std::fmt::Debug for CancellationSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationSignal")
            .field("cancelled", &self.is_cancelled())
            .field("has_completion", &self.on_complete.is_some())
            .finish()
    }
}
