//! Cooperative cancellation for in-flight runs.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Token checked between files during a run.
///
/// Files already committed to the manifest stay committed; files not yet
/// processed are picked up again on the next run. Clone is cheap and shares
/// state.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a new token (not cancelled).
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}
