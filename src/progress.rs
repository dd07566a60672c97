//! Progress reporting and cooperative cancellation.
//!
//! Builders poll [`Progress::is_cancelled`] before every merge (or every
//! k-means step) and return [`Error::ClusteringAborted`](crate::Error::ClusteringAborted)
//! when it answers `true`. A single distance computation is never interrupted.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Port through which a builder reports progress and learns about
/// cancellation.
pub trait Progress {
    /// `done` of `total` steps have completed.
    fn report(&self, done: usize, total: usize);

    /// Whether the caller wants the run to stop.
    fn is_cancelled(&self) -> bool;
}

/// Ignores progress and never cancels.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn report(&self, _done: usize, _total: usize) {}

    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Shared cancellation switch.
///
/// Clone it into the UI side and call [`CancelFlag::cancel`]; the builder
/// holding the other clone stops at its next poll.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    cancelled: Arc<AtomicBool>,
}

impl CancelFlag {
    /// A flag that is not yet cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }
}

impl Progress for CancelFlag {
    fn report(&self, done: usize, total: usize) {
        log::trace!("clustering progress {done}/{total}");
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_is_visible_through_clones() {
        let flag = CancelFlag::new();
        let worker = flag.clone();
        assert!(!worker.is_cancelled());
        flag.cancel();
        assert!(worker.is_cancelled());
    }
}
