//! Epoch-based cooperative cancellation.
//!
//! `CancellationEpoch` is a monotonically increasing generation counter.
//! Each submission captures the current generation in a [`CancelSignal`];
//! `advance` bumps the counter, which cancels every signal captured before
//! it. Nothing is torn down preemptively: transports and the submitter
//! observe cancellation by comparing generations.

use tokio::sync::watch;
use tracing::debug;

/// Generation counter shared by all submissions of one submitter.
#[derive(Debug)]
pub struct CancellationEpoch {
    tx: watch::Sender<u64>,
}

impl CancellationEpoch {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(0);
        Self { tx }
    }

    /// Current generation.
    #[must_use]
    pub fn current(&self) -> u64 {
        *self.tx.borrow()
    }

    /// Capture the current generation.
    #[must_use]
    pub fn signal(&self) -> CancelSignal {
        let rx = self.tx.subscribe();
        let captured = *rx.borrow();
        CancelSignal { captured, rx }
    }

    /// Advance the generation, canceling every signal captured so far.
    ///
    /// Returns the new generation.
    pub fn advance(&self) -> u64 {
        let mut next = 0;
        self.tx.send_modify(|epoch| {
            *epoch = epoch.wrapping_add(1);
            next = *epoch;
        });
        debug!(epoch = next, "Cancellation epoch advanced");
        next
    }
}

impl Default for CancellationEpoch {
    fn default() -> Self {
        Self::new()
    }
}

/// Cancellation signal bound to one captured generation.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    captured: u64,
    rx: watch::Receiver<u64>,
}

impl CancelSignal {
    /// A signal that is never canceled.
    #[must_use]
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(0);
        Self { captured: 0, rx }
    }

    /// Generation this signal was captured at.
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.captured
    }

    /// Whether the epoch has advanced since capture.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow() != self.captured
    }

    /// Resolve once the epoch has advanced since capture.
    ///
    /// Never resolves if the epoch is dropped without advancing.
    pub async fn cancelled(&self) {
        let captured = self.captured;
        let mut rx = self.rx.clone();
        let advanced = rx.wait_for(|epoch| *epoch != captured).await.is_ok();
        if !advanced {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_pending, assert_ready, task};

    #[test]
    fn test_advance_cancels_captured_signals() {
        let epoch = CancellationEpoch::new();
        let before = epoch.signal();
        assert!(!before.is_cancelled());

        assert_eq!(epoch.advance(), 1);
        assert!(before.is_cancelled());

        let after = epoch.signal();
        assert_eq!(after.epoch(), 1);
        assert!(!after.is_cancelled());
    }

    #[test]
    fn test_clones_share_cancellation() {
        let epoch = CancellationEpoch::new();
        let signal = epoch.signal();
        let clone = signal.clone();

        epoch.advance();

        assert!(signal.is_cancelled());
        assert!(clone.is_cancelled());
    }

    #[test]
    fn test_cancelled_future_wakes_on_advance() {
        let epoch = CancellationEpoch::new();
        let signal = epoch.signal();

        let mut fut = task::spawn(signal.cancelled());
        assert_pending!(fut.poll());

        epoch.advance();

        assert!(fut.is_woken());
        assert_ready!(fut.poll());
    }

    #[test]
    fn test_never_signal_stays_pending() {
        let signal = CancelSignal::never();
        assert!(!signal.is_cancelled());

        let mut fut = task::spawn(signal.cancelled());
        assert_pending!(fut.poll());
    }

    #[test]
    fn test_dropped_epoch_does_not_cancel() {
        let epoch = CancellationEpoch::new();
        let signal = epoch.signal();
        drop(epoch);

        assert!(!signal.is_cancelled());
        let mut fut = task::spawn(signal.cancelled());
        assert_pending!(fut.poll());
    }
}
