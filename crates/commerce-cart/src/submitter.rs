//! Add-to-cart submission lifecycle.
//!
//! `CartLineSubmitter::submit` registers the line as pending, arms the slow
//! signal, dispatches to the transport and settles into exactly one
//! terminal outcome:
//!
//! - `Completed`: the transport returned the created line
//! - `Failed`: the transport failed; the error went to the tracking sink
//! - `Canceled`: `cancel_all` ran while the request was in flight
//!
//! Transport failures never escape `submit`. The only `Err` is a duplicate
//! in-flight line under `DuplicatePolicy::Reject`.

use std::fmt;
use std::sync::Arc;

use commerce_core::{AddCartLine, CartLine};
use commerce_telemetry::Metrics;
use tokio::sync::{broadcast, watch};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::SubmitterConfig;
use crate::epoch::{CancelSignal, CancellationEpoch};
use crate::error::{SubmitResult, TransportError, TransportResult};
use crate::event::{CartEvent, CartEvents};
use crate::pending::{PendingRequest, PendingRequestSet, SubmissionId};
use crate::slow_signal::SlowSignalTimer;
use crate::tracking::DynTrackingSink;
use crate::transport::DynCartTransport;

/// Terminal outcome of one submission.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionOutcome {
    /// The backend created the line.
    Completed(CartLine),
    /// The transport failed. The error was reported to tracking.
    Failed,
    /// Canceled by `cancel_all` while in flight.
    Canceled,
}

impl SubmissionOutcome {
    /// Label for metrics and logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed(_) => "completed",
            Self::Failed => "failed",
            Self::Canceled => "canceled",
        }
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    #[must_use]
    pub fn is_canceled(&self) -> bool {
        matches!(self, Self::Canceled)
    }

    pub fn cart_line(&self) -> Option<&CartLine> {
        match self {
            Self::Completed(line) => Some(line),
            _ => None,
        }
    }

    pub fn into_cart_line(self) -> Option<CartLine> {
        match self {
            Self::Completed(line) => Some(line),
            _ => None,
        }
    }
}

/// Deregisters a submission when dropped.
///
/// Settling through drop keeps the pending set accurate even when the
/// caller drops the `submit` future mid-flight.
struct Registration<'a> {
    pending: &'a PendingRequestSet,
    slow: &'a SlowSignalTimer,
    id: SubmissionId,
}

impl Drop for Registration<'_> {
    fn drop(&mut self) {
        if self.pending.remove(self.id).is_some() {
            self.slow.disarm();
        }
    }
}

/// Tracks and dispatches add-to-cart requests.
///
/// # Thread Safety
///
/// All methods take `&self`; share the submitter behind an `Arc` to submit
/// from several tasks. The pending set and slow signal each serialize their
/// own state, and cancellation is a lock-free generation counter.
pub struct CartLineSubmitter {
    pending: Arc<PendingRequestSet>,
    slow: Arc<SlowSignalTimer>,
    epoch: CancellationEpoch,
    events: CartEvents,
    transport: DynCartTransport,
    tracking: DynTrackingSink,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for CartLineSubmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CartLineSubmitter")
            .field("pending", &self.pending.count())
            .field("is_slow", &self.slow.is_slow())
            .field("epoch", &self.epoch.current())
            .finish()
    }
}

impl CartLineSubmitter {
    /// Create a submitter using the system clock.
    #[must_use]
    pub fn new(
        config: SubmitterConfig,
        transport: DynCartTransport,
        tracking: DynTrackingSink,
    ) -> Self {
        Self::with_clock(config, transport, tracking, Arc::new(SystemClock))
    }

    /// Create a submitter with an explicit clock for submission timestamps.
    #[must_use]
    pub fn with_clock(
        config: SubmitterConfig,
        transport: DynCartTransport,
        tracking: DynTrackingSink,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let events = CartEvents::new(config.event_capacity);
        let pending = Arc::new(PendingRequestSet::new(
            config.duplicate_policy,
            events.clone(),
        ));
        let slow = Arc::new(SlowSignalTimer::new(
            config.slow_threshold(),
            Arc::clone(&pending),
            events.clone(),
        ));

        Self {
            pending,
            slow,
            epoch: CancellationEpoch::new(),
            events,
            transport,
            tracking,
            clock,
        }
    }

    /// Submit one line and wait for it to settle.
    ///
    /// # Errors
    /// `DuplicateRequest` if an equal line is in flight under the reject
    /// policy. Nothing is registered or sent in that case.
    ///
    /// Transport failures, including the backend refusing a malformed line,
    /// are reported to tracking and returned as `Ok(SubmissionOutcome::Failed)`.
    pub async fn submit(&self, line: AddCartLine) -> SubmitResult<SubmissionOutcome> {
        let id = self.pending.add(line.clone(), self.clock.now())?;
        let registration = Registration {
            pending: &self.pending,
            slow: &self.slow,
            id,
        };
        self.slow.arm_if_needed();

        let signal = self.epoch.signal();
        let started = Instant::now();
        debug!(
            submission = %id,
            epoch = signal.epoch(),
            line = %line,
            "Submitting add-to-cart request"
        );

        let result = self.transport.add_cart_line(line, signal.clone()).await;
        let outcome = self.settle(id, &signal, result);

        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
        Metrics::submission_settled(outcome.as_str(), latency_ms);
        debug!(
            submission = %id,
            outcome = outcome.as_str(),
            latency_ms,
            "Add-to-cart request settled"
        );

        drop(registration);
        Ok(outcome)
    }

    fn settle(
        &self,
        id: SubmissionId,
        signal: &CancelSignal,
        result: TransportResult<CartLine>,
    ) -> SubmissionOutcome {
        if signal.is_cancelled() {
            return SubmissionOutcome::Canceled;
        }

        match result {
            Ok(cart_line) => SubmissionOutcome::Completed(cart_line),
            Err(TransportError::Canceled) => SubmissionOutcome::Canceled,
            Err(err) => {
                warn!(
                    submission = %id,
                    kind = err.kind(),
                    error = %err,
                    "Add-to-cart request failed, reporting to tracking"
                );
                Metrics::error_tracked(err.kind());
                self.tracking.report(&err);
                SubmissionOutcome::Failed
            }
        }
    }

    /// Cancel every submission currently in flight.
    ///
    /// Cooperative: transports observe the signal at their next suspension
    /// point, and any submission that settles afterwards is `Canceled`.
    /// Submissions started after this call are unaffected.
    ///
    /// Returns the new cancellation epoch.
    pub fn cancel_all(&self) -> u64 {
        let epoch = self.epoch.advance();
        Metrics::cancel_all();
        info!(
            epoch,
            pending = self.pending.count(),
            "Canceling all in-flight add-to-cart requests"
        );
        epoch
    }

    /// Number of in-flight submissions.
    #[must_use]
    pub fn count(&self) -> usize {
        self.pending.count()
    }

    /// Whether adding to cart is currently flagged as slow.
    #[must_use]
    pub fn is_slow(&self) -> bool {
        self.slow.is_slow()
    }

    /// Subscribe to count and slow-state events.
    ///
    /// The channel holds `event_capacity` events per receiver. A receiver
    /// that falls further behind gets `RecvError::Lagged` and has missed
    /// events; it should resync from [`count`](Self::count) and
    /// [`is_slow`](Self::is_slow). `watch_slow` never lags.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CartEvent> {
        self.events.subscribe()
    }

    /// Watch the slow signal state.
    #[must_use]
    pub fn watch_slow(&self) -> watch::Receiver<bool> {
        self.slow.watch()
    }

    /// In-flight submissions, oldest first.
    #[must_use]
    pub fn pending_requests(&self) -> Vec<PendingRequest> {
        self.pending.snapshot()
    }

    /// Current cancellation epoch.
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch.current()
    }
}
