//! In-flight add-to-cart request set.
//!
//! Every effective `add`/`remove` publishes exactly one
//! `CartEvent::CountChanged` before returning. Events are published while
//! the set's lock is held, so observers see them in mutation order.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use chrono::{DateTime, Utc};
use commerce_core::AddCartLine;
use commerce_telemetry::Metrics;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::config::DuplicatePolicy;
use crate::error::{SubmitError, SubmitResult};
use crate::event::{CartEvent, CartEvents};

/// Identity of one submission, unique per `PendingRequestSet`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubmissionId(u64);

impl SubmissionId {
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// An add-to-cart request awaiting its transport call.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingRequest {
    pub id: SubmissionId,
    pub line: AddCartLine,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct PendingInner {
    requests: HashMap<SubmissionId, PendingRequest>,
    /// In-flight submissions per distinct line value.
    lines: HashMap<AddCartLine, usize>,
}

/// Thread-safe set of in-flight add-to-cart requests.
///
/// # Thread Safety
///
/// Mutations are serialized by a `parking_lot::Mutex`. The count is
/// mirrored into an atomic so `count()` never waits on the lock.
#[derive(Debug)]
pub struct PendingRequestSet {
    inner: Mutex<PendingInner>,
    count: AtomicUsize,
    next_id: AtomicU64,
    policy: DuplicatePolicy,
    events: CartEvents,
}

impl PendingRequestSet {
    #[must_use]
    pub fn new(policy: DuplicatePolicy, events: CartEvents) -> Self {
        Self {
            inner: Mutex::new(PendingInner::default()),
            count: AtomicUsize::new(0),
            next_id: AtomicU64::new(1),
            policy,
            events,
        }
    }

    /// Register a request for `line`.
    ///
    /// # Errors
    /// `DuplicateRequest` if the policy is `Reject` and an equal line is
    /// already in flight. Nothing is published in that case.
    pub fn add(
        &self,
        line: AddCartLine,
        submitted_at: DateTime<Utc>,
    ) -> SubmitResult<SubmissionId> {
        let mut inner = self.inner.lock();

        if self.policy == DuplicatePolicy::Reject && inner.lines.contains_key(&line) {
            warn!(line = %line, "Add-to-cart rejected: identical line already in flight");
            Metrics::duplicate_rejected();
            return Err(SubmitError::DuplicateRequest(line.to_string()));
        }

        let id = SubmissionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        *inner.lines.entry(line.clone()).or_insert(0) += 1;
        inner.requests.insert(
            id,
            PendingRequest {
                id,
                line,
                submitted_at,
            },
        );

        let count = inner.requests.len();
        self.count.store(count, Ordering::Release);
        debug!(submission = %id, count, "Add-to-cart request registered");
        Metrics::pending_requests(count);
        self.events.publish(CartEvent::CountChanged { count });

        Ok(id)
    }

    /// Deregister a request.
    ///
    /// Returns the removed request, or `None` (and publishes nothing) if it
    /// was not present.
    pub fn remove(&self, id: SubmissionId) -> Option<PendingRequest> {
        let mut inner = self.inner.lock();

        let request = inner.requests.remove(&id)?;
        let remaining = inner.lines.get_mut(&request.line).map(|n| {
            *n -= 1;
            *n
        });
        if remaining == Some(0) {
            inner.lines.remove(&request.line);
        }

        let count = inner.requests.len();
        self.count.store(count, Ordering::Release);
        debug!(submission = %id, count, "Add-to-cart request settled");
        Metrics::pending_requests(count);
        self.events.publish(CartEvent::CountChanged { count });

        Some(request)
    }

    /// Number of in-flight requests.
    #[must_use]
    pub fn count(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Whether a line equal to `line` is in flight.
    #[must_use]
    pub fn contains_line(&self, line: &AddCartLine) -> bool {
        self.inner.lock().lines.contains_key(line)
    }

    /// Copy of the in-flight requests, oldest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<PendingRequest> {
        let mut requests: Vec<_> = self.inner.lock().requests.values().cloned().collect();
        requests.sort_by_key(|r| r.id);
        requests
    }

    #[must_use]
    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }
}
