//! Transport seam for add-to-cart requests.
//!
//! The submitter only needs one operation from the outside world: send an
//! `AddCartLine` and get the created `CartLine` back. Keeping it behind a
//! trait lets the HTTP client, tests and demos plug in interchangeably.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use commerce_core::{AddCartLine, CartLine};
use parking_lot::Mutex;
use uuid::Uuid;

use crate::epoch::CancelSignal;
use crate::error::{TransportError, TransportResult};

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Sends add-to-cart requests to the backend.
///
/// Implementations should watch `cancel` at their own suspension points and
/// return `TransportError::Canceled` when it fires. The submitter also checks
/// the signal once the call returns, so ignoring it is safe but wasteful.
pub trait CartTransport: Send + Sync {
    fn add_cart_line(
        &self,
        line: AddCartLine,
        cancel: CancelSignal,
    ) -> BoxFuture<'_, TransportResult<CartLine>>;
}

/// Arc wrapper for CartTransport trait objects.
pub type DynCartTransport = Arc<dyn CartTransport>;

/// In-memory transport for tests and demos.
///
/// Answers every request after a configurable delay, echoing the line back
/// as a `CartLine` unless a failure is configured.
#[derive(Debug)]
pub struct MockCartTransport {
    /// Recorded requests, in call order.
    calls: Mutex<Vec<AddCartLine>>,
    /// Delay before each response.
    delay: Mutex<Duration>,
    /// Per-product delay overrides.
    product_delays: Mutex<HashMap<Uuid, Duration>>,
    /// Error returned for every call while set.
    fail_all: Mutex<Option<TransportError>>,
    /// Per-product errors.
    product_failures: Mutex<HashMap<Uuid, TransportError>>,
    /// Whether to return `Canceled` as soon as the signal fires.
    observe_cancel: AtomicBool,
    next_line: AtomicU32,
}

impl Default for MockCartTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCartTransport {
    #[must_use]
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            delay: Mutex::new(Duration::ZERO),
            product_delays: Mutex::new(HashMap::new()),
            fail_all: Mutex::new(None),
            product_failures: Mutex::new(HashMap::new()),
            observe_cancel: AtomicBool::new(true),
            next_line: AtomicU32::new(1),
        }
    }

    /// Create a mock that answers after `delay`.
    #[must_use]
    pub fn with_delay(delay: Duration) -> Self {
        let mock = Self::new();
        mock.set_delay(delay);
        mock
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = delay;
    }

    /// Override the delay for one product.
    pub fn set_product_delay(&self, product_id: Uuid, delay: Duration) {
        self.product_delays.lock().insert(product_id, delay);
    }

    /// Fail every call with `error` (or stop failing with `None`).
    pub fn set_fail_all(&self, error: Option<TransportError>) {
        *self.fail_all.lock() = error;
    }

    /// Fail calls for one product.
    pub fn fail_product(&self, product_id: Uuid, error: TransportError) {
        self.product_failures.lock().insert(product_id, error);
    }

    /// Whether calls return early with `Canceled` when their signal fires.
    pub fn set_observe_cancel(&self, observe: bool) {
        self.observe_cancel.store(observe, Ordering::SeqCst);
    }

    /// Recorded requests.
    pub fn calls(&self) -> Vec<AddCartLine> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    fn respond(&self, line: &AddCartLine) -> TransportResult<CartLine> {
        if let Some(err) = self.fail_all.lock().clone() {
            return Err(err);
        }
        if let Some(err) = self.product_failures.lock().get(&line.product_id).cloned() {
            return Err(err);
        }
        Ok(CartLine {
            id: Uuid::new_v4(),
            product_id: Some(line.product_id),
            product_name: None,
            qty_ordered: line.qty_ordered,
            unit_of_measure: line.unit_of_measure.clone(),
            notes: line.notes.clone(),
            line: Some(self.next_line.fetch_add(1, Ordering::SeqCst)),
            properties: line.properties.clone(),
        })
    }
}

impl CartTransport for MockCartTransport {
    fn add_cart_line(
        &self,
        line: AddCartLine,
        cancel: CancelSignal,
    ) -> BoxFuture<'_, TransportResult<CartLine>> {
        Box::pin(async move {
            self.calls.lock().push(line.clone());

            let delay = self
                .product_delays
                .lock()
                .get(&line.product_id)
                .copied()
                .unwrap_or(*self.delay.lock());

            if self.observe_cancel.load(Ordering::SeqCst) {
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = cancel.cancelled() => return Err(TransportError::Canceled),
                }
            } else {
                tokio::time::sleep(delay).await;
            }

            self.respond(&line)
        })
    }
}
