//! Observable submission events.
//!
//! Events are published on a broadcast channel. A receiver that falls more
//! than `event_capacity` events behind gets `RecvError::Lagged` and should
//! resync from `CartLineSubmitter::count` / `is_slow`.

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::trace;

/// Event emitted by the pending set and the slow signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CartEvent {
    /// Number of in-flight requests changed.
    CountChanged { count: usize },
    /// Slow signal transitioned.
    SlowStateChanged { is_slow: bool },
}

/// Broadcast publisher for `CartEvent`s.
#[derive(Debug, Clone)]
pub struct CartEvents {
    tx: broadcast::Sender<CartEvent>,
}

impl CartEvents {
    /// Create a publisher buffering up to `capacity` events per receiver.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publish an event. Having no receivers is not an error.
    pub fn publish(&self, event: CartEvent) {
        match self.tx.send(event) {
            Ok(receivers) => trace!(?event, receivers, "Cart event published"),
            Err(_) => trace!(?event, "No cart event receivers"),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CartEvent> {
        self.tx.subscribe()
    }
}
