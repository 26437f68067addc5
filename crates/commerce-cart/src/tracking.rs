//! Error tracking seam.
//!
//! Failed add-to-cart submissions are not returned to the caller; they are
//! handed to a `TrackingSink` instead. Sinks are fire-and-forget: `report`
//! must not block and cannot fail.

use std::sync::Arc;

use tracing::error;

use crate::error::TransportError;

/// Receives transport failures for out-of-band tracking.
pub trait TrackingSink: Send + Sync {
    fn report(&self, error: &TransportError);
}

/// Arc wrapper for TrackingSink trait objects.
pub type DynTrackingSink = Arc<dyn TrackingSink>;

/// Sink that records failures in the structured log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTrackingSink;

impl TrackingSink for LogTrackingSink {
    fn report(&self, err: &TransportError) {
        error!(kind = err.kind(), error = %err, "Add-to-cart request failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_sink_accepts_all_kinds() {
        let sink: DynTrackingSink = Arc::new(LogTrackingSink);
        sink.report(&TransportError::Http("timeout".to_string()));
        sink.report(&TransportError::Rejected {
            status: 400,
            message: "Product is not available".to_string(),
        });
        sink.report(&TransportError::Decode("missing field `id`".to_string()));
    }
}
