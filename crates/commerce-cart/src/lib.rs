//! Add-to-cart submission tracking.
//!
//! Tracks every in-flight add-to-cart request, raises an advisory slow
//! signal when requests stay pending past a threshold, and supports
//! cooperative cancellation of all outstanding submissions.
//!
//! # Key Components
//!
//! - [`CartLineSubmitter`]: Submission lifecycle (register, dispatch, settle)
//! - [`PendingRequestSet`]: In-flight requests with count-changed events
//! - [`SlowSignalTimer`]: Single coalescing timer behind the slow signal
//! - [`CancellationEpoch`]: Generation counter behind `cancel_all`
//! - [`CartTransport`]: Seam to the HTTP client (or a mock)
//! - [`TrackingSink`]: Fire-and-forget error reporting
//!
//! # Submission Lifecycle (in `CartLineSubmitter::submit`)
//!
//! 1. Register in the pending set -> `CountChanged(n)`
//! 2. Arm the slow timer (no-op if already armed)
//! 3. Capture the cancellation epoch
//! 4. Await the transport
//! 5. Settle: Completed / Failed (reported to tracking) / Canceled
//! 6. Deregister -> `CountChanged(n - 1)`, disarm when drained

pub mod clock;
pub mod config;
pub mod epoch;
pub mod error;
pub mod event;
pub mod pending;
pub mod slow_signal;
pub mod submitter;
pub mod tracking;
pub mod transport;

pub use clock::{Clock, SystemClock};
pub use config::{DuplicatePolicy, SubmitterConfig};
pub use epoch::{CancelSignal, CancellationEpoch};
pub use error::{SubmitError, SubmitResult, TransportError, TransportResult};
pub use event::{CartEvent, CartEvents};
pub use pending::{PendingRequest, PendingRequestSet, SubmissionId};
pub use slow_signal::SlowSignalTimer;
pub use submitter::{CartLineSubmitter, SubmissionOutcome};
pub use tracking::{DynTrackingSink, LogTrackingSink, TrackingSink};
pub use transport::{BoxFuture, CartTransport, DynCartTransport, MockCartTransport};
