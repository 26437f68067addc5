//! Demo application: submit lines concurrently and report the outcome.

use std::sync::Arc;

use commerce_cart::{
    CartEvent, CartLineSubmitter, DynCartTransport, LogTrackingSink, SubmissionOutcome,
    SubmitError,
};
use commerce_client::CartClient;
use commerce_core::AddCartLine;
use commerce_telemetry::Metrics;
use futures_util::future::join_all;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::DemoConfig;
use crate::error::DemoResult;

/// Settled submissions by outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DemoSummary {
    pub completed: usize,
    pub failed: usize,
    pub canceled: usize,
    pub rejected: usize,
}

impl DemoSummary {
    fn record(&mut self, result: &Result<SubmissionOutcome, SubmitError>) {
        match result {
            Ok(SubmissionOutcome::Completed(_)) => self.completed += 1,
            Ok(SubmissionOutcome::Failed) => self.failed += 1,
            Ok(SubmissionOutcome::Canceled) => self.canceled += 1,
            Err(_) => self.rejected += 1,
        }
    }
}

pub struct DemoApp {
    submitter: Arc<CartLineSubmitter>,
}

impl DemoApp {
    /// Create the demo against the HTTP API.
    pub fn new(config: &DemoConfig) -> DemoResult<Self> {
        let client = CartClient::new(&config.client)?;
        info!(base_url = %config.client.base_url, "Cart client created");
        Ok(Self::with_transport(config, Arc::new(client)))
    }

    /// Create the demo over any transport.
    pub fn with_transport(config: &DemoConfig, transport: DynCartTransport) -> Self {
        let submitter = CartLineSubmitter::new(
            config.submitter.clone(),
            transport,
            Arc::new(LogTrackingSink),
        );
        Self {
            submitter: Arc::new(submitter),
        }
    }

    pub fn submitter(&self) -> &Arc<CartLineSubmitter> {
        &self.submitter
    }

    /// Submit every line concurrently and wait for all of them to settle.
    ///
    /// Ctrl-C cancels whatever is still in flight.
    pub async fn run(self, lines: Vec<AddCartLine>) -> DemoSummary {
        let printer = spawn_event_printer(&self.submitter);
        let interrupt = spawn_interrupt_handler(Arc::clone(&self.submitter));

        info!(lines = lines.len(), "Submitting cart lines");
        let submitter = &self.submitter;
        let results = join_all(lines.into_iter().map(|line| async move {
            let label = line.to_string();
            let result = submitter.submit(line).await;
            match &result {
                Ok(outcome) => {
                    info!(line = %label, outcome = outcome.as_str(), "Submission settled")
                }
                Err(e) => warn!(line = %label, error = %e, "Submission refused"),
            }
            result
        }))
        .await;

        interrupt.abort();
        let _ = interrupt.await;

        let mut summary = DemoSummary::default();
        for result in &results {
            summary.record(result);
        }

        match Metrics::gather_text() {
            Ok(text) => debug!(metrics = %text, "Final metrics"),
            Err(e) => warn!(error = %e, "Failed to gather metrics"),
        }

        // Closing the event channel lets the printer drain and exit.
        drop(self.submitter);
        let _ = printer.await;

        info!(
            completed = summary.completed,
            failed = summary.failed,
            canceled = summary.canceled,
            rejected = summary.rejected,
            "All submissions settled"
        );
        summary
    }
}

fn spawn_event_printer(submitter: &CartLineSubmitter) -> JoinHandle<Vec<CartEvent>> {
    let mut rx = submitter.subscribe();
    tokio::spawn(async move {
        let mut seen = Vec::new();
        loop {
            match rx.recv().await {
                Ok(event) => {
                    match serde_json::to_string(&event) {
                        Ok(json) => println!("{json}"),
                        Err(e) => warn!(error = %e, "Failed to encode cart event"),
                    }
                    seen.push(event);
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Event printer lagged behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
        seen
    })
}

fn spawn_interrupt_handler(submitter: Arc<CartLineSubmitter>) -> JoinHandle<()> {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                warn!(
                    pending = submitter.count(),
                    "Interrupt received, canceling pending submissions"
                );
                submitter.cancel_all();
            }
            Err(e) => warn!(error = %e, "Failed to listen for Ctrl-C"),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use commerce_cart::{MockCartTransport, TransportError};
    use rust_decimal_macros::dec;
    use std::time::Duration;
    use uuid::Uuid;

    fn line() -> AddCartLine {
        AddCartLine::new(Uuid::new_v4(), dec!(1))
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_counts_outcomes() {
        let mock = Arc::new(MockCartTransport::with_delay(Duration::from_millis(50)));
        let bad = line();
        mock.fail_product(bad.product_id, TransportError::Http("reset".to_string()));

        let app = DemoApp::with_transport(&DemoConfig::default(), mock.clone());
        let summary = app.run(vec![line(), line(), bad]).await;

        assert_eq!(
            summary,
            DemoSummary {
                completed: 2,
                failed: 1,
                canceled: 0,
                rejected: 0,
            }
        );
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_line_is_refused() {
        let mock = Arc::new(MockCartTransport::with_delay(Duration::from_millis(50)));
        let app = DemoApp::with_transport(&DemoConfig::default(), mock.clone());

        let dup = line();
        let summary = app.run(vec![dup.clone(), dup, line()]).await;

        assert_eq!(summary.completed, 2);
        assert_eq!(summary.rejected, 1);
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_all_during_run() {
        let mock = Arc::new(MockCartTransport::with_delay(Duration::from_secs(5)));
        let app = DemoApp::with_transport(&DemoConfig::default(), mock);
        let submitter = Arc::clone(app.submitter());

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            submitter.cancel_all();
        });
        let summary = app.run(vec![line(), line()]).await;
        canceller.await.unwrap();

        assert_eq!(summary.canceled, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_printer_sees_every_event() {
        let mock = Arc::new(MockCartTransport::with_delay(Duration::from_secs(1)));
        let app = DemoApp::with_transport(&DemoConfig::default(), mock);
        let printer = spawn_event_printer(app.submitter());

        let summary = app.run(vec![line(), line()]).await;
        assert_eq!(summary.completed, 2);

        let events = printer.await.unwrap();
        assert_eq!(
            events,
            vec![
                CartEvent::CountChanged { count: 1 },
                CartEvent::CountChanged { count: 2 },
                CartEvent::SlowStateChanged { is_slow: true },
                CartEvent::CountChanged { count: 1 },
                CartEvent::CountChanged { count: 0 },
                CartEvent::SlowStateChanged { is_slow: false },
            ]
        );
    }
}
