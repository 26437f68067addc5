//! Integration tests for commerce-client.
//!
//! These tests run the HTTP client against a local mock server:
//! - Request shape for single and batch adds
//! - Status and body mapping to transport errors
//! - Cancellation and submitter wiring

pub mod common;
