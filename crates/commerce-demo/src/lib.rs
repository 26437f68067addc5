//! Cart submission demo.
//!
//! Wires `CartLineSubmitter` to the HTTP `CartClient`, prints cart events as
//! they happen and cancels outstanding submissions on Ctrl-C.

pub mod app;
pub mod config;
pub mod error;

pub use app::{DemoApp, DemoSummary};
pub use config::DemoConfig;
pub use error::{DemoError, DemoResult};
