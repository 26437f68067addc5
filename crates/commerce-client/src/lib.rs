//! HTTP client for the commerce REST API.
//!
//! Provides [`CartClient`], which posts cart lines to the current cart and
//! implements [`commerce_cart::CartTransport`] so it can back a
//! `CartLineSubmitter`.

pub mod client;
pub mod config;
pub mod error;
pub mod transport;
pub mod urls;

pub use client::CartClient;
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
