//! Core domain types for the commerce cart SDK.
//!
//! This crate provides the payloads exchanged with the commerce backend:
//! - `AddCartLine`: Request to add a product line to the current cart
//! - `CartLine`, `CartLineList`: Lines as returned by the backend
//! - `ServiceResponse`: Model-or-error envelope used by write endpoints

pub mod cart;
pub mod error;
pub mod response;

pub use cart::{AddCartLine, CartLine, CartLineList};
pub use error::{CoreError, Result};
pub use response::{ErrorResponse, ServiceResponse};
