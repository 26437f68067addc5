//! Endpoint paths, relative to the API base URL.

/// Lines of the current cart.
pub const CART_CURRENT_CART_LINES: &str = "api/v1/carts/current/cartlines";

/// Batch add to the current cart.
pub const CART_CURRENT_CART_LINES_BATCH: &str = "api/v1/carts/current/cartlines/batch";
