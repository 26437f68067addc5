//! `CartTransport` over HTTP.

use commerce_cart::{BoxFuture, CancelSignal, CartTransport, TransportError, TransportResult};
use commerce_core::{AddCartLine, CartLine};
use tracing::debug;

use crate::client::CartClient;

impl CartTransport for CartClient {
    /// Post the line, abandoning the request if `cancel` fires first.
    fn add_cart_line(
        &self,
        line: AddCartLine,
        cancel: CancelSignal,
    ) -> BoxFuture<'_, TransportResult<CartLine>> {
        Box::pin(async move {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(epoch = cancel.epoch(), line = %line, "Cart line request canceled");
                    Err(TransportError::Canceled)
                }
                result = CartClient::add_cart_line(self, &line) => result,
            }
        })
    }
}
