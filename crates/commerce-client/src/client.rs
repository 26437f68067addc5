//! Cart endpoints of the commerce REST API.

use commerce_cart::{TransportError, TransportResult};
use commerce_core::{AddCartLine, CartLine, CartLineList, ErrorResponse, ServiceResponse};
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::urls;

/// Batch add request body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CartLineBatch<'a> {
    cart_lines: &'a [AddCartLine],
}

/// Client for the cart endpoints.
#[derive(Debug, Clone)]
pub struct CartClient {
    client: Client,
    base_url: Url,
}

impl CartClient {
    /// Create a new cart client.
    ///
    /// # Errors
    /// - `InvalidUrl` if `base_url` does not parse
    /// - `HttpClient` if the HTTP client cannot be built
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let base = format!("{}/", config.base_url.trim_end_matches('/'));
        let base_url =
            Url::parse(&base).map_err(|e| ClientError::InvalidUrl(format!("{base}: {e}")))?;

        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ClientError::HttpClient(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, base_url })
    }

    /// Absolute URL for an endpoint path.
    pub fn endpoint(&self, path: &str) -> ClientResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| ClientError::InvalidUrl(format!("{path}: {e}")))
    }

    /// Add one line to the current cart.
    ///
    /// # Errors
    /// - `Http` if the request could not be sent or timed out
    /// - `Rejected` if the backend answered with a non-success status
    /// - `Decode` if the created line could not be decoded
    pub async fn add_cart_line(&self, line: &AddCartLine) -> TransportResult<CartLine> {
        let url = self
            .endpoint(urls::CART_CURRENT_CART_LINES)
            .map_err(|e| TransportError::Http(e.to_string()))?;
        debug!(url = %url, line = %line, "Posting cart line");

        let response = self
            .client
            .post(url)
            .json(line)
            .send()
            .await
            .map_err(|e| TransportError::Http(format!("HTTP request failed: {e}")))?;

        Self::decode(response).await
    }

    /// Add several lines to the current cart in one request.
    ///
    /// Rejections are returned in the `ServiceResponse` rather than as errors.
    ///
    /// # Errors
    /// `Http` or `Decode` if the request could not be completed.
    pub async fn add_cart_lines(
        &self,
        lines: &[AddCartLine],
    ) -> TransportResult<ServiceResponse<CartLineList>> {
        let url = self
            .endpoint(urls::CART_CURRENT_CART_LINES_BATCH)
            .map_err(|e| TransportError::Http(e.to_string()))?;
        debug!(url = %url, lines = lines.len(), "Posting cart line batch");

        let response = self
            .client
            .post(url)
            .json(&CartLineBatch { cart_lines: lines })
            .send()
            .await
            .map_err(|e| TransportError::Http(format!("HTTP request failed: {e}")))?;

        let status = response.status().as_u16();
        match Self::decode::<CartLineList>(response).await {
            Ok(list) => Ok(ServiceResponse::ok(list, status)),
            Err(TransportError::Rejected { status, message }) => {
                Ok(ServiceResponse::failed(message, status))
            }
            Err(e) => Err(e),
        }
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> TransportResult<T> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Http(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            let message = error_message(status, &body);
            warn!(status = status.as_u16(), message = %message, "Cart request rejected");
            return Err(TransportError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| TransportError::Decode(e.to_string()))
    }
}

/// Message from an error body, falling back to the raw body or status text.
fn error_message(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(err) if !err.message.is_empty() => err.message,
        _ if !body.trim().is_empty() => body.trim().to_string(),
        _ => status
            .canonical_reason()
            .unwrap_or("Unknown status")
            .to_string(),
    }
}
