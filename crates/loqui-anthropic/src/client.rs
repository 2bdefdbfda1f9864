// SPDX-FileCopyrightText: 2026 Loqui Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Anthropic Messages API.
//!
//! One attempt per request; retry policy belongs to callers of the gateway,
//! not to this adapter. All failures leave this module as [`LlmServiceError`].

use std::pin::Pin;
use std::time::Duration;

use futures::Stream;
use loqui_core::{ErrorCategory, LlmServiceError};
use reqwest::header::{HeaderMap, HeaderValue, RETRY_AFTER};
use tracing::{debug, warn};

use crate::map;
use crate::sse::{self, VendorEvent};
use crate::types::{ApiErrorResponse, MessageRequest, MessageResponse};

/// HTTP client for Anthropic API communication.
#[derive(Debug, Clone)]
pub struct AnthropicClient {
    client: reqwest::Client,
    base_url: String,
}

impl AnthropicClient {
    /// Creates a new Anthropic API client.
    pub fn new(
        api_key: &str,
        api_version: &str,
        base_url: String,
        request_timeout: Duration,
    ) -> Result<Self, LlmServiceError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(api_key)
                .map_err(|_| LlmServiceError::new(ErrorCategory::Authentication))?,
        );
        headers.insert(
            "anthropic-version",
            HeaderValue::from_str(api_version)
                .map_err(|_| LlmServiceError::new(ErrorCategory::Internal))?,
        );
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(request_timeout)
            .build()
            .map_err(|_| LlmServiceError::new(ErrorCategory::Internal))?;

        Ok(Self { client, base_url })
    }

    /// Sends a streaming request and returns a stream of vendor SSE events.
    pub async fn stream_message(
        &self,
        request: &MessageRequest,
    ) -> Result<Pin<Box<dyn Stream<Item = Result<VendorEvent, LlmServiceError>> + Send>>, LlmServiceError>
    {
        let mut req = request.clone();
        req.stream = true;

        let response = self
            .client
            .post(&self.base_url)
            .json(&req)
            .send()
            .await
            .map_err(|e| map::map_transport_error(&e))?;

        let status = response.status();
        debug!(status = %status, model = %req.model, "streaming response received");

        if status.is_success() {
            return Ok(sse::parse_sse_stream(response));
        }

        Err(read_error_response(response).await)
    }

    /// Sends a non-streaming request and returns the full response.
    pub async fn complete_message(
        &self,
        request: &MessageRequest,
    ) -> Result<MessageResponse, LlmServiceError> {
        let mut req = request.clone();
        req.stream = false;

        let response = self
            .client
            .post(&self.base_url)
            .json(&req)
            .send()
            .await
            .map_err(|e| map::map_transport_error(&e))?;

        let status = response.status();
        debug!(status = %status, model = %req.model, "completion response received");

        if !status.is_success() {
            return Err(read_error_response(response).await);
        }

        response
            .json::<MessageResponse>()
            .await
            .map_err(|e| map::map_transport_error(&e))
    }
}

/// Consumes a non-2xx response and maps it into the shared taxonomy.
///
/// Prefers the vendor's machine-readable error type when the body parses;
/// falls back to the HTTP status. The vendor's prose stays in the logs.
async fn read_error_response(response: reqwest::Response) -> LlmServiceError {
    let status = response.status();
    let retry_after = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());

    let body = response.text().await.unwrap_or_default();
    if let Ok(api_err) = serde_json::from_str::<ApiErrorResponse>(&body) {
        warn!(
            status = %status,
            vendor_type = %api_err.error.type_,
            vendor_message = %api_err.error.message,
            "Anthropic API error"
        );
        let err = map::map_vendor_error_type(&api_err.error.type_);
        return match retry_after {
            Some(secs) if err.category == ErrorCategory::RateLimit => err.with_retry_after(secs),
            _ => err,
        };
    }

    warn!(status = %status, "Anthropic API error with unparseable body");
    map::map_http_status(status, retry_after)
}
