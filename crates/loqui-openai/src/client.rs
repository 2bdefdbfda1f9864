// SPDX-FileCopyrightText: 2026 Loqui Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for OpenAI-compatible chat-completions endpoints.
//!
//! One attempt per request; all failures leave this module as
//! [`LlmServiceError`].

use std::pin::Pin;
use std::time::Duration;

use futures::Stream;
use loqui_core::{ErrorCategory, LlmServiceError};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, RETRY_AFTER};
use tracing::{debug, warn};

use crate::map;
use crate::sse::{self, VendorEvent};
use crate::types::{ApiErrorResponse, ChatCompletionRequest, ChatCompletionResponse};

/// HTTP client for chat-completions API communication.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    base_url: String,
}

impl OpenAiClient {
    /// Creates a new chat-completions client with Bearer authentication.
    pub fn new(
        api_key: &str,
        base_url: String,
        request_timeout: Duration,
    ) -> Result<Self, LlmServiceError> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|_| LlmServiceError::new(ErrorCategory::Authentication))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(request_timeout)
            .build()
            .map_err(|_| LlmServiceError::new(ErrorCategory::Internal))?;

        Ok(Self { client, base_url })
    }

    /// Sends a streaming request and returns a stream of vendor events.
    pub async fn stream_completion(
        &self,
        request: &ChatCompletionRequest,
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
    pub async fn complete(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, LlmServiceError> {
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
            .json::<ChatCompletionResponse>()
            .await
            .map_err(|e| map::map_transport_error(&e))
    }
}

/// Consumes a non-2xx response and maps it into the shared taxonomy.
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
            vendor_type = api_err.error.type_.as_deref().unwrap_or("-"),
            vendor_message = %api_err.error.message,
            "OpenAI API error"
        );
        let err = map::map_vendor_error(status, &api_err.error);
        return match retry_after {
            Some(secs) if err.category == ErrorCategory::RateLimit => err.with_retry_after(secs),
            _ => err,
        };
    }

    warn!(status = %status, "OpenAI API error with unparseable body");
    map::map_http_status(status, retry_after)
}
