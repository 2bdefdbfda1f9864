// SPDX-FileCopyrightText: 2026 Loqui Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI error mapping into the shared six-category taxonomy.

use loqui_core::{ErrorCategory, LlmServiceError};
use reqwest::StatusCode;

use crate::types::ApiErrorDetail;

/// Maps a reqwest transport failure (connect, timeout, body read).
pub fn map_transport_error(err: &reqwest::Error) -> LlmServiceError {
    let category = if err.is_timeout() {
        ErrorCategory::Timeout
    } else if err.is_connect() || err.is_request() || err.is_body() || err.is_decode() {
        ErrorCategory::Connection
    } else {
        ErrorCategory::Internal
    };
    LlmServiceError::new(category)
}

/// Maps a non-2xx HTTP status, with an optional Retry-After hint in seconds.
pub fn map_http_status(status: StatusCode, retry_after_secs: Option<u64>) -> LlmServiceError {
    let category = match status.as_u16() {
        401 | 403 => ErrorCategory::Authentication,
        429 => ErrorCategory::RateLimit,
        408 | 504 => ErrorCategory::Timeout,
        400 | 404 | 413 | 422 => ErrorCategory::InvalidRequest,
        _ => ErrorCategory::Internal,
    };

    let err = LlmServiceError::new(category);
    match (category, retry_after_secs) {
        (ErrorCategory::RateLimit, Some(secs)) => err.with_retry_after(secs),
        _ => err,
    }
}

/// Maps a vendor error body, refining the HTTP-status category where the
/// machine-readable fields are more specific.
///
/// `insufficient_quota` arrives with status 429 but is not transient, so it
/// stays `rate_limit` (the hint is simply absent); `context_length_exceeded`
/// arrives as a 400 and stays `invalid_request`.
pub fn map_vendor_error(status: StatusCode, detail: &ApiErrorDetail) -> LlmServiceError {
    let type_hint = detail.type_.as_deref().or(detail.code.as_deref());
    let category = match type_hint {
        Some("invalid_api_key") | Some("authentication_error") => ErrorCategory::Authentication,
        Some("rate_limit_exceeded") | Some("insufficient_quota") => ErrorCategory::RateLimit,
        Some("invalid_request_error") | Some("model_not_found")
        | Some("context_length_exceeded") => ErrorCategory::InvalidRequest,
        Some("server_error") => ErrorCategory::Internal,
        _ => return map_http_status(status, None),
    };
    LlmServiceError::new(category)
}
