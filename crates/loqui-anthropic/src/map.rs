// SPDX-FileCopyrightText: 2026 Loqui Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Anthropic error mapping into the shared six-category taxonomy.
//!
//! Every failure class the vendor SDK surface can produce — transport
//! errors, HTTP statuses, and in-stream `error` events — is mapped here.
//! Unrecognized conditions fall through to `internal`; vendor prose never
//! leaves the adapter.

use loqui_core::{ErrorCategory, LlmServiceError};
use reqwest::StatusCode;

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
        // 529 is Anthropic's "overloaded" status; treated as throttling.
        429 | 529 => ErrorCategory::RateLimit,
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

/// Maps the `type` field of an in-stream `error` event or error body.
pub fn map_vendor_error_type(type_: &str) -> LlmServiceError {
    let category = match type_ {
        "authentication_error" | "permission_error" => ErrorCategory::Authentication,
        "rate_limit_error" | "overloaded_error" => ErrorCategory::RateLimit,
        "invalid_request_error" | "not_found_error" => ErrorCategory::InvalidRequest,
        "timeout_error" => ErrorCategory::Timeout,
        _ => ErrorCategory::Internal,
    };
    LlmServiceError::new(category)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_covers_taxonomy() {
        assert_eq!(
            map_http_status(StatusCode::UNAUTHORIZED, None).category,
            ErrorCategory::Authentication
        );
        assert_eq!(
            map_http_status(StatusCode::TOO_MANY_REQUESTS, None).category,
            ErrorCategory::RateLimit
        );
        assert_eq!(
            map_http_status(StatusCode::BAD_REQUEST, None).category,
            ErrorCategory::InvalidRequest
        );
        assert_eq!(
            map_http_status(StatusCode::GATEWAY_TIMEOUT, None).category,
            ErrorCategory::Timeout
        );
        assert_eq!(
            map_http_status(StatusCode::INTERNAL_SERVER_ERROR, None).category,
            ErrorCategory::Internal
        );
    }

    #[test]
    fn overloaded_status_maps_to_rate_limit() {
        let status = StatusCode::from_u16(529).unwrap();
        assert_eq!(map_http_status(status, None).category, ErrorCategory::RateLimit);
    }

    #[test]
    fn retry_after_only_attaches_to_rate_limit() {
        let limited = map_http_status(StatusCode::TOO_MANY_REQUESTS, Some(12));
        assert_eq!(limited.retry_after_secs, Some(12));

        let auth = map_http_status(StatusCode::UNAUTHORIZED, Some(12));
        assert_eq!(auth.retry_after_secs, None);
    }

    #[test]
    fn vendor_error_types_map() {
        assert_eq!(
            map_vendor_error_type("authentication_error").category,
            ErrorCategory::Authentication
        );
        assert_eq!(
            map_vendor_error_type("overloaded_error").category,
            ErrorCategory::RateLimit
        );
        assert_eq!(
            map_vendor_error_type("invalid_request_error").category,
            ErrorCategory::InvalidRequest
        );
    }

    #[test]
    fn unknown_vendor_type_defaults_to_internal() {
        let err = map_vendor_error_type("brand_new_error_kind");
        assert_eq!(err.category, ErrorCategory::Internal);
        assert_eq!(err.message, ErrorCategory::Internal.user_message());
    }

    #[test]
    fn mapping_is_idempotent() {
        let first = map_vendor_error_type("rate_limit_error");
        let second = map_vendor_error_type("rate_limit_error");
        assert_eq!(first, second);

        let status = StatusCode::from_u16(503).unwrap();
        assert_eq!(map_http_status(status, None), map_http_status(status, None));
    }
}
