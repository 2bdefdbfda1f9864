// SPDX-FileCopyrightText: 2026 Loqui Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Unified error taxonomy for LLM backend failures.
//!
//! Every vendor exception is mapped into one of six [`ErrorCategory`] values
//! at the adapter boundary. Messages are fixed, user-safe strings; raw vendor
//! payloads, API keys, and backend identifiers never appear in them.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

/// The six normalized failure categories shared by all provider adapters.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorCategory {
    /// Credentials missing, expired, or rejected by the vendor.
    Authentication,
    /// The vendor is throttling requests.
    RateLimit,
    /// Network-level failure reaching the vendor, or a dropped stream.
    Connection,
    /// The vendor (or a client guard timer) gave up waiting.
    Timeout,
    /// The request itself was malformed or referenced an unknown model.
    InvalidRequest,
    /// Anything that does not fit the other five categories.
    Internal,
}

impl ErrorCategory {
    /// The fixed, user-safe message for this category.
    pub fn user_message(self) -> &'static str {
        match self {
            ErrorCategory::Authentication => {
                "The model backend rejected the configured credentials."
            }
            ErrorCategory::RateLimit => {
                "The model backend is rate limiting requests. Try again shortly."
            }
            ErrorCategory::Connection => "The connection to the model backend was lost.",
            ErrorCategory::Timeout => "The model backend took too long to respond.",
            ErrorCategory::InvalidRequest => "The request was rejected as invalid.",
            ErrorCategory::Internal => {
                "An internal error occurred while generating the reply."
            }
        }
    }
}

/// Unified LLM service error carried across the gateway boundary.
///
/// Adapters construct these via [`LlmServiceError::new`]; the message is
/// always the category's fixed user-safe string, so mapping the same vendor
/// failure twice yields an identical error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{category}: {message}")]
pub struct LlmServiceError {
    /// Normalized failure category.
    pub category: ErrorCategory,
    /// Fixed, user-safe description.
    pub message: String,
    /// Vendor-suggested retry delay, when one was advertised.
    pub retry_after_secs: Option<u64>,
}

impl LlmServiceError {
    /// Creates an error with the category's canonical user-safe message.
    pub fn new(category: ErrorCategory) -> Self {
        Self {
            category,
            message: category.user_message().to_string(),
            retry_after_secs: None,
        }
    }

    /// Attaches a vendor-advertised retry delay hint.
    pub fn with_retry_after(mut self, secs: u64) -> Self {
        self.retry_after_secs = Some(secs);
        self
    }
}
