// SPDX-FileCopyrightText: 2026 Loqui Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Loqui streaming chat pipeline.
//!
//! Provides the shared data model ([`ConversationTurn`], [`StreamEvent`],
//! [`ModelDescriptor`]), the unified error taxonomy ([`LlmServiceError`]),
//! and the [`ProviderAdapter`] trait every vendor integration implements.

pub mod error;
pub mod provider;
pub mod types;

pub use error::{ErrorCategory, LlmServiceError};
pub use provider::{ProviderAdapter, TokenStream};
pub use types::{ChatRole, ConversationTurn, ModelDescriptor, ProviderInfo, StreamEvent};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_category_has_six_variants() {
        let variants = [
            ErrorCategory::Authentication,
            ErrorCategory::RateLimit,
            ErrorCategory::Connection,
            ErrorCategory::Timeout,
            ErrorCategory::InvalidRequest,
            ErrorCategory::Internal,
        ];
        assert_eq!(variants.len(), 6, "taxonomy must have exactly 6 categories");
    }

    #[test]
    fn provider_adapter_is_object_safe() {
        fn _assert(_: &dyn ProviderAdapter) {}
    }
}
