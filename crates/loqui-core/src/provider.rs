// SPDX-FileCopyrightText: 2026 Loqui Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider adapter trait for LLM backend integrations.

use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;

use crate::error::LlmServiceError;
use crate::types::{ConversationTurn, ProviderInfo};

/// A stream of reply fragments from a provider backend.
///
/// `Ok` end-of-stream means the reply completed normally. An `Err` item is
/// terminal: the adapter yields nothing after it.
pub type TokenStream = Pin<Box<dyn TokenStreamInner>>;

/// Object-safe alias trait for the streams carried by [`TokenStream`].
///
/// Blanket-implemented for every qualifying stream; exists so the boxed
/// trait object has a local principal trait and can implement `Debug`.
pub trait TokenStreamInner: Stream<Item = Result<String, LlmServiceError>> + Send {}

impl<S> TokenStreamInner for S where S: Stream<Item = Result<String, LlmServiceError>> + Send + ?Sized
{}

impl std::fmt::Debug for dyn TokenStreamInner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("TokenStream")
    }
}

/// Adapter wrapping exactly one upstream model backend.
///
/// Implementations normalize chat-completion invocation and map every
/// exception type their vendor SDK can raise into [`LlmServiceError`] before
/// it crosses this boundary. Adapters hold no per-request state; vendor
/// configuration differences (auth headers, timeout units, stream grammar)
/// are absorbed inside the implementation.
#[async_trait]
pub trait ProviderAdapter: Send + Sync + 'static {
    /// Identifies this provider for registry bookkeeping and listings.
    fn describe(&self) -> ProviderInfo;

    /// Sends the full history and returns the complete reply text.
    async fn invoke(
        &self,
        history: &[ConversationTurn],
        model: &str,
    ) -> Result<String, LlmServiceError>;

    /// Sends the full history and returns reply fragments incrementally.
    async fn stream(
        &self,
        history: &[ConversationTurn],
        model: &str,
    ) -> Result<TokenStream, LlmServiceError>;
}

impl std::fmt::Debug for dyn ProviderAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderAdapter")
            .field("id", &self.describe().id)
            .finish_non_exhaustive()
    }
}
