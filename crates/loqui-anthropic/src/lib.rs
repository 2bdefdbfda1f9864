// SPDX-FileCopyrightText: 2026 Loqui Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Anthropic Messages API provider adapter.
//!
//! Wraps the vendor HTTP protocol behind [`ProviderAdapter`]: conversation
//! history goes in, a normalized token stream (or a full reply) comes out,
//! and every vendor failure leaves as a categorized [`LlmServiceError`].

mod client;
mod map;
mod sse;
mod types;

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use loqui_config::AnthropicConfig;
use loqui_core::{
    ChatRole, ConversationTurn, ErrorCategory, LlmServiceError, ProviderAdapter, ProviderInfo,
    TokenStream,
};
use tracing::debug;

use crate::client::AnthropicClient;
use crate::sse::VendorEvent;
use crate::types::{ApiMessage, MessageRequest, ResponseContentBlock, SseDelta};

pub const PROVIDER_ID: &str = "anthropic";

/// Provider adapter for the Anthropic Messages API.
pub struct AnthropicProvider {
    client: AnthropicClient,
    max_tokens: u32,
}

impl AnthropicProvider {
    /// Builds the adapter from its config section and a resolved credential.
    ///
    /// Credential resolution happens in the registry so that an absent key
    /// disables the provider instead of failing construction.
    pub fn new(config: &AnthropicConfig, api_key: &str) -> Result<Self, LlmServiceError> {
        let client = AnthropicClient::new(
            api_key,
            &config.api_version,
            config.base_url.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )?;
        Ok(Self {
            client,
            max_tokens: config.max_tokens,
        })
    }

    fn build_request(&self, history: &[ConversationTurn], model: &str, stream: bool) -> MessageRequest {
        MessageRequest {
            model: model.to_string(),
            messages: history.iter().map(to_api_message).collect(),
            max_tokens: self.max_tokens,
            stream,
        }
    }
}

fn to_api_message(turn: &ConversationTurn) -> ApiMessage {
    let role = match turn.role {
        ChatRole::User => "user",
        ChatRole::Assistant => "assistant",
    };
    ApiMessage {
        role: role.to_string(),
        content: turn.text.clone(),
    }
}

#[async_trait]
impl ProviderAdapter for AnthropicProvider {
    fn describe(&self) -> ProviderInfo {
        ProviderInfo {
            id: PROVIDER_ID.to_string(),
            display_name: "Anthropic".to_string(),
        }
    }

    async fn invoke(
        &self,
        history: &[ConversationTurn],
        model: &str,
    ) -> Result<String, LlmServiceError> {
        let request = self.build_request(history, model, false);
        let response = self.client.complete_message(&request).await?;

        let text: String = response
            .content
            .iter()
            .map(|block| match block {
                ResponseContentBlock::Text { text } => text.as_str(),
            })
            .collect();

        debug!(model = %model, chars = text.len(), "completion finished");
        Ok(text)
    }

    async fn stream(
        &self,
        history: &[ConversationTurn],
        model: &str,
    ) -> Result<TokenStream, LlmServiceError> {
        let request = self.build_request(history, model, true);
        let events = self.client.stream_message(&request).await?;

        // Text deltas pass through in order; `message_stop` or an in-stream
        // error ends the token stream. Tool-input deltas and message-level
        // metadata carry no reply text and are dropped. The chained `None`
        // marks body exhaustion: reaching it before `message_stop` means the
        // vendor truncated the reply, which must not look like completion.
        let tokens = events
            .map(Some)
            .chain(futures::stream::once(futures::future::ready(None)))
            .scan(false, |done, item| {
                if *done {
                    return futures::future::ready(None);
                }
                let out = match item {
                    Some(Ok(VendorEvent::ContentBlockDelta(block))) => match block.delta {
                        SseDelta::TextDelta { text } => Some(Ok(text)),
                        SseDelta::InputJsonDelta { .. } => None,
                    },
                    Some(Ok(VendorEvent::MessageDelta(_))) => None,
                    Some(Ok(VendorEvent::MessageStop)) => {
                        *done = true;
                        None
                    }
                    Some(Ok(VendorEvent::Error(event))) => {
                        *done = true;
                        Some(Err(map::map_vendor_error_type(&event.error.type_)))
                    }
                    Some(Err(err)) => {
                        *done = true;
                        Some(Err(err))
                    }
                    None => {
                        *done = true;
                        Some(Err(LlmServiceError::new(ErrorCategory::Connection)))
                    }
                };
                futures::future::ready(Some(out))
            })
            .filter_map(futures::future::ready);

        Ok(Box::pin(tokens))
    }
}

// Re-exported so the gateway can map local pre-dispatch failures the same
// way adapter failures are mapped.
pub use map::{map_http_status, map_transport_error, map_vendor_error_type};
