// SPDX-FileCopyrightText: 2026 Loqui Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI-compatible chat-completions provider adapter.
//!
//! Works against the hosted API and any backend speaking the same protocol;
//! the endpoint URL comes from configuration.

mod client;
mod map;
mod sse;
mod types;

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use loqui_config::OpenAiConfig;
use loqui_core::{
    ChatRole, ConversationTurn, ErrorCategory, LlmServiceError, ProviderAdapter, ProviderInfo,
    TokenStream,
};
use tracing::debug;

use crate::client::OpenAiClient;
use crate::sse::VendorEvent;
use crate::types::{ChatCompletionRequest, ChatMessage};

pub const PROVIDER_ID: &str = "openai";

/// Provider adapter for OpenAI-compatible chat-completions backends.
pub struct OpenAiProvider {
    client: OpenAiClient,
    max_tokens: u32,
}

impl OpenAiProvider {
    /// Builds the adapter from its config section and a resolved credential.
    pub fn new(config: &OpenAiConfig, api_key: &str) -> Result<Self, LlmServiceError> {
        let client = OpenAiClient::new(
            api_key,
            config.base_url.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )?;
        Ok(Self {
            client,
            max_tokens: config.max_tokens,
        })
    }

    fn build_request(
        &self,
        history: &[ConversationTurn],
        model: &str,
        stream: bool,
    ) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: model.to_string(),
            messages: history.iter().map(to_chat_message).collect(),
            max_tokens: self.max_tokens,
            stream,
        }
    }
}

fn to_chat_message(turn: &ConversationTurn) -> ChatMessage {
    let role = match turn.role {
        ChatRole::User => "user",
        ChatRole::Assistant => "assistant",
    };
    ChatMessage {
        role: role.to_string(),
        content: turn.text.clone(),
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiProvider {
    fn describe(&self) -> ProviderInfo {
        ProviderInfo {
            id: PROVIDER_ID.to_string(),
            display_name: "OpenAI".to_string(),
        }
    }

    async fn invoke(
        &self,
        history: &[ConversationTurn],
        model: &str,
    ) -> Result<String, LlmServiceError> {
        let request = self.build_request(history, model, false);
        let response = self.client.complete(&request).await?;

        let text = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .unwrap_or_default();

        debug!(model = %model, chars = text.len(), "completion finished");
        Ok(text)
    }

    async fn stream(
        &self,
        history: &[ConversationTurn],
        model: &str,
    ) -> Result<TokenStream, LlmServiceError> {
        let request = self.build_request(history, model, true);
        let events = self.client.stream_completion(&request).await?;

        // Content deltas pass through in order; `[DONE]` (or a transport
        // error) ends the token stream. Role-only and empty deltas are
        // dropped. The chained `None` marks body exhaustion: reaching it
        // before `[DONE]` means the vendor truncated the reply, which must
        // not look like completion.
        let tokens = events
            .map(Some)
            .chain(futures::stream::once(futures::future::ready(None)))
            .scan(false, |done, item| {
                if *done {
                    return futures::future::ready(None);
                }
                let out = match item {
                    Some(Ok(VendorEvent::Chunk(chunk))) => chunk
                        .choices
                        .into_iter()
                        .next()
                        .and_then(|choice| choice.delta.content)
                        .filter(|content| !content.is_empty())
                        .map(Ok),
                    Some(Ok(VendorEvent::Done)) => {
                        *done = true;
                        None
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

pub use map::{map_http_status, map_transport_error, map_vendor_error};

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider_for(server: &MockServer) -> OpenAiProvider {
        let config = OpenAiConfig {
            base_url: server.uri(),
            request_timeout_secs: 5,
            ..Default::default()
        };
        OpenAiProvider::new(&config, "sk-test").unwrap()
    }

    #[tokio::test]
    async fn describe_reports_provider_identity() {
        let server = MockServer::start().await;
        let provider = provider_for(&server);
        let info = provider.describe();
        assert_eq!(info.id, "openai");
    }

    #[tokio::test]
    async fn invoke_returns_first_choice_content() {
        let server = MockServer::start().await;
        let body = serde_json::json!({
            "id": "chatcmpl-1",
            "model": "gpt-4o",
            "choices": [{
                "message": {"role": "assistant", "content": "Hello!"},
                "finish_reason": "stop"
            }]
        });
        Mock::given(method("POST"))
            .and(path("/"))
            .and(body_partial_json(serde_json::json!({"stream": false})))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let history = vec![ConversationTurn::user("Hi")];
        let reply = provider.invoke(&history, "gpt-4o").await.unwrap();
        assert_eq!(reply, "Hello!");
    }

    #[tokio::test]
    async fn stream_yields_tokens_and_ends_on_done() {
        let server = MockServer::start().await;
        let sse = concat!(
            "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"},\"finish_reason\":null}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"},\"finish_reason\":null}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"lo\"},\"finish_reason\":null}]}\n\n",
            "data: {\"choices\":[{\"delta\":{},\"finish_reason\":\"stop\"}]}\n\n",
            "data: [DONE]\n\n",
        );
        Mock::given(method("POST"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(sse),
            )
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let history = vec![ConversationTurn::user("Hi")];
        let mut stream = provider.stream(&history, "gpt-4o").await.unwrap();

        assert_eq!(stream.next().await.unwrap().unwrap(), "Hel");
        assert_eq!(stream.next().await.unwrap().unwrap(), "lo");
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn truncated_stream_without_done_is_a_connection_error() {
        let server = MockServer::start().await;
        // Body ends after one delta; no `[DONE]` sentinel was sent.
        let sse = "data: {\"choices\":[{\"delta\":{\"content\":\"par\"},\"finish_reason\":null}]}\n\n";
        Mock::given(method("POST"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(sse),
            )
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let history = vec![ConversationTurn::user("Hi")];
        let mut stream = provider.stream(&history, "gpt-4o").await.unwrap();

        assert_eq!(stream.next().await.unwrap().unwrap(), "par");
        let err = stream.next().await.unwrap().unwrap_err();
        assert_eq!(err.category, ErrorCategory::Connection);
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn stream_request_failure_surfaces_before_any_token() {
        let server = MockServer::start().await;
        let body = serde_json::json!({
            "error": {
                "message": "The model `nope` does not exist",
                "type": "invalid_request_error",
                "code": "model_not_found"
            }
        });
        Mock::given(method("POST"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(404).set_body_json(&body))
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let history = vec![ConversationTurn::user("Hi")];
        let err = provider.stream(&history, "nope").await.unwrap_err();
        assert_eq!(err.category, ErrorCategory::InvalidRequest);
    }
}
