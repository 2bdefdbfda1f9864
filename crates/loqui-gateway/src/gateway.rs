// SPDX-FileCopyrightText: 2026 Loqui Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inference gateway core: validate, resolve, invoke, normalize.
//!
//! Every request flows through the same pipeline regardless of transport.
//! Streaming output is a normalized [`StreamEvent`] sequence ending in
//! exactly one terminal event; failures before the first token surface the
//! same way as failures mid-stream.

use std::pin::Pin;
use std::sync::Arc;

use futures::stream::{self, Stream, StreamExt};
use loqui_core::{ConversationTurn, ErrorCategory, LlmServiceError, StreamEvent};
use loqui_registry::ProviderRegistry;
use tracing::{info, warn};
use uuid::Uuid;

/// Normalized event stream produced by [`InferenceGateway::stream_chat`].
pub type EventStream = Pin<Box<dyn Stream<Item = StreamEvent> + Send>>;

/// A completed non-streaming reply.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ChatReply {
    pub reply: String,
    pub model: String,
}

/// Transport-independent inference pipeline.
pub struct InferenceGateway {
    registry: Arc<ProviderRegistry>,
}

impl InferenceGateway {
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Runs a non-streaming request through the pipeline.
    pub async fn invoke_chat(
        &self,
        history: &[ConversationTurn],
        model_id: Option<&str>,
    ) -> Result<ChatReply, LlmServiceError> {
        validate_history(history)?;
        let (descriptor, adapter) = self.registry.resolve(model_id)?;
        let request_id = Uuid::new_v4();

        info!(
            request_id = %request_id,
            model = %descriptor.id,
            provider = %descriptor.provider,
            turns = history.len(),
            "chat invocation"
        );

        let reply = adapter.invoke(history, &descriptor.id).await.map_err(|e| {
            warn!(request_id = %request_id, category = %e.category, "chat invocation failed");
            e
        })?;

        Ok(ChatReply {
            reply,
            model: descriptor.id.clone(),
        })
    }

    /// Runs a streaming request through the pipeline.
    ///
    /// The returned stream always ends with exactly one terminal event:
    /// `complete` after the provider finishes, or `error` as soon as
    /// anything fails. Pre-dispatch failures (validation, resolution, the
    /// initial provider request) produce a single-event error stream.
    pub async fn stream_chat(
        &self,
        history: Vec<ConversationTurn>,
        model_id: Option<&str>,
    ) -> EventStream {
        if let Err(e) = validate_history(&history) {
            return error_stream(&e);
        }

        let (descriptor, adapter) = match self.registry.resolve(model_id) {
            Ok(resolved) => resolved,
            Err(e) => return error_stream(&e),
        };
        let model = descriptor.id.clone();
        let request_id = Uuid::new_v4();

        info!(
            request_id = %request_id,
            model = %model,
            provider = %descriptor.provider,
            turns = history.len(),
            "chat stream opened"
        );

        let tokens = match adapter.stream(&history, &model).await {
            Ok(tokens) => tokens,
            Err(e) => {
                warn!(request_id = %request_id, category = %e.category, "chat stream failed to open");
                return error_stream(&e);
            }
        };

        // Token errors become a terminal error event; a normally exhausted
        // token stream gets the chained `complete`. The scan guard stops
        // the stream right after whichever terminal came first.
        let events = tokens
            .map(move |item| match item {
                Ok(content) => StreamEvent::Token { content },
                Err(e) => {
                    warn!(request_id = %request_id, category = %e.category, "chat stream failed");
                    StreamEvent::from(&e)
                }
            })
            .chain(stream::once(futures::future::ready(
                StreamEvent::Complete {
                    model: model.clone(),
                },
            )))
            .scan(false, |terminated, event| {
                if *terminated {
                    return futures::future::ready(None);
                }
                *terminated = event.is_terminal();
                futures::future::ready(Some(event))
            });

        Box::pin(events)
    }
}

/// Request validation shared by both entry points.
fn validate_history(history: &[ConversationTurn]) -> Result<(), LlmServiceError> {
    let valid = history
        .last()
        .is_some_and(|turn| !turn.text.trim().is_empty());
    if valid {
        Ok(())
    } else {
        Err(LlmServiceError::new(ErrorCategory::InvalidRequest))
    }
}

fn error_stream(err: &LlmServiceError) -> EventStream {
    Box::pin(stream::once(futures::future::ready(StreamEvent::from(
        err,
    ))))
}
