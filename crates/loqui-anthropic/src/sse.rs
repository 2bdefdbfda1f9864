// SPDX-FileCopyrightText: 2026 Loqui Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SSE stream parser for Anthropic Messages API streaming responses.
//!
//! Converts a reqwest response byte stream into typed [`VendorEvent`]s using
//! the `eventsource-stream` crate for SSE protocol compliance.

use std::pin::Pin;

use eventsource_stream::{Eventsource, EventStreamError};
use futures::stream::{Stream, StreamExt};
use loqui_core::{ErrorCategory, LlmServiceError};

use crate::map;
use crate::types::{SseContentBlockDelta, SseError, SseMessageDelta};

/// Typed SSE events from the Anthropic streaming protocol, reduced to the
/// variants this pipeline consumes.
#[derive(Debug, Clone)]
pub enum VendorEvent {
    /// Incremental update to a content block.
    ContentBlockDelta(SseContentBlockDelta),
    /// Message-level delta (stop_reason update).
    MessageDelta(SseMessageDelta),
    /// The message is complete.
    MessageStop,
    /// API error during streaming.
    Error(SseError),
}

/// Parses a reqwest streaming response into a stream of typed [`VendorEvent`]s.
///
/// Event payloads that fail to parse surface as `internal` errors rather than
/// aborting the stream. Event types with no bearing on reply text
/// (`message_start`, `content_block_start`, `ping`, unknown future types) are
/// skipped, per Anthropic's API versioning policy.
pub fn parse_sse_stream(
    response: reqwest::Response,
) -> Pin<Box<dyn Stream<Item = Result<VendorEvent, LlmServiceError>> + Send>> {
    let event_stream = response.bytes_stream().eventsource();

    let mapped = event_stream.filter_map(|result| async move {
        match result {
            Ok(event) => match event.event.as_str() {
                "content_block_delta" => Some(
                    serde_json::from_str::<SseContentBlockDelta>(&event.data)
                        .map(VendorEvent::ContentBlockDelta)
                        .map_err(|_| LlmServiceError::new(ErrorCategory::Internal)),
                ),
                "message_delta" => Some(
                    serde_json::from_str::<SseMessageDelta>(&event.data)
                        .map(VendorEvent::MessageDelta)
                        .map_err(|_| LlmServiceError::new(ErrorCategory::Internal)),
                ),
                "message_stop" => Some(Ok(VendorEvent::MessageStop)),
                "error" => Some(
                    serde_json::from_str::<SseError>(&event.data)
                        .map(VendorEvent::Error)
                        .map_err(|_| LlmServiceError::new(ErrorCategory::Internal)),
                ),
                _ => None,
            },
            Err(EventStreamError::Transport(e)) => Some(Err(map::map_transport_error(&e))),
            Err(_) => Some(Err(LlmServiceError::new(ErrorCategory::Internal))),
        }
    });

    Box::pin(mapped)
}
