// SPDX-FileCopyrightText: 2026 Loqui Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SSE stream parser for chat-completions streaming responses.
//!
//! The protocol sends unnamed `data:` events carrying JSON chunks and a
//! final `data: [DONE]` sentinel instead of a typed stop event.

use std::pin::Pin;

use eventsource_stream::{EventStreamError, Eventsource};
use futures::stream::{Stream, StreamExt};
use loqui_core::{ErrorCategory, LlmServiceError};

use crate::map;
use crate::types::ChatCompletionChunk;

/// One parsed item from the vendor stream.
#[derive(Debug, Clone)]
pub enum VendorEvent {
    /// A completion chunk with zero or more delta choices.
    Chunk(ChatCompletionChunk),
    /// The `[DONE]` sentinel; no further chunks follow.
    Done,
}

/// Parses a reqwest streaming response into [`VendorEvent`]s.
///
/// Chunks that fail to parse surface as `internal` errors rather than
/// aborting the stream.
pub fn parse_sse_stream(
    response: reqwest::Response,
) -> Pin<Box<dyn Stream<Item = Result<VendorEvent, LlmServiceError>> + Send>> {
    let event_stream = response.bytes_stream().eventsource();

    let mapped = event_stream.map(|result| match result {
        Ok(event) => {
            if event.data.trim() == "[DONE]" {
                return Ok(VendorEvent::Done);
            }
            serde_json::from_str::<ChatCompletionChunk>(&event.data)
                .map(VendorEvent::Chunk)
                .map_err(|_| LlmServiceError::new(ErrorCategory::Internal))
        }
        Err(EventStreamError::Transport(e)) => Err(map::map_transport_error(&e)),
        Err(_) => Err(LlmServiceError::new(ErrorCategory::Internal)),
    });

    Box::pin(mapped)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn mock_sse_response(sse_text: &str) -> reqwest::Response {
        use wiremock::matchers::method;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(sse_text.to_string()),
            )
            .mount(&server)
            .await;

        reqwest::get(&server.uri()).await.unwrap()
    }

    #[tokio::test]
    async fn parses_chunks_then_done() {
        let sse = concat!(
            "data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"},\"finish_reason\":null}]}\n\n",
            "data: {\"choices\":[{\"delta\":{},\"finish_reason\":\"stop\"}]}\n\n",
            "data: [DONE]\n\n",
        );
        let mut stream = parse_sse_stream(mock_sse_response(sse).await);

        match stream.next().await.unwrap().unwrap() {
            VendorEvent::Chunk(chunk) => {
                assert_eq!(chunk.choices[0].delta.content.as_deref(), Some("Hi"));
            }
            other => panic!("expected Chunk, got {other:?}"),
        }
        match stream.next().await.unwrap().unwrap() {
            VendorEvent::Chunk(chunk) => {
                assert_eq!(chunk.choices[0].finish_reason.as_deref(), Some("stop"));
            }
            other => panic!("expected Chunk, got {other:?}"),
        }
        assert!(matches!(
            stream.next().await.unwrap().unwrap(),
            VendorEvent::Done
        ));
    }

    #[tokio::test]
    async fn malformed_chunk_yields_internal_error() {
        let sse = "data: {not json}\n\n";
        let mut stream = parse_sse_stream(mock_sse_response(sse).await);
        let err = stream.next().await.unwrap().unwrap_err();
        assert_eq!(err.category, ErrorCategory::Internal);
    }
}
