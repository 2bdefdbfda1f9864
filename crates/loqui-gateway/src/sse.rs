// SPDX-FileCopyrightText: 2026 Loqui Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SSE transport encoding for the normalized event stream.
//!
//! One event per frame: `data: {json}\n\n`. No event names, no ids, no
//! retry fields, so any SSE-capable client can consume the stream with a
//! plain line parser. The connection closes after the terminal frame.

use axum::body::Body;
use axum::http::header;
use axum::response::Response;
use futures::stream::{Stream, StreamExt};
use loqui_core::StreamEvent;

/// Encodes one event as an SSE frame.
///
/// Serialization of [`StreamEvent`] is infallible: the enum contains only
/// strings and a string-backed category.
pub fn encode_frame(event: &StreamEvent) -> String {
    // Unwrap justified by the doc comment above; a panic here would mean
    // the event type itself changed incompatibly.
    let json = serde_json::to_string(event).expect("StreamEvent serialization cannot fail");
    format!("data: {json}\n\n")
}

/// Wraps a normalized event stream in an SSE response body.
///
/// The body ends when the stream ends; the gateway core guarantees the
/// stream ends right after its terminal event, which closes the connection.
pub fn sse_response(events: impl Stream<Item = StreamEvent> + Send + 'static) -> Response {
    let frames = events.map(|event| Ok::<_, std::convert::Infallible>(encode_frame(&event)));

    Response::builder()
        .header(header::CONTENT_TYPE, "text/event-stream")
        .header(header::CACHE_CONTROL, "no-cache")
        .body(Body::from_stream(frames))
        .expect("static response parts are valid")
}

#[cfg(test)]
mod tests {
    use super::*;
    use loqui_core::{ErrorCategory, LlmServiceError};

    #[test]
    fn token_frame_shape() {
        let frame = encode_frame(&StreamEvent::Token {
            content: "Hel".to_string(),
        });
        assert_eq!(frame, "data: {\"type\":\"token\",\"content\":\"Hel\"}\n\n");
    }

    #[test]
    fn complete_frame_shape() {
        let frame = encode_frame(&StreamEvent::Complete {
            model: "gpt-4o".to_string(),
        });
        assert_eq!(frame, "data: {\"type\":\"complete\",\"model\":\"gpt-4o\"}\n\n");
    }

    #[test]
    fn error_frame_uses_error_and_code_keys() {
        let frame = encode_frame(&StreamEvent::from(&LlmServiceError::new(
            ErrorCategory::Timeout,
        )));
        assert!(frame.starts_with("data: {\"type\":\"error\",\"error\":"));
        assert!(frame.ends_with("\"code\":\"timeout\"}\n\n"));
    }

    #[test]
    fn frame_contains_no_interior_blank_line() {
        // JSON strings escape newlines, so the only blank line is the frame
        // delimiter at the end.
        let frame = encode_frame(&StreamEvent::Token {
            content: "line one\nline two".to_string(),
        });
        assert_eq!(frame.matches("\n\n").count(), 1);
        assert!(frame.ends_with("\n\n"));
    }
}
