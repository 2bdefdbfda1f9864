// SPDX-FileCopyrightText: 2026 Loqui Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Buffered decoder for the gateway's SSE frame format.
//!
//! Network reads deliver arbitrary byte chunks: a frame may arrive split
//! across reads or several frames may arrive in one. The decoder buffers
//! bytes until a full `\n\n`-delimited frame is available, then parses the
//! `data:` payload as a [`StreamEvent`].

use loqui_core::{ErrorCategory, LlmServiceError, StreamEvent};

/// Incremental frame decoder. Feed it raw bytes as they arrive; it yields
/// zero or more events per chunk.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
    terminal_seen: bool,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once a `complete` or `error` event has been decoded.
    pub fn terminal_seen(&self) -> bool {
        self.terminal_seen
    }

    /// Consumes one network read. Returns every event completed by it, in
    /// order. A malformed frame yields an `internal` error item but decoding
    /// continues with the next frame.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Result<StreamEvent, LlmServiceError>> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(pos) = find_frame_end(&self.buffer) {
            let frame: Vec<u8> = self.buffer.drain(..pos + 2).collect();
            if let Some(result) = self.decode_frame(&frame[..pos]) {
                events.push(result);
            }
        }
        events
    }

    /// Call when the connection closes. A close before the terminal event
    /// is a dropped stream, whether or not a partial frame was buffered.
    pub fn finish(&self) -> Result<(), LlmServiceError> {
        if self.terminal_seen {
            Ok(())
        } else {
            Err(LlmServiceError::new(ErrorCategory::Connection))
        }
    }

    fn decode_frame(&mut self, frame: &[u8]) -> Option<Result<StreamEvent, LlmServiceError>> {
        let text = match std::str::from_utf8(frame) {
            Ok(text) => text,
            Err(_) => return Some(Err(LlmServiceError::new(ErrorCategory::Internal))),
        };

        // Per the SSE grammar a frame may carry several fields; the gateway
        // only ever sends one `data:` line, but comments and unknown fields
        // from a proxy must not break us.
        let mut payload: Option<&str> = None;
        for line in text.lines() {
            let line = line.strip_suffix('\r').unwrap_or(line);
            if let Some(rest) = line.strip_prefix("data:") {
                payload = Some(rest.strip_prefix(' ').unwrap_or(rest));
            }
        }
        let payload = payload?;

        match serde_json::from_str::<StreamEvent>(payload) {
            Ok(event) => {
                if event.is_terminal() {
                    self.terminal_seen = true;
                }
                Some(Ok(event))
            }
            Err(_) => Some(Err(LlmServiceError::new(ErrorCategory::Internal))),
        }
    }
}

fn find_frame_end(buffer: &[u8]) -> Option<usize> {
    buffer.windows(2).position(|pair| pair == b"\n\n")
}
