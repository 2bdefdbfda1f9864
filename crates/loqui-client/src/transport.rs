// SPDX-FileCopyrightText: 2026 Loqui Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP transport and stream driver for the chat client.
//!
//! Drives one streaming request end to end: opens the connection, feeds
//! network reads through the frame decoder into the session state machine,
//! and enforces the guard timer and user aborts. Every exit path leaves the
//! session idle with a terminal [`DraftOutcome`].

use std::time::Duration;

use futures::StreamExt;
use loqui_config::ClientConfig;
use loqui_core::{ConversationTurn, ErrorCategory, LlmServiceError, ModelDescriptor, StreamEvent};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::decoder::FrameDecoder;
use crate::session::{ChatSession, ConversationSink, DraftOutcome, SessionError};

/// Response body of the gateway's GET /v1/models.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelList {
    pub models: Vec<ModelDescriptor>,
    pub default: String,
}

/// Client for one gateway endpoint.
#[derive(Debug, Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    server_url: String,
    guard_timeout: Duration,
}

impl ChatClient {
    pub fn new(config: &ClientConfig) -> Result<Self, LlmServiceError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|_| LlmServiceError::new(ErrorCategory::Internal))?;
        Ok(Self {
            http,
            server_url: config.server_url.trim_end_matches('/').to_string(),
            guard_timeout: Duration::from_secs(config.guard_timeout_secs),
        })
    }

    /// Fetches the models the gateway currently offers.
    pub async fn list_models(&self) -> Result<ModelList, LlmServiceError> {
        let response = self
            .http
            .get(format!("{}/v1/models", self.server_url))
            .send()
            .await
            .map_err(|e| map_transport_error(&e))?;

        if !response.status().is_success() {
            return Err(LlmServiceError::new(ErrorCategory::Internal));
        }
        response
            .json::<ModelList>()
            .await
            .map_err(|e| map_transport_error(&e))
    }

    /// Runs one streaming chat exchange.
    ///
    /// `history` is the transcript before this message; the gateway appends
    /// the message itself, and recording the user turn locally is the
    /// caller's job. `render` is called once per token as it arrives.
    /// Cancelling `cancel` aborts the stream; partial text is committed per
    /// the session rules. The guard timer bounds each network read: a
    /// stream that goes quiet longer than the window ends as a timeout.
    pub async fn run_stream<S, F>(
        &self,
        session: &mut ChatSession<S>,
        history: Vec<ConversationTurn>,
        message: &str,
        model_id: Option<&str>,
        cancel: &CancellationToken,
        mut render: F,
    ) -> Result<DraftOutcome, SessionError>
    where
        S: ConversationSink,
        F: FnMut(&str),
    {
        session.start(model_id)?;

        let body = serde_json::json!({
            "message": message,
            "model_id": model_id,
            "history": history,
            "stream": true,
        });

        // The guard timer also bounds the wait for response headers, so a
        // gateway that accepts the connection but never answers still ends
        // as a timeout.
        let request = self
            .http
            .post(format!("{}/v1/chat", self.server_url))
            .json(&body)
            .send();
        let response = tokio::select! {
            biased;

            _ = cancel.cancelled() => return session.abort(),

            sent = tokio::time::timeout(self.guard_timeout, request) => match sent {
                Err(_) => {
                    return session.on_error(LlmServiceError::new(ErrorCategory::Timeout));
                }
                Ok(Err(e)) => return session.on_error(map_transport_error(&e)),
                Ok(Ok(response)) => response,
            },
        };

        if !response.status().is_success() {
            debug!(status = %response.status(), "stream request rejected");
            return session.on_error(LlmServiceError::new(ErrorCategory::Internal));
        }

        let mut decoder = FrameDecoder::new();
        let mut reads = response.bytes_stream();

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    return session.abort();
                }

                read = tokio::time::timeout(self.guard_timeout, reads.next()) => {
                    let chunk = match read {
                        // Guard timer fired: the stream went quiet.
                        Err(_) => {
                            return session.on_error(
                                LlmServiceError::new(ErrorCategory::Timeout),
                            );
                        }
                        Ok(Some(Err(e))) => {
                            return session.on_error(map_transport_error(&e));
                        }
                        // Connection closed by the server. A terminal frame
                        // returns from the feed loop, so any close reaching
                        // this arm is a dropped stream.
                        Ok(None) => {
                            return session.on_error(
                                decoder
                                    .finish()
                                    .err()
                                    .unwrap_or_else(|| {
                                        LlmServiceError::new(ErrorCategory::Connection)
                                    }),
                            );
                        }
                        Ok(Some(Ok(chunk))) => chunk,
                    };

                    for item in decoder.feed(&chunk) {
                        match item {
                            Ok(event) => {
                                if let StreamEvent::Token { content } = &event {
                                    render(content);
                                }
                                if let Some(outcome) = session.on_event(event)? {
                                    return Ok(outcome);
                                }
                            }
                            Err(e) => return session.on_error(e),
                        }
                    }
                }
            }
        }
    }
}

fn map_transport_error(err: &reqwest::Error) -> LlmServiceError {
    let category = if err.is_timeout() {
        ErrorCategory::Timeout
    } else {
        ErrorCategory::Connection
    };
    LlmServiceError::new(category)
}
