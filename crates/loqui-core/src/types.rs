// SPDX-FileCopyrightText: 2026 Loqui Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the gateway, adapters, and the client.

use serde::{Deserialize, Serialize};

use crate::error::{ErrorCategory, LlmServiceError};

/// Who produced a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One exchange unit of conversation history.
///
/// Owned by the conversation collaborator; the streaming core only ever
/// reads an ordered slice of these per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: ChatRole,
    pub text: String,
}

impl ConversationTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            text: text.into(),
        }
    }
}

/// A model offered by a configured provider.
///
/// Loaded once at startup from configuration; read-only thereafter. Exactly
/// one descriptor across all enabled providers carries `default = true`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    /// Model identifier as sent to the provider (e.g. "claude-sonnet-4-20250514").
    pub id: String,
    /// Human-readable name for UI listings.
    pub display_name: String,
    /// Short description for UI listings.
    #[serde(default)]
    pub description: String,
    /// Identifier of the owning provider.
    pub provider: String,
    /// Whether this model is the fallback when a request omits `model_id`.
    #[serde(default)]
    pub default: bool,
}

/// Adapter self-description returned by `ProviderAdapter::describe`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderInfo {
    /// Provider identifier (e.g. "anthropic").
    pub id: String,
    /// Human-readable provider name.
    pub display_name: String,
}

/// A normalized streaming event, one per wire frame.
///
/// The serde representation is exactly the wire payload:
/// `{"type":"token","content":...}`, `{"type":"complete","model":...}`,
/// `{"type":"error","error":...,"code":...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// One reply fragment, in arrival order.
    Token { content: String },
    /// The reply finished normally; no further frames follow.
    Complete { model: String },
    /// The reply failed; no further frames follow.
    Error {
        #[serde(rename = "error")]
        message: String,
        #[serde(rename = "code")]
        category: ErrorCategory,
    },
}

impl StreamEvent {
    /// True for `Complete` and `Error` — the events after which the
    /// transport closes.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Complete { .. } | StreamEvent::Error { .. })
    }
}

impl From<&LlmServiceError> for StreamEvent {
    fn from(err: &LlmServiceError) -> Self {
        StreamEvent::Error {
            message: err.message.clone(),
            category: err.category,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_event_wire_shape() {
        let event = StreamEvent::Token {
            content: "Hel".into(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"type":"token","content":"Hel"}"#);
    }

    #[test]
    fn complete_event_wire_shape() {
        let event = StreamEvent::Complete {
            model: "claude-sonnet-4-20250514".into(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(
            json,
            r#"{"type":"complete","model":"claude-sonnet-4-20250514"}"#
        );
    }

    #[test]
    fn error_event_uses_error_and_code_keys() {
        let event = StreamEvent::from(&LlmServiceError::new(ErrorCategory::RateLimit));
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.starts_with(r#"{"type":"error","error":"#), "got: {json}");
        assert!(json.ends_with(r#""code":"rate_limit"}"#), "got: {json}");
    }

    #[test]
    fn event_round_trip() {
        let events = vec![
            StreamEvent::Token { content: "a".into() },
            StreamEvent::Complete { model: "m".into() },
            StreamEvent::Error {
                message: "gone".into(),
                category: ErrorCategory::Connection,
            },
        ];
        for event in events {
            let json = serde_json::to_string(&event).unwrap();
            let parsed: StreamEvent = serde_json::from_str(&json).unwrap();
            assert_eq!(event, parsed);
        }
    }

    #[test]
    fn terminal_classification() {
        assert!(!StreamEvent::Token { content: "x".into() }.is_terminal());
        assert!(StreamEvent::Complete { model: "m".into() }.is_terminal());
        assert!(
            StreamEvent::Error {
                message: "e".into(),
                category: ErrorCategory::Internal,
            }
            .is_terminal()
        );
    }

    #[test]
    fn chat_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&ChatRole::User).unwrap(), r#""user""#);
        assert_eq!(
            serde_json::to_string(&ChatRole::Assistant).unwrap(),
            r#""assistant""#
        );
    }

    #[test]
    fn model_descriptor_default_flag_defaults_false() {
        let json = r#"{"id":"m1","display_name":"M1","provider":"anthropic"}"#;
        let descriptor: ModelDescriptor = serde_json::from_str(json).unwrap();
        assert!(!descriptor.default);
        assert!(descriptor.description.is_empty());
    }
}
