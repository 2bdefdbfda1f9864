// SPDX-FileCopyrightText: 2026 Loqui Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request handlers for the gateway HTTP surface.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use loqui_core::{ConversationTurn, ErrorCategory, LlmServiceError, ModelDescriptor};
use serde::{Deserialize, Serialize};

use crate::server::GatewayState;
use crate::sse;

/// Body of POST /v1/chat.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    /// The new user message.
    pub message: String,
    /// Model to use; the registry default when omitted.
    #[serde(default)]
    pub model_id: Option<String>,
    /// Prior turns, oldest first. The new message is appended after them.
    #[serde(default)]
    pub history: Vec<ConversationTurn>,
    /// When true the response is an SSE event stream.
    #[serde(default)]
    pub stream: bool,
}

/// Error body for non-streaming failures.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: ErrorCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<u64>,
}

/// Body of GET /v1/models.
#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    pub models: Vec<ModelDescriptor>,
    pub default: String,
}

/// POST /v1/chat: non-streaming JSON reply, or an SSE stream when the body
/// sets `stream: true`.
pub async fn post_chat(
    State(state): State<GatewayState>,
    Json(body): Json<ChatRequest>,
) -> Response {
    let mut history = body.history;
    history.push(ConversationTurn::user(body.message));

    if body.stream {
        let events = state
            .gateway
            .stream_chat(history, body.model_id.as_deref())
            .await;
        return sse::sse_response(events);
    }

    match state
        .gateway
        .invoke_chat(&history, body.model_id.as_deref())
        .await
    {
        Ok(reply) => Json(reply).into_response(),
        Err(err) => error_response(&err),
    }
}

/// GET /v1/models: models of credentialed providers only.
pub async fn get_models(State(state): State<GatewayState>) -> Json<ModelsResponse> {
    let registry = state.gateway.registry();
    Json(ModelsResponse {
        models: registry.list_enabled().to_vec(),
        default: registry.default_model().to_string(),
    })
}

/// GET /health: liveness only, no dependency checks.
pub async fn get_health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

fn error_response(err: &LlmServiceError) -> Response {
    let status = match err.category {
        ErrorCategory::InvalidRequest => StatusCode::BAD_REQUEST,
        ErrorCategory::RateLimit => StatusCode::TOO_MANY_REQUESTS,
        ErrorCategory::Timeout => StatusCode::GATEWAY_TIMEOUT,
        // Upstream credential and connectivity problems are the gateway's
        // to fix, not the caller's.
        ErrorCategory::Authentication | ErrorCategory::Connection => StatusCode::BAD_GATEWAY,
        ErrorCategory::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorBody {
            error: err.message.clone(),
            code: err.category,
            retry_after_secs: err.retry_after_secs,
        }),
    )
        .into_response()
}
