// SPDX-FileCopyrightText: 2026 Loqui Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use loqui_config::ServerConfig;
use thiserror::Error;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::gateway::InferenceGateway;
use crate::handlers;

/// Server startup failures.
#[derive(Debug, Error)]
pub enum ServeError {
    #[error("failed to bind gateway to {addr}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("gateway server error")]
    Serve(#[source] std::io::Error),
}

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub gateway: Arc<InferenceGateway>,
}

/// Builds the gateway router. Split from [`start_server`] so tests can
/// drive it without binding a socket.
pub fn build_router(state: GatewayState) -> Router {
    Router::new()
        .route("/v1/chat", post(handlers::post_chat))
        .route("/v1/models", get(handlers::get_models))
        .route("/health", get(handlers::get_health))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Starts the gateway HTTP server and serves until the process exits.
pub async fn start_server(
    config: &ServerConfig,
    gateway: Arc<InferenceGateway>,
) -> Result<(), ServeError> {
    let app = build_router(GatewayState { gateway });

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|source| ServeError::Bind {
            addr: addr.clone(),
            source,
        })?;

    tracing::info!("gateway listening on {addr}");

    axum::serve(listener, app).await.map_err(ServeError::Serve)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use http_body_util::BodyExt;
    use loqui_config::{AnthropicConfig, LoquiConfig, ProvidersConfig};
    use loqui_core::ModelDescriptor;
    use loqui_registry::ProviderRegistry;
    use tower::ServiceExt;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn test_router(server: &MockServer) -> Router {
        let config = LoquiConfig {
            providers: ProvidersConfig {
                anthropic: AnthropicConfig {
                    api_key: Some("sk-ant-test".to_string()),
                    base_url: server.uri(),
                    request_timeout_secs: 5,
                    ..Default::default()
                },
                ..Default::default()
            },
            models: vec![ModelDescriptor {
                id: "claude-sonnet-4-20250514".to_string(),
                display_name: "Claude Sonnet 4".to_string(),
                description: String::new(),
                provider: "anthropic".to_string(),
                default: true,
            }],
            ..Default::default()
        };
        let registry = ProviderRegistry::from_config(&config).unwrap();
        build_router(GatewayState {
            gateway: Arc::new(InferenceGateway::new(Arc::new(registry))),
        })
    }

    fn chat_request(body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/v1/chat")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn health_endpoint_responds() {
        let server = MockServer::start().await;
        let router = test_router(&server).await;
        let response = router
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn models_endpoint_lists_enabled_models() {
        let server = MockServer::start().await;
        let router = test_router(&server).await;
        let response = router
            .oneshot(Request::get("/v1/models").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["models"].as_array().unwrap().len(), 1);
        assert_eq!(json["default"], "claude-sonnet-4-20250514");
    }

    #[tokio::test]
    async fn streaming_chat_returns_sse_frames() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(concat!(
                        "event: content_block_delta\ndata: {\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"Hi\"}}\n\n",
                        "event: message_stop\ndata: {}\n\n",
                    )),
            )
            .mount(&server)
            .await;

        let router = test_router(&server).await;
        let response = router
            .oneshot(chat_request(serde_json::json!({
                "message": "hello",
                "stream": true
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/event-stream"
        );

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = String::from_utf8(bytes.to_vec()).unwrap();
        assert_eq!(
            body,
            concat!(
                "data: {\"type\":\"token\",\"content\":\"Hi\"}\n\n",
                "data: {\"type\":\"complete\",\"model\":\"claude-sonnet-4-20250514\"}\n\n",
            )
        );
    }

    #[tokio::test]
    async fn non_streaming_chat_returns_json_reply() {
        let server = MockServer::start().await;
        let body = serde_json::json!({
            "id": "msg_1",
            "content": [{"type": "text", "text": "Hello!"}],
            "model": "claude-sonnet-4-20250514",
            "stop_reason": "end_turn"
        });
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let router = test_router(&server).await;
        let response = router
            .oneshot(chat_request(serde_json::json!({ "message": "hello" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["reply"], "Hello!");
        assert_eq!(json["model"], "claude-sonnet-4-20250514");
    }

    #[tokio::test]
    async fn unknown_model_non_streaming_is_400_with_code() {
        let server = MockServer::start().await;
        let router = test_router(&server).await;
        let response = router
            .oneshot(chat_request(serde_json::json!({
                "message": "hello",
                "model_id": "no-such-model"
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["code"], "invalid_request");
    }

    #[tokio::test]
    async fn streaming_error_is_delivered_in_band_as_http_200() {
        let server = MockServer::start().await;
        // No backend mock matters here: the unknown model fails resolution.
        let router = test_router(&server).await;
        let response = router
            .oneshot(chat_request(serde_json::json!({
                "message": "hello",
                "model_id": "no-such-model",
                "stream": true
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(body.starts_with("data: {\"type\":\"error\""));
        assert!(body.contains("\"code\":\"invalid_request\""));
    }
}
