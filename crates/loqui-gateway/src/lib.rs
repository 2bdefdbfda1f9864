// SPDX-FileCopyrightText: 2026 Loqui Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for the Loqui inference pipeline.
//!
//! Exposes three routes: `POST /v1/chat` (JSON reply, or SSE when the body
//! sets `stream: true`), `GET /v1/models`, and `GET /health`. The streaming
//! wire format is one `data: {json}\n\n` frame per normalized event, with
//! the connection closing after the terminal frame.

mod gateway;
mod handlers;
mod server;
mod sse;

pub use gateway::{ChatReply, EventStream, InferenceGateway};
pub use handlers::{ChatRequest, ErrorBody, ModelsResponse};
pub use server::{GatewayState, ServeError, build_router, start_server};
pub use sse::encode_frame;
