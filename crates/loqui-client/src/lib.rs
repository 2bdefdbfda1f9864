// SPDX-FileCopyrightText: 2026 Loqui Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Client-side streaming: frame decoding, session state, transport driver.
//!
//! The decoder turns raw network reads back into normalized events, the
//! session state machine keeps the transcript consistent (including partial
//! replies from failed or aborted streams), and the transport drives one
//! exchange against a gateway with guard-timer and abort handling.

mod decoder;
mod session;
mod transport;

pub use decoder::FrameDecoder;
pub use session::{
    ChatSession, ConversationSink, DraftOutcome, DraftStatus, SessionError, StreamingDraft,
};
pub use transport::{ChatClient, ModelList};
