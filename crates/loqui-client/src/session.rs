// SPDX-FileCopyrightText: 2026 Loqui Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Streaming session state machine.
//!
//! At most one reply draft exists at a time. Tokens accumulate into the
//! draft; every terminal transition hands the accumulated text (full or
//! partial) to the conversation sink exactly once, so the transcript never
//! silently loses words the user already saw rendered.

use chrono::{DateTime, Utc};
use loqui_core::{ConversationTurn, LlmServiceError, StreamEvent};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

/// Lifecycle of a draft. `Streaming` is the only non-terminal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftStatus {
    Streaming,
    /// Completed normally.
    Sent,
    /// Stream failed; the committed text may be partial.
    Error,
    /// User abort; the committed text may be partial.
    Aborted,
}

/// Where committed assistant turns go. Called exactly once per terminal
/// outcome, with the terminal status of the draft that produced the turn.
/// The REPL implements this over its transcript; tests over a `Vec`.
pub trait ConversationSink {
    fn append_turn(&mut self, turn: ConversationTurn, status: DraftStatus);
}

impl ConversationSink for Vec<ConversationTurn> {
    fn append_turn(&mut self, turn: ConversationTurn, _status: DraftStatus) {
        self.push(turn);
    }
}

/// Violations of the session state machine.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("a reply is already streaming")]
    AlreadyStreaming,
    #[error("no reply is streaming")]
    NoActiveDraft,
}

/// How a draft ended, for the caller driving the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftOutcome {
    /// Full reply committed.
    Completed { model: String },
    /// Stream failed; the partial text was committed first.
    Failed { error: LlmServiceError },
    /// User abort; the partial text was committed first.
    Aborted,
}

/// Accumulator for one in-flight reply.
#[derive(Debug)]
pub struct StreamingDraft {
    pub id: Uuid,
    pub text: String,
    pub status: DraftStatus,
    /// Model requested at start; `None` means the gateway default.
    pub model: Option<String>,
    pub started_at: DateTime<Utc>,
}

impl StreamingDraft {
    fn new(model: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: String::new(),
            status: DraftStatus::Streaming,
            model,
            started_at: Utc::now(),
        }
    }
}

/// Client-side chat session: owns the single in-flight draft and the sink
/// that receives its terminal result.
#[derive(Debug)]
pub struct ChatSession<S: ConversationSink> {
    sink: S,
    draft: Option<StreamingDraft>,
}

impl<S: ConversationSink> ChatSession<S> {
    pub fn new(sink: S) -> Self {
        Self { sink, draft: None }
    }

    /// True while a draft is accumulating.
    pub fn is_streaming(&self) -> bool {
        self.draft.is_some()
    }

    /// The in-flight draft, if any.
    pub fn draft(&self) -> Option<&StreamingDraft> {
        self.draft.as_ref()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Mutable sink access, for callers that also record user turns.
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Opens a reply draft. Rejected without side effects while one is
    /// already streaming; requests are not queued.
    pub fn start(&mut self, model: Option<&str>) -> Result<(), SessionError> {
        if self.draft.is_some() {
            return Err(SessionError::AlreadyStreaming);
        }
        let draft = StreamingDraft::new(model.map(String::from));
        debug!(draft_id = %draft.id, model = draft.model.as_deref().unwrap_or("default"), "draft opened");
        self.draft = Some(draft);
        Ok(())
    }

    /// Appends one token to the draft. A token arriving while idle is
    /// dropped with a log line, not an error: a late frame after a local
    /// abort is expected traffic.
    pub fn on_token(&mut self, content: &str) {
        match self.draft.as_mut() {
            Some(draft) => draft.text.push_str(content),
            None => warn!(chars = content.len(), "token dropped: no active draft"),
        }
    }

    /// Terminal: the reply finished normally.
    pub fn on_complete(&mut self, model: &str) -> Result<DraftOutcome, SessionError> {
        let draft = self.take_draft(DraftStatus::Sent)?;
        debug!(draft_id = %draft.id, model = %model, chars = draft.text.len(), "draft sent");
        self.sink
            .append_turn(ConversationTurn::assistant(draft.text), DraftStatus::Sent);
        Ok(DraftOutcome::Completed {
            model: model.to_string(),
        })
    }

    /// Terminal: the stream failed. Partial text is committed so the next
    /// request's history matches what the user saw.
    pub fn on_error(&mut self, error: LlmServiceError) -> Result<DraftOutcome, SessionError> {
        let draft = self.take_draft(DraftStatus::Error)?;
        debug!(
            draft_id = %draft.id,
            category = %error.category,
            partial_chars = draft.text.len(),
            "draft failed"
        );
        self.sink
            .append_turn(ConversationTurn::assistant(draft.text), DraftStatus::Error);
        Ok(DraftOutcome::Failed { error })
    }

    /// Terminal: user-initiated abort. Partial text is committed with the
    /// interrupted marker status.
    pub fn abort(&mut self) -> Result<DraftOutcome, SessionError> {
        let draft = self.take_draft(DraftStatus::Aborted)?;
        debug!(draft_id = %draft.id, partial_chars = draft.text.len(), "draft aborted");
        self.sink
            .append_turn(ConversationTurn::assistant(draft.text), DraftStatus::Aborted);
        Ok(DraftOutcome::Aborted)
    }

    /// Dispatches one normalized event. Terminal events return an outcome.
    pub fn on_event(&mut self, event: StreamEvent) -> Result<Option<DraftOutcome>, SessionError> {
        match event {
            StreamEvent::Token { content } => {
                self.on_token(&content);
                Ok(None)
            }
            StreamEvent::Complete { model } => self.on_complete(&model).map(Some),
            StreamEvent::Error { message, category } => self
                .on_error(LlmServiceError {
                    category,
                    message,
                    retry_after_secs: None,
                })
                .map(Some),
        }
    }

    fn take_draft(&mut self, status: DraftStatus) -> Result<StreamingDraft, SessionError> {
        let mut draft = self.draft.take().ok_or(SessionError::NoActiveDraft)?;
        draft.status = status;
        Ok(draft)
    }
}
