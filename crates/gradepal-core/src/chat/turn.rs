//! One chat turn, end to end.
//!
//! `start_stream`/`complete_once` share the same preparation: validate the
//! request, resolve or create the thread, claim the thread's turn lock,
//! persist the caller's message, then build the system prompt from a fresh
//! academic snapshot and the windowed history. The reply is produced either
//! by streaming deltas through a [`FrameSink`] or by a one-shot completion.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use gradepal_types::chat::{ChatReply, ChatRequest, ChatRole};
use gradepal_types::error::ChatError;
use gradepal_types::identity::ChatUser;
use gradepal_types::stream::{EMPTY_RESPONSE_MESSAGE, STREAM_ERROR_MESSAGE};

use super::repository::ChatRepository;
use super::service::ConversationStore;
use super::title::generate_title;
use super::turn_lock::{TurnGuard, TurnLocks};
use crate::context::aggregator::ContextAggregator;
use crate::llm::bridge::CompletionBridge;
use crate::prompt::builder::SystemPromptBuilder;
use crate::prompt::history::HistoryWindow;
use crate::records::repository::RecordsRepository;
use crate::stream::transport::{FrameSink, TurnOutcome, drive_turn};

/// A validated turn with the user message persisted and the prompt built.
///
/// Holds the thread's turn lock until dropped.
#[derive(Debug)]
pub struct PreparedTurn {
    pub thread_id: Uuid,
    /// Whether this turn created the thread.
    pub created: bool,
    message: String,
    system_prompt: String,
    _guard: TurnGuard,
}

impl PreparedTurn {
    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }
}

/// Turn orchestrator.
pub struct ChatTurns<C: ChatRepository, R: RecordsRepository> {
    store: ConversationStore<C>,
    aggregator: ContextAggregator<R>,
    bridge: CompletionBridge,
    window: HistoryWindow,
    locks: TurnLocks,
}

impl<C: ChatRepository, R: RecordsRepository> ChatTurns<C, R> {
    pub fn new(
        store: ConversationStore<C>,
        aggregator: ContextAggregator<R>,
        bridge: CompletionBridge,
        window: HistoryWindow,
    ) -> Self {
        Self {
            store,
            aggregator,
            bridge,
            window,
            locks: TurnLocks::new(),
        }
    }

    pub fn store(&self) -> &ConversationStore<C> {
        &self.store
    }

    pub fn bridge(&self) -> &CompletionBridge {
        &self.bridge
    }

    pub fn locks(&self) -> &TurnLocks {
        &self.locks
    }

    /// Prepare a streamed turn. Nothing is written when this fails with
    /// `Validation`, `NotFound` or `Busy`.
    pub async fn start_stream(
        &self,
        user: &ChatUser,
        request: &ChatRequest,
    ) -> Result<PreparedTurn, ChatError> {
        self.prepare(user, request).await
    }

    /// Drive a prepared turn to its end and close `sink`.
    ///
    /// Accumulated text is persisted as the assistant message on every
    /// outcome when non-empty; a completed turn with no text persists the
    /// empty-response fallback instead. Provider failures reach the client
    /// only as the generic error frame.
    pub async fn run_stream(
        &self,
        prepared: PreparedTurn,
        sink: &mut FrameSink,
        cancel: &CancellationToken,
        keep_alive: Option<Duration>,
    ) -> TurnOutcome {
        let thread_id = prepared.thread_id;
        let deltas = self
            .bridge
            .stream(&prepared.system_prompt, &prepared.message);
        let outcome = drive_turn(deltas, sink, cancel, keep_alive).await;

        let text = outcome.text().trim();
        let reply = match (&outcome, text.is_empty()) {
            (TurnOutcome::Completed { .. }, true) => Some(EMPTY_RESPONSE_MESSAGE),
            (_, true) => None,
            (_, false) => Some(text),
        };
        if let Some(reply) = reply {
            if let Err(e) = self
                .store
                .append_message(thread_id, ChatRole::Assistant, reply)
                .await
            {
                warn!(thread_id = %thread_id, error = %e, "Failed to persist assistant reply");
            }
        }

        match &outcome {
            TurnOutcome::Completed { text } => {
                info!(thread_id = %thread_id, chars = text.len(), "Streamed turn completed");
                let _ = sink.done(thread_id).await;
            }
            TurnOutcome::Failed { text, error } => {
                warn!(
                    thread_id = %thread_id,
                    error = %error,
                    partial_chars = text.len(),
                    "Streamed turn failed"
                );
                let _ = sink.error(STREAM_ERROR_MESSAGE).await;
            }
            TurnOutcome::Aborted { text } => {
                info!(
                    thread_id = %thread_id,
                    partial_chars = text.len(),
                    "Streamed turn aborted by client"
                );
            }
        }
        sink.close();
        drop(prepared);
        outcome
    }

    /// One-shot turn: the whole reply in a single response.
    pub async fn complete_once(
        &self,
        user: &ChatUser,
        request: &ChatRequest,
    ) -> Result<ChatReply, ChatError> {
        let prepared = self.prepare(user, request).await?;
        let response = self
            .bridge
            .complete(&prepared.system_prompt, &prepared.message)
            .await?;
        self.store
            .append_message(prepared.thread_id, ChatRole::Assistant, &response)
            .await?;
        info!(thread_id = %prepared.thread_id, chars = response.len(), "Turn completed");
        Ok(ChatReply {
            response,
            thread_id: prepared.thread_id,
        })
    }

    async fn prepare(
        &self,
        user: &ChatUser,
        request: &ChatRequest,
    ) -> Result<PreparedTurn, ChatError> {
        let message = request.message.trim();
        if message.is_empty() {
            return Err(ChatError::Validation("message is required".to_string()));
        }
        let requested = parse_thread_id(request.thread_id.as_deref())?;

        // An existing thread is checked and locked before anything is written.
        let (thread_id, created, guard) = match requested {
            Some(id) => {
                self.store.thread_for_owner(user.id, id).await?;
                let guard = self.locks.try_acquire(id).ok_or(ChatError::Busy)?;
                (id, false, guard)
            }
            None => {
                let thread = self
                    .store
                    .ensure_thread(user.id, None, || generate_title(&self.bridge, message))
                    .await?;
                let guard = self.locks.try_acquire(thread.id).ok_or(ChatError::Busy)?;
                (thread.id, true, guard)
            }
        };

        self.store
            .append_message(thread_id, ChatRole::User, message)
            .await?;

        let messages = self.store.list_messages(thread_id).await?;
        let history = self.window.apply(&messages);
        let snapshot = self.aggregator.snapshot(user).await?;
        let system_prompt = SystemPromptBuilder::build(&snapshot, &history);

        Ok(PreparedTurn {
            thread_id,
            created,
            message: message.to_string(),
            system_prompt,
            _guard: guard,
        })
    }
}

/// Blank means "new thread"; anything else must be a UUID. A malformed id
/// cannot name an existing thread, so it is `NotFound`.
fn parse_thread_id(raw: Option<&str>) -> Result<Option<Uuid>, ChatError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => Uuid::parse_str(raw).map(Some).map_err(|_| ChatError::NotFound),
    }
}
