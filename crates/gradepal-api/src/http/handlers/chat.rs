//! Chat endpoints.
//!
//! - POST /api/v1/chat          - One-shot reply `{response, threadId}`
//! - POST /api/v1/chat/stream   - Streamed reply (event-stream frames)
//! - GET  /api/v1/chat/threads  - Caller's threads, most recently updated first
//! - GET  /api/v1/chat/history  - Messages of one thread, oldest first
//!
//! Stream frames are `data: <json>\n\n` blocks: zero or more `{chunk}`,
//! then `{threadId, done: true}` followed by `data: [DONE]`, or a single
//! `{error}`. Validation, ownership and busy-thread failures are reported as
//! ordinary JSON errors before the stream opens.

use std::sync::Arc;
use std::time::Instant;

use axum::Json;
use axum::extract::{Query, State};
use axum::response::Response;
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use gradepal_core::stream::transport::FrameSink;
use gradepal_types::chat::{ChatReply, ChatRequest, ThreadHistory, ThreadList};
use gradepal_types::error::ChatError;

use crate::http::error::AppError;
use crate::http::extractors::auth::CurrentUser;
use crate::http::response::ApiResponse;
use crate::http::sse::{GuardedReceiver, event_stream_response};
use crate::state::AppState;

/// Frames buffered between the turn task and the response body.
const STREAM_BUFFER: usize = 64;

/// Query parameters for history lookup.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(rename = "threadId")]
    pub thread_id: Option<String>,
}

/// POST /api/v1/chat - Complete one turn and return the whole reply.
pub async fn chat(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<ChatRequest>,
) -> Result<Json<ApiResponse<ChatReply>>, AppError> {
    let start = Instant::now();
    let reply = state.chat.complete_once(&user, &body).await?;
    Ok(Json(ApiResponse::success(reply, start)))
}

/// POST /api/v1/chat/stream - Stream one turn.
///
/// The turn runs in its own task so token production starts while the
/// response body is already being drained. The task stops pulling from the
/// provider when the client disconnects or the server shuts down.
pub async fn stream_chat(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<ChatRequest>,
) -> Result<Response, AppError> {
    let prepared = state.chat.start_stream(&user, &body).await?;
    debug!(thread_id = %prepared.thread_id, created = prepared.created, "Opening chat stream");

    let (mut sink, rx) = FrameSink::channel(STREAM_BUFFER);
    let cancel = state.shutdown.child_token();
    let turn_cancel = cancel.clone();
    let chat = Arc::clone(&state.chat);
    let keep_alive = state.keep_alive();

    tokio::spawn(async move {
        chat.run_stream(prepared, &mut sink, &turn_cancel, keep_alive)
            .await;
    });

    Ok(event_stream_response(GuardedReceiver::new(
        rx,
        cancel.drop_guard(),
    )))
}

/// GET /api/v1/chat/threads - List the caller's threads.
pub async fn list_threads(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<ApiResponse<ThreadList>>, AppError> {
    let start = Instant::now();
    let threads = state.chat.store().list_threads(user.id).await?;
    Ok(Json(ApiResponse::success(ThreadList { threads }, start)))
}

/// GET /api/v1/chat/history?threadId=... - Messages of one owned thread.
pub async fn history(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<ApiResponse<ThreadHistory>>, AppError> {
    let start = Instant::now();
    let raw = query
        .thread_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ChatError::Validation("threadId is required".to_string()))?;
    // A malformed id cannot name an existing thread.
    let thread_id = Uuid::parse_str(raw).map_err(|_| ChatError::NotFound)?;

    let history = state.chat.store().history(user.id, thread_id).await?;
    Ok(Json(ApiResponse::success(ThreadHistory { history }, start)))
}
