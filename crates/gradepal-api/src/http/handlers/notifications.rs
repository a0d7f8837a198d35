//! GET /api/v1/notifications/stream - Out-of-band event stream.
//!
//! The first frame is a `: connected` comment; every later frame is a
//! `data: {"type": ..., ...}` block published on the notification bus. There
//! is no replay: events published while a client is disconnected are lost.

use axum::extract::State;
use axum::response::Response;
use tracing::debug;

use crate::http::extractors::auth::CurrentUser;
use crate::http::sse::event_stream_response;
use crate::state::AppState;

pub async fn stream_notifications(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Response {
    // Dropping the body drops the subscription, which unregisters it.
    let subscription = state.notifications.subscribe(&state.shutdown);
    debug!(user_id = %user.id, subscriber_id = subscription.id(), "Notification stream opened");
    event_stream_response(subscription)
}
