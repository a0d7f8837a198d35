//! Streamed `text/event-stream` responses.
//!
//! Both the chat stream and the notification stream hand axum a body built
//! from a stream of pre-framed [`Bytes`]. Headers disable caching and proxy
//! buffering so frames reach the client as soon as they are produced.

use std::convert::Infallible;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::header::{CACHE_CONTROL, CONNECTION, CONTENT_TYPE, HeaderName, HeaderValue};
use axum::response::Response;
use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_util::sync::DropGuard;

const X_ACCEL_BUFFERING: HeaderName = HeaderName::from_static("x-accel-buffering");

/// Wrap a frame stream in a streaming response with event-stream headers.
pub fn event_stream_response<S>(frames: S) -> Response
where
    S: Stream<Item = Bytes> + Send + 'static,
{
    let mut response = Response::new(Body::from_stream(frames.map(Ok::<_, Infallible>)));
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/event-stream"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache, no-transform"));
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(X_ACCEL_BUFFERING, HeaderValue::from_static("no"));
    response
}

/// Response body side of a chat stream.
///
/// When hyper drops the body (the client went away) the guard cancels the
/// turn's token, which the turn driver observes.
pub struct GuardedReceiver {
    rx: mpsc::Receiver<Bytes>,
    _guard: DropGuard,
}

impl GuardedReceiver {
    pub fn new(rx: mpsc::Receiver<Bytes>, guard: DropGuard) -> Self {
        Self { rx, _guard: guard }
    }
}

impl Stream for GuardedReceiver {
    type Item = Bytes;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Bytes>> {
        self.get_mut().rx.poll_recv(cx)
    }
}
