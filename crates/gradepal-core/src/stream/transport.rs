//! Server-side push of one chat turn.
//!
//! A [`FrameSink`] owns the sending half of the response body channel and
//! tracks the turn's state: `Open -> Streaming -> Done | Errored -> Closed`.
//! [`drive_turn`] pulls deltas from the completion bridge and pushes each as
//! a `{chunk}` frame until the provider finishes, fails, or the caller goes
//! away.

use std::time::Duration;

use bytes::Bytes;
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio::time::{Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

use gradepal_types::llm::LlmError;
use gradepal_types::stream::StreamFrame;

use super::frame::{encode_comment, encode_done_sentinel, encode_frame};
use crate::llm::bridge::TextDeltaStream;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkState {
    Open,
    Streaming,
    Done,
    Errored,
    Closed,
}

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// The receiving side is gone (client disconnected) or the sink was closed.
    #[error("stream closed")]
    Closed,

    #[error("cannot push {frame} in state {state:?}")]
    InvalidState { frame: &'static str, state: SinkState },

    #[error("failed to encode frame: {0}")]
    Encode(String),
}

/// Push side of one streamed response.
#[derive(Debug)]
pub struct FrameSink {
    tx: Option<mpsc::Sender<Bytes>>,
    state: SinkState,
}

impl FrameSink {
    /// Create a sink and the receiver that feeds the response body.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Bytes>) {
        let (tx, rx) = mpsc::channel(capacity);
        (
            Self {
                tx: Some(tx),
                state: SinkState::Open,
            },
            rx,
        )
    }

    pub fn state(&self) -> SinkState {
        self.state
    }

    /// Push one `{chunk}` frame.
    pub async fn chunk(&mut self, text: &str) -> Result<(), SinkError> {
        self.expect_active("chunk")?;
        self.push_frame(&StreamFrame::chunk(text)).await?;
        self.state = SinkState::Streaming;
        Ok(())
    }

    /// Push the terminal `{threadId, done: true}` frame followed by `[DONE]`.
    pub async fn done(&mut self, thread_id: Uuid) -> Result<(), SinkError> {
        self.expect_active("done")?;
        self.push_frame(&StreamFrame::done(thread_id)).await?;
        self.push(encode_done_sentinel()).await?;
        self.state = SinkState::Done;
        Ok(())
    }

    /// Push a terminal `{error}` frame.
    pub async fn error(&mut self, message: &str) -> Result<(), SinkError> {
        self.expect_active("error")?;
        self.push_frame(&StreamFrame::error(message)).await?;
        self.state = SinkState::Errored;
        Ok(())
    }

    /// Push a comment frame; allowed in any state before close.
    pub async fn comment(&mut self, text: &str) -> Result<(), SinkError> {
        self.push(encode_comment(text)).await
    }

    /// Close the channel. Calling this again is a no-op.
    pub fn close(&mut self) {
        if self.tx.take().is_some() {
            debug!(state = ?self.state, "Stream sink closed");
        }
        self.state = SinkState::Closed;
    }

    fn expect_active(&self, frame: &'static str) -> Result<(), SinkError> {
        match self.state {
            SinkState::Open | SinkState::Streaming => Ok(()),
            SinkState::Closed => Err(SinkError::Closed),
            state => Err(SinkError::InvalidState { frame, state }),
        }
    }

    async fn push_frame(&mut self, frame: &StreamFrame) -> Result<(), SinkError> {
        let bytes = encode_frame(frame).map_err(|e| SinkError::Encode(e.to_string()))?;
        self.push(bytes).await
    }

    async fn push(&mut self, bytes: Bytes) -> Result<(), SinkError> {
        let tx = self.tx.as_ref().ok_or(SinkError::Closed)?;
        tx.send(bytes).await.map_err(|_| SinkError::Closed)
    }
}

impl Drop for FrameSink {
    fn drop(&mut self) {
        self.close();
    }
}

/// How a driven turn ended. Every variant carries the text accumulated from
/// the deltas the provider produced.
#[derive(Debug)]
pub enum TurnOutcome {
    Completed { text: String },
    /// The caller disconnected or the token was cancelled.
    Aborted { text: String },
    Failed { text: String, error: LlmError },
}

impl TurnOutcome {
    pub fn text(&self) -> &str {
        match self {
            TurnOutcome::Completed { text }
            | TurnOutcome::Aborted { text }
            | TurnOutcome::Failed { text, .. } => text,
        }
    }
}

/// Pull deltas and push them as chunk frames.
///
/// Stops pulling as soon as `cancel` fires or a push fails; a failed push
/// also cancels `cancel`. When `keep_alive` is set, a comment frame is sent
/// on that interval so idle proxies keep the connection open.
pub async fn drive_turn(
    mut deltas: TextDeltaStream,
    sink: &mut FrameSink,
    cancel: &CancellationToken,
    keep_alive: Option<Duration>,
) -> TurnOutcome {
    let mut text = String::new();
    let mut ticker = keep_alive.map(|period| {
        let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval
    });

    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                debug!("Turn cancelled by caller");
                return TurnOutcome::Aborted { text };
            }

            next = deltas.next() => match next {
                Some(Ok(delta)) => {
                    text.push_str(&delta);
                    if sink.chunk(&delta).await.is_err() {
                        cancel.cancel();
                        return TurnOutcome::Aborted { text };
                    }
                }
                Some(Err(error)) => return TurnOutcome::Failed { text, error },
                None => return TurnOutcome::Completed { text },
            },

            _ = tick(&mut ticker) => {
                if sink.comment("keep-alive").await.is_err() {
                    cancel.cancel();
                    return TurnOutcome::Aborted { text };
                }
            }
        }
    }
}

async fn tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
