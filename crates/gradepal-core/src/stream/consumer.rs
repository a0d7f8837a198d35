//! Client-side consumption of one streamed chat turn.
//!
//! A single task interleaves two sources with `tokio::select!`: the next
//! network read, and a reveal timer that moves the display cursor forward at
//! a fixed rate. The turn is committed to the [`Transcript`] only once the
//! network side has finished and the cursor has caught up.

use std::fmt::Display;
use std::time::Duration;

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use tokio::time::MissedTickBehavior;
use tracing::debug;
use uuid::Uuid;

use gradepal_types::chat::ChatRole;
use gradepal_types::error::ConsumerError;
use gradepal_types::stream::{EMPTY_RESPONSE_MESSAGE, StreamFrame};

use super::parser::{FrameParser, ParsedEvent};
use super::reveal::RevealCursor;

/// Callbacks fired while a turn is consumed. Every method defaults to a no-op.
pub trait StreamObserver {
    /// Raw delta text, as soon as it arrives.
    fn on_chunk(&mut self, _text: &str) {}

    /// Text newly moved past the display cursor.
    fn on_reveal(&mut self, _text: &str) {}

    /// The server created a thread for this turn.
    fn on_thread_created(&mut self, _thread_id: Uuid) {}

    fn on_error(&mut self, _message: &str) {}

    fn on_commit(&mut self, _entry: &TranscriptEntry) {}
}

impl StreamObserver for () {}

#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptEntry {
    pub role: ChatRole,
    pub content: String,
}

/// Visible conversation as the client shows it.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, role: ChatRole, content: impl Into<String>) -> &TranscriptEntry {
        self.entries.push(TranscriptEntry {
            role,
            content: content.into(),
        });
        &self.entries[self.entries.len() - 1]
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn last(&self) -> Option<&TranscriptEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Result of a consumed turn.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsumedTurn {
    /// The text committed as the assistant entry.
    pub text: String,
    /// Thread the turn belongs to, if known.
    pub thread_id: Option<Uuid>,
    /// Set when the server ended the turn with an `{error}` frame.
    pub server_error: Option<String>,
}

/// Drives one response body through the parser and the reveal cursor.
#[derive(Debug, Clone)]
pub struct StreamConsumer {
    chars_per_tick: usize,
    tick: Duration,
}

impl StreamConsumer {
    pub fn new(chars_per_tick: usize, tick: Duration) -> Self {
        Self {
            chars_per_tick,
            tick: tick.max(Duration::from_millis(1)),
        }
    }

    /// Consume `body` to its terminal event and commit exactly one assistant
    /// entry to `transcript`.
    ///
    /// A server `{error}` frame is committed as a visible apology and returns
    /// `Ok`. Network failures, malformed frames and a body that ends without
    /// a terminal event are reported to the observer and returned as `Err`,
    /// with nothing committed.
    pub async fn consume<S, E, O>(
        &self,
        body: S,
        current_thread: Option<Uuid>,
        observer: &mut O,
        transcript: &mut Transcript,
    ) -> Result<ConsumedTurn, ConsumerError>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: Display,
        O: StreamObserver + ?Sized,
    {
        let mut body = std::pin::pin!(body);
        let mut parser = FrameParser::new();
        let mut turn = TurnState {
            cursor: RevealCursor::new(self.chars_per_tick),
            final_text: None,
            thread_id: current_thread,
            network_done: false,
        };
        let mut reveal = tokio::time::interval(self.tick);
        reveal.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if turn.network_done && turn.cursor.is_caught_up() {
                let text = turn.committed_text();
                let entry = transcript.push(ChatRole::Assistant, text.clone());
                observer.on_commit(entry);
                return Ok(ConsumedTurn {
                    text,
                    thread_id: turn.thread_id,
                    server_error: None,
                });
            }

            tokio::select! {
                read = body.next(), if !turn.network_done => {
                    let eof = read.is_none();
                    let events = match read {
                        Some(Ok(bytes)) => parser.push(&bytes),
                        Some(Err(e)) => Err(ConsumerError::Network(e.to_string())),
                        None => parser.finish().map(|last| last.into_iter().collect()),
                    };
                    let events = match events {
                        Ok(events) => events,
                        Err(e) => return Err(report(observer, e)),
                    };

                    for event in events {
                        if let Some(message) = turn.apply(event, current_thread, observer) {
                            return Ok(commit_error(&turn, message, observer, transcript));
                        }
                    }
                    if eof && !turn.network_done {
                        return Err(report(observer, ConsumerError::Truncated));
                    }
                }

                _ = reveal.tick() => {
                    let revealed = turn.cursor.tick();
                    if !revealed.is_empty() {
                        observer.on_reveal(revealed);
                    }
                }
            }
        }
    }
}

struct TurnState {
    cursor: RevealCursor,
    final_text: Option<String>,
    thread_id: Option<Uuid>,
    network_done: bool,
}

impl TurnState {
    /// Apply one event. Returns the message of a server error frame.
    fn apply<O: StreamObserver + ?Sized>(
        &mut self,
        event: ParsedEvent,
        current_thread: Option<Uuid>,
        observer: &mut O,
    ) -> Option<String> {
        if self.network_done {
            return None;
        }
        match event {
            ParsedEvent::Frame(StreamFrame::Chunk { chunk }) => {
                self.cursor.push(&chunk);
                observer.on_chunk(&chunk);
            }
            ParsedEvent::Frame(StreamFrame::Done { done: false, .. }) => {
                debug!("Ignoring non-terminal done frame");
            }
            ParsedEvent::Frame(StreamFrame::Done {
                thread_id, text, ..
            }) => {
                self.final_text = text.filter(|t| !t.trim().is_empty());
                if let Some(id) = thread_id {
                    if current_thread != Some(id) {
                        observer.on_thread_created(id);
                    }
                    self.thread_id = Some(id);
                }
                self.network_done = true;
            }
            ParsedEvent::Frame(StreamFrame::Error { error }) => return Some(error),
            ParsedEvent::Terminator => {
                debug!("Stream terminator before a done frame");
                self.network_done = true;
            }
        }
        None
    }

    /// Server-declared text wins over the local buffer; empty becomes the
    /// fixed fallback.
    fn committed_text(&self) -> String {
        let text = self
            .final_text
            .clone()
            .unwrap_or_else(|| self.cursor.buffer().to_string());
        if text.trim().is_empty() {
            EMPTY_RESPONSE_MESSAGE.to_string()
        } else {
            text
        }
    }
}

fn commit_error<O: StreamObserver + ?Sized>(
    turn: &TurnState,
    message: String,
    observer: &mut O,
    transcript: &mut Transcript,
) -> ConsumedTurn {
    observer.on_error(&message);
    let text = format!("Sorry, I encountered an error: {message}");
    let entry = transcript.push(ChatRole::Assistant, text.clone());
    observer.on_commit(entry);
    ConsumedTurn {
        text,
        thread_id: turn.thread_id,
        server_error: Some(message),
    }
}

fn report<O: StreamObserver + ?Sized>(observer: &mut O, error: ConsumerError) -> ConsumerError {
    observer.on_error(&error.to_string());
    error
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    #[derive(Default)]
    struct Recorder {
        chunks: Vec<String>,
        revealed: String,
        created: Vec<Uuid>,
        errors: Vec<String>,
        commits: usize,
    }

    impl StreamObserver for Recorder {
        fn on_chunk(&mut self, text: &str) {
            self.chunks.push(text.to_string());
        }
        fn on_reveal(&mut self, text: &str) {
            self.revealed.push_str(text);
        }
        fn on_thread_created(&mut self, thread_id: Uuid) {
            self.created.push(thread_id);
        }
        fn on_error(&mut self, message: &str) {
            self.errors.push(message.to_string());
        }
        fn on_commit(&mut self, _entry: &TranscriptEntry) {
            self.commits += 1;
        }
    }

    fn body(parts: &[&str]) -> impl Stream<Item = Result<Bytes, std::io::Error>> {
        let items: Vec<Result<Bytes, std::io::Error>> = parts
            .iter()
            .map(|p| Ok(Bytes::copy_from_slice(p.as_bytes())))
            .collect();
        stream::iter(items)
    }

    fn consumer() -> StreamConsumer {
        StreamConsumer::new(4, Duration::from_millis(5))
    }

    #[tokio::test(start_paused = true)]
    async fn test_commits_once_after_reveal_catches_up() {
        let id = Uuid::now_v7();
        let done = format!("data: {{\"threadId\":\"{id}\",\"done\":true}}\n\ndata: [DONE]\n\n");
        let parts = [
            "data: {\"chunk\":\"Hel",
            "lo wor\"}\n\ndata: {\"chunk\":\"ld\"}\n\n",
            done.as_str(),
        ];
        let mut recorder = Recorder::default();
        let mut transcript = Transcript::new();

        let turn = consumer()
            .consume(body(&parts), None, &mut recorder, &mut transcript)
            .await
            .unwrap();

        assert_eq!(turn.text, "Hello world");
        assert_eq!(turn.thread_id, Some(id));
        assert_eq!(recorder.chunks, vec!["Hello wor", "ld"]);
        assert_eq!(recorder.revealed, "Hello world");
        assert_eq!(recorder.created, vec![id]);
        assert_eq!(recorder.commits, 1);
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript.last().unwrap().content, "Hello world");
    }

    #[tokio::test(start_paused = true)]
    async fn test_existing_thread_is_not_announced() {
        let id = Uuid::now_v7();
        let done = format!("data: {{\"chunk\":\"ok\"}}\n\ndata: {{\"threadId\":\"{id}\",\"done\":true}}\n\n");
        let mut recorder = Recorder::default();
        let mut transcript = Transcript::new();

        consumer()
            .consume(body(&[done.as_str()]), Some(id), &mut recorder, &mut transcript)
            .await
            .unwrap();
        assert!(recorder.created.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_server_declared_text_wins() {
        let parts = ["data: {\"chunk\":\"partial\"}\n\ndata: {\"done\":true,\"text\":\"full answer\"}\n\n"];
        let mut transcript = Transcript::new();
        let turn = consumer()
            .consume(body(&parts), None, &mut (), &mut transcript)
            .await
            .unwrap();
        assert_eq!(turn.text, "full answer");
    }

    #[tokio::test(start_paused = true)]
    async fn test_done_false_does_not_end_turn() {
        let parts = [
            "data: {\"chunk\":\"a\"}\n\n",
            "data: {\"done\":false}\n\n",
            "data: {\"chunk\":\"b\"}\n\n",
            "data: {\"done\":true}\n\ndata: [DONE]\n\n",
        ];
        let mut recorder = Recorder::default();
        let mut transcript = Transcript::new();

        let turn = consumer()
            .consume(body(&parts), None, &mut recorder, &mut transcript)
            .await
            .unwrap();
        assert_eq!(turn.text, "ab");
        assert_eq!(recorder.chunks, vec!["a", "b"]);
        assert_eq!(recorder.commits, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_completion_commits_fallback() {
        let parts = ["data: {\"done\":true}\n\ndata: [DONE]\n\n"];
        let mut transcript = Transcript::new();
        let turn = consumer()
            .consume(body(&parts), None, &mut (), &mut transcript)
            .await
            .unwrap();
        assert_eq!(turn.text, EMPTY_RESPONSE_MESSAGE);
        assert_eq!(transcript.entries()[0].content, EMPTY_RESPONSE_MESSAGE);
    }

    #[tokio::test(start_paused = true)]
    async fn test_server_error_is_committed_as_apology() {
        let parts = ["data: {\"chunk\":\"half\"}\n\ndata: {\"error\":\"Chat service unavailable\"}\n\n"];
        let mut recorder = Recorder::default();
        let mut transcript = Transcript::new();

        let turn = consumer()
            .consume(body(&parts), None, &mut recorder, &mut transcript)
            .await
            .unwrap();
        assert_eq!(turn.server_error.as_deref(), Some("Chat service unavailable"));
        assert_eq!(
            transcript.last().unwrap().content,
            "Sorry, I encountered an error: Chat service unavailable"
        );
        assert_eq!(recorder.errors, vec!["Chat service unavailable"]);
        assert_eq!(transcript.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_eof_without_terminal_event_is_truncated() {
        let parts = ["data: {\"chunk\":\"cut\"}\n\n"];
        let mut recorder = Recorder::default();
        let mut transcript = Transcript::new();

        let err = consumer()
            .consume(body(&parts), None, &mut recorder, &mut transcript)
            .await
            .unwrap_err();
        assert!(matches!(err, ConsumerError::Truncated));
        assert!(transcript.is_empty());
        assert_eq!(recorder.errors.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_network_error_is_reported() {
        let items: Vec<Result<Bytes, std::io::Error>> = vec![
            Ok(Bytes::from_static(b"data: {\"chunk\":\"a\"}\n\n")),
            Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset")),
        ];
        let mut transcript = Transcript::new();
        let err = consumer()
            .consume(stream::iter(items), None, &mut (), &mut transcript)
            .await
            .unwrap_err();
        assert!(matches!(err, ConsumerError::Network(_)));
        assert!(transcript.is_empty());
    }
}
