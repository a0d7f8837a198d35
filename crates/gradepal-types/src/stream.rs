//! Framed events carried by the chat stream.
//!
//! Each event travels as `data: <payload>\n\n`. The payload is either the
//! literal [`DONE_SENTINEL`] or one of the JSON shapes of [`StreamFrame`].

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Raw terminator sent after the terminal JSON frame.
pub const DONE_SENTINEL: &str = "[DONE]";

/// Prefix of every data line.
pub const DATA_PREFIX: &str = "data: ";

/// Generic message sent in place of any upstream failure detail.
pub const STREAM_ERROR_MESSAGE: &str = "Chat service unavailable";

/// Committed in place of an assistant reply that produced no text.
pub const EMPTY_RESPONSE_MESSAGE: &str = "I received an empty response. Please try again.";

/// JSON payload of one stream event.
///
/// Untagged: the variant is recognised by which key is present, matching the
/// `{chunk}` / `{error}` / `{threadId, done}` shapes on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StreamFrame {
    Chunk {
        chunk: String,
    },
    Error {
        error: String,
    },
    Done {
        #[serde(rename = "threadId", default, skip_serializing_if = "Option::is_none")]
        thread_id: Option<Uuid>,
        done: bool,
        /// Full text, when the server chooses to declare it.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<String>,
    },
}

impl StreamFrame {
    pub fn chunk(text: impl Into<String>) -> Self {
        StreamFrame::Chunk { chunk: text.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        StreamFrame::Error {
            error: message.into(),
        }
    }

    pub fn done(thread_id: Uuid) -> Self {
        StreamFrame::Done {
            thread_id: Some(thread_id),
            done: true,
            text: None,
        }
    }
}
