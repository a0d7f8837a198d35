//! HTTP client for the `chat`, `threads` and `history` commands and the chat
//! loop's `/prompts`.
//!
//! Talks to a running `gradepal serve` with a bearer token. JSON endpoints
//! are unwrapped from the `{data, meta}` envelope; the stream endpoint hands
//! back the raw byte stream for the stream consumer.

use bytes::Bytes;
use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use gradepal_types::chat::{ChatMessage, ChatRequest, ChatThread, ThreadHistory, ThreadList};
use gradepal_types::prompt::{Prompt, PromptList};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with an error envelope.
    #[error("{code}: {message}")]
    Api { code: String, message: String },

    #[error("server returned {0} without an error body")]
    Status(reqwest::StatusCode),
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    errors: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Bearer-authenticated client for one server.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl ApiClient {
    pub fn new(base_url: &str, token: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{path}", self.base_url)
    }

    /// Open a streamed chat turn. Request-level failures (validation, unknown
    /// thread, busy thread) arrive here as `ClientError::Api` before any
    /// frame is read.
    pub async fn stream_chat(
        &self,
        message: &str,
        thread_id: Option<Uuid>,
    ) -> Result<BoxStream<'static, Result<Bytes, reqwest::Error>>, ClientError> {
        let request = ChatRequest {
            message: message.to_string(),
            thread_id: thread_id.map(|id| id.to_string()),
        };
        let response = self
            .http
            .post(self.url("/chat/stream"))
            .bearer_auth(&self.token)
            .json(&request)
            .send()
            .await?;
        let response = check_status(response).await?;
        Ok(response.bytes_stream().boxed())
    }

    pub async fn threads(&self) -> Result<Vec<ChatThread>, ClientError> {
        let list: ThreadList = self.get_json(&self.url("/chat/threads")).await?;
        Ok(list.threads)
    }

    pub async fn history(&self, thread_id: Uuid) -> Result<Vec<ChatMessage>, ClientError> {
        let url = self.url(&format!("/chat/history?threadId={thread_id}"));
        let history: ThreadHistory = self.get_json(&url).await?;
        Ok(history.history)
    }

    /// Suggested prompts for the token's role.
    pub async fn prompts(&self) -> Result<Vec<Prompt>, ClientError> {
        let list: PromptList = self.get_json(&self.url("/prompts")).await?;
        Ok(list.prompts)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ClientError> {
        let response = self.http.get(url).bearer_auth(&self.token).send().await?;
        let response = check_status(response).await?;
        let envelope: Envelope<T> = response.json().await?;
        Ok(envelope.data)
    }
}

/// Turn a non-success response into `ClientError`, reading the error
/// envelope when there is one.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.bytes().await?;
    Err(api_error(status, &body))
}

fn api_error(status: reqwest::StatusCode, body: &[u8]) -> ClientError {
    match serde_json::from_slice::<ErrorEnvelope>(body) {
        Ok(envelope) => match envelope.errors.into_iter().next() {
            Some(detail) => ClientError::Api {
                code: detail.code,
                message: detail.message,
            },
            None => ClientError::Status(status),
        },
        Err(_) => ClientError::Status(status),
    }
}
