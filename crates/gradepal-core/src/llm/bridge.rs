//! Completion bridge between chat turns and the LLM provider.
//!
//! Two entry points: [`CompletionBridge::complete`] for one-shot answers and
//! [`CompletionBridge::stream`] which yields plain text deltas. Every call
//! sends `[system, user]` where the system prompt already carries the
//! snapshot and conversation history.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_util::{Stream, StreamExt};
use tracing::{Instrument, info_span};

use gradepal_types::config::LlmConfig;
use gradepal_types::error::ChatError;
use gradepal_types::llm::{CompletionRequest, CompletionResponse, LlmError, Message, StreamEvent};

use super::box_provider::BoxLlmProvider;

/// A stream of non-empty text deltas.
pub type TextDeltaStream = Pin<Box<dyn Stream<Item = Result<String, LlmError>> + Send + 'static>>;

/// Model and sampling parameters for chat and title calls.
#[derive(Debug, Clone)]
pub struct CompletionSettings {
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub title_temperature: f64,
    pub title_max_tokens: u32,
}

impl From<&LlmConfig> for CompletionSettings {
    fn from(config: &LlmConfig) -> Self {
        Self {
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            title_temperature: config.title_temperature,
            title_max_tokens: config.title_max_tokens,
        }
    }
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self::from(&LlmConfig::default())
    }
}

/// Adapts a [`BoxLlmProvider`] to the needs of a chat turn.
#[derive(Clone)]
pub struct CompletionBridge {
    provider: Arc<BoxLlmProvider>,
    settings: CompletionSettings,
}

impl CompletionBridge {
    pub fn new(provider: BoxLlmProvider, settings: CompletionSettings) -> Self {
        Self {
            provider: Arc::new(provider),
            settings,
        }
    }

    pub fn settings(&self) -> &CompletionSettings {
        &self.settings
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// One-shot answer. Empty or whitespace-only content is an upstream failure.
    pub async fn complete(&self, system_prompt: &str, message: &str) -> Result<String, ChatError> {
        let request = self.chat_request(system_prompt, message, false);
        let span = info_span!(
            "gen_ai.complete",
            gen_ai.system = self.provider.name(),
            gen_ai.request.model = %request.model,
            gen_ai.request.max_tokens = request.max_tokens,
            gen_ai.request.temperature = ?request.temperature,
            gen_ai.request.stream = false,
        );

        let response = self
            .provider
            .complete(&request)
            .instrument(span)
            .await
            .map_err(|e| ChatError::UpstreamUnavailable(e.to_string()))?;

        let content = response.content.trim();
        if content.is_empty() {
            return Err(ChatError::UpstreamUnavailable(
                "provider returned no content".to_string(),
            ));
        }
        Ok(content.to_string())
    }

    /// Stream text deltas for a turn.
    ///
    /// Non-text provider events are dropped; the stream ends at the
    /// provider's `Done` event or when the provider stream ends. Dropping
    /// the returned stream stops pulling from the provider.
    pub fn stream(&self, system_prompt: &str, message: &str) -> TextDeltaStream {
        let request = self.chat_request(system_prompt, message, true);
        let span = info_span!(
            "gen_ai.stream",
            gen_ai.system = self.provider.name(),
            gen_ai.request.model = %request.model,
            gen_ai.request.max_tokens = request.max_tokens,
            gen_ai.request.temperature = ?request.temperature,
            gen_ai.request.stream = true,
        );

        let deltas = text_deltas(self.provider.stream(request));
        Box::pin(StreamInSpan {
            inner: deltas,
            span,
        })
    }

    /// Short auxiliary completion used for thread titles.
    pub async fn complete_title(
        &self,
        instructions: &str,
        message: &str,
    ) -> Result<CompletionResponse, LlmError> {
        let request = CompletionRequest {
            model: self.settings.model.clone(),
            messages: vec![Message::user(message)],
            system: Some(instructions.to_string()),
            max_tokens: self.settings.title_max_tokens,
            temperature: Some(self.settings.title_temperature),
            stream: false,
        };
        let span = info_span!(
            "gen_ai.title",
            gen_ai.system = self.provider.name(),
            gen_ai.request.model = %request.model,
            gen_ai.request.max_tokens = request.max_tokens,
        );
        self.provider.complete(&request).instrument(span).await
    }

    fn chat_request(&self, system_prompt: &str, message: &str, stream: bool) -> CompletionRequest {
        CompletionRequest {
            model: self.settings.model.clone(),
            messages: vec![Message::user(message)],
            system: Some(system_prompt.to_string()),
            max_tokens: self.settings.max_tokens,
            temperature: Some(self.settings.temperature),
            stream,
        }
    }
}

/// Reduce a provider event stream to its non-empty text deltas.
pub fn text_deltas(
    mut events: Pin<Box<dyn Stream<Item = Result<StreamEvent, LlmError>> + Send + 'static>>,
) -> TextDeltaStream {
    Box::pin(async_stream::try_stream! {
        while let Some(event) = events.next().await {
            match event? {
                StreamEvent::TextDelta { text } if !text.is_empty() => yield text,
                StreamEvent::Done => break,
                _ => {}
            }
        }
    })
}

/// Keeps a tracing span entered while the inner stream is polled, so the
/// span covers the whole streaming duration.
struct StreamInSpan {
    inner: TextDeltaStream,
    span: tracing::Span,
}

impl Stream for StreamInSpan {
    type Item = Result<String, LlmError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let _enter = this.span.enter();
        this.inner.as_mut().poll_next(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedProvider;

    fn bridge(provider: ScriptedProvider) -> CompletionBridge {
        CompletionBridge::new(BoxLlmProvider::new(provider), CompletionSettings::default())
    }

    #[tokio::test]
    async fn test_complete_trims_content() {
        let bridge = bridge(ScriptedProvider::replying("  Your GPA is 3.55.  "));
        let text = bridge.complete("sys", "what is my gpa").await.unwrap();
        assert_eq!(text, "Your GPA is 3.55.");
    }

    #[tokio::test]
    async fn test_complete_with_empty_content_is_upstream_unavailable() {
        let bridge = bridge(ScriptedProvider::replying("   "));
        let err = bridge.complete("sys", "hi").await.unwrap_err();
        assert!(matches!(err, ChatError::UpstreamUnavailable(_)));
    }

    #[tokio::test]
    async fn test_complete_maps_provider_errors() {
        let bridge = bridge(ScriptedProvider::failing());
        let err = bridge.complete("sys", "hi").await.unwrap_err();
        assert!(matches!(err, ChatError::UpstreamUnavailable(_)));
    }

    #[tokio::test]
    async fn test_stream_yields_only_non_empty_text() {
        let bridge = bridge(ScriptedProvider::streaming(&["Hel", "", "lo"]));
        let deltas: Vec<String> = bridge
            .stream("sys", "hi")
            .map(|d| d.unwrap())
            .collect()
            .await;
        assert_eq!(deltas, vec!["Hel".to_string(), "lo".to_string()]);
    }

    #[tokio::test]
    async fn test_stream_surfaces_mid_stream_errors() {
        let bridge = bridge(ScriptedProvider::streaming(&["partial"]).then_fail());
        let items: Vec<_> = bridge.stream("sys", "hi").collect().await;
        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert!(items[1].is_err());
    }

    #[tokio::test]
    async fn test_requests_carry_system_prompt_and_single_user_message() {
        let provider = ScriptedProvider::replying("ok");
        let seen = provider.requests();
        let bridge = bridge(provider);
        bridge.complete("SYSTEM", "question").await.unwrap();

        let requests = seen.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].system.as_deref(), Some("SYSTEM"));
        assert_eq!(requests[0].messages.len(), 1);
        assert_eq!(requests[0].messages[0].content, "question");
        assert_eq!(requests[0].temperature, Some(0.35));
        assert_eq!(requests[0].max_tokens, 768);
    }
}
