//! Thread title generation.
//!
//! A short auxiliary completion turns the first user message into a title of
//! at most five words. Any failure falls back to [`DEFAULT_THREAD_TITLE`];
//! it is logged and never surfaced.

use tracing::warn;

use gradepal_types::chat::DEFAULT_THREAD_TITLE;

use crate::llm::bridge::CompletionBridge;

const TITLE_INSTRUCTIONS: &str = "Generate a very short, concise title (max 5 words) for a chat conversation based on the first user message provided. Do not use quotes, periods, or prefixes like 'Title:'. Just the words.";

const MAX_TITLE_WORDS: usize = 5;

/// Generate a title for a thread seeded by `first_message`.
#[tracing::instrument(name = "generate_title", skip_all)]
pub async fn generate_title(bridge: &CompletionBridge, first_message: &str) -> String {
    match bridge.complete_title(TITLE_INSTRUCTIONS, first_message).await {
        Ok(response) => clean_title(&response.content)
            .unwrap_or_else(|| DEFAULT_THREAD_TITLE.to_string()),
        Err(e) => {
            warn!(error = %e, "Title generation failed, using default title");
            DEFAULT_THREAD_TITLE.to_string()
        }
    }
}

/// Strip quoting, a `Title:` prefix and trailing punctuation, and cap the
/// word count. `None` when nothing usable remains.
pub fn clean_title(raw: &str) -> Option<String> {
    let mut title = raw.lines().find(|l| !l.trim().is_empty())?.trim();

    for prefix in ["Title:", "title:", "TITLE:"] {
        if let Some(rest) = title.strip_prefix(prefix) {
            title = rest.trim();
        }
    }

    let title = title
        .trim_matches(|c| matches!(c, '"' | '\'' | '`' | '*'))
        .trim()
        .trim_end_matches(['.', '!', ','])
        .trim();

    let words: Vec<&str> = title.split_whitespace().take(MAX_TITLE_WORDS).collect();
    if words.is_empty() {
        None
    } else {
        Some(words.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::box_provider::BoxLlmProvider;
    use crate::llm::bridge::CompletionSettings;
    use crate::testing::ScriptedProvider;

    #[test]
    fn test_strips_quotes_and_prefix() {
        assert_eq!(clean_title("  \"Calculus Exam Prep\"  ").unwrap(), "Calculus Exam Prep");
        assert_eq!(clean_title("Title: GPA Questions.").unwrap(), "GPA Questions");
        assert_eq!(clean_title("'Study Plan'").unwrap(), "Study Plan");
    }

    #[test]
    fn test_caps_at_five_words() {
        assert_eq!(
            clean_title("How To Improve My Calculus Grade Quickly").unwrap(),
            "How To Improve My Calculus"
        );
    }

    #[test]
    fn test_blank_output_yields_none() {
        assert!(clean_title("   ").is_none());
        assert!(clean_title("\"\"").is_none());
    }

    #[tokio::test]
    async fn test_provider_failure_falls_back_to_default() {
        let bridge = CompletionBridge::new(
            BoxLlmProvider::new(ScriptedProvider::failing()),
            CompletionSettings::default(),
        );
        assert_eq!(generate_title(&bridge, "hello").await, DEFAULT_THREAD_TITLE);
    }

    #[tokio::test]
    async fn test_title_request_uses_short_budget() {
        let provider = ScriptedProvider::replying("Grades Overview");
        let seen = provider.requests();
        let bridge =
            CompletionBridge::new(BoxLlmProvider::new(provider), CompletionSettings::default());

        assert_eq!(generate_title(&bridge, "show my grades").await, "Grades Overview");
        let requests = seen.lock().unwrap();
        assert_eq!(requests[0].max_tokens, 20);
        assert_eq!(requests[0].temperature, Some(0.5));
        assert!(requests[0].system.as_deref().unwrap().contains("max 5 words"));
    }
}
