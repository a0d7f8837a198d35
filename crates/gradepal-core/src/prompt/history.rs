//! Bounded replay of prior conversation into the system prompt.

use gradepal_types::chat::{ChatMessage, ChatRole};
use gradepal_types::config::ChatConfig;

/// Keeps the most recent messages that fit both a count and a character
/// budget. Older messages are dropped, never the newest one.
#[derive(Debug, Clone, Copy)]
pub struct HistoryWindow {
    pub max_messages: usize,
    pub max_chars: usize,
}

impl From<&ChatConfig> for HistoryWindow {
    fn from(config: &ChatConfig) -> Self {
        Self {
            max_messages: config.history_max_messages,
            max_chars: config.history_max_chars,
        }
    }
}

/// Rendered history lines in chronological order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WindowedHistory {
    pub lines: Vec<String>,
    /// How many older messages did not fit.
    pub omitted: usize,
}

impl WindowedHistory {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty() && self.omitted == 0
    }
}

impl HistoryWindow {
    pub fn apply(&self, messages: &[ChatMessage]) -> WindowedHistory {
        let mut kept: Vec<String> = Vec::new();
        let mut chars = 0usize;

        for message in messages.iter().rev() {
            if kept.len() >= self.max_messages.max(1) {
                break;
            }
            let line = render(message);
            let len = line.chars().count();
            if !kept.is_empty() && chars + len > self.max_chars {
                break;
            }
            chars += len;
            kept.push(line);
        }

        kept.reverse();
        WindowedHistory {
            omitted: messages.len() - kept.len(),
            lines: kept,
        }
    }
}

fn render(message: &ChatMessage) -> String {
    let speaker = match message.role {
        ChatRole::User => "User",
        ChatRole::Assistant => "Assistant",
    };
    format!("{speaker}: {}", message.content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn conversation(n: usize) -> Vec<ChatMessage> {
        let thread_id = Uuid::now_v7();
        (0..n)
            .map(|i| ChatMessage {
                id: Uuid::now_v7(),
                thread_id,
                role: if i % 2 == 0 { ChatRole::User } else { ChatRole::Assistant },
                content: format!("m{i}"),
                created_at: Utc::now(),
            })
            .collect()
    }

    #[test]
    fn test_short_history_is_kept_whole_in_order() {
        let window = HistoryWindow {
            max_messages: 10,
            max_chars: 1_000,
        };
        let history = window.apply(&conversation(3));
        assert_eq!(history.lines, vec!["User: m0", "Assistant: m1", "User: m2"]);
        assert_eq!(history.omitted, 0);
    }

    #[test]
    fn test_count_limit_keeps_most_recent() {
        let window = HistoryWindow {
            max_messages: 2,
            max_chars: 1_000,
        };
        let history = window.apply(&conversation(5));
        assert_eq!(history.lines, vec!["Assistant: m3", "User: m4"]);
        assert_eq!(history.omitted, 3);
    }

    #[test]
    fn test_char_budget_drops_older_messages() {
        // Each rendered line is 8 or 13 characters.
        let window = HistoryWindow {
            max_messages: 10,
            max_chars: 22,
        };
        let history = window.apply(&conversation(4));
        assert_eq!(history.lines, vec!["User: m2", "Assistant: m3"]);
        assert_eq!(history.omitted, 2);
    }

    #[test]
    fn test_newest_message_survives_a_tiny_budget() {
        let window = HistoryWindow {
            max_messages: 10,
            max_chars: 1,
        };
        let history = window.apply(&conversation(2));
        assert_eq!(history.lines, vec!["Assistant: m1"]);
        assert_eq!(history.omitted, 1);
    }

    #[test]
    fn test_empty_conversation() {
        let window = HistoryWindow {
            max_messages: 10,
            max_chars: 100,
        };
        assert!(window.apply(&[]).is_empty());
    }
}
