//! Global configuration types for GradePal.
//!
//! `AppConfig` represents the top-level `config.toml` in the data directory.
//! Every field has a default, so an empty or partial file is valid.

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub context: ContextLimits,
    #[serde(default)]
    pub client: RevealConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Interval between `: keep-alive` comment frames on open streams.
    #[serde(default = "default_keep_alive_secs")]
    pub keep_alive_secs: u64,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_keep_alive_secs() -> u64 {
    15
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            keep_alive_secs: default_keep_alive_secs(),
        }
    }
}

/// Provider and sampling settings.
///
/// The API key itself is never stored here; `api_key_env` names the
/// environment variable it is read from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_provider_name")]
    pub provider_name: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_title_temperature")]
    pub title_temperature: f64,
    #[serde(default = "default_title_max_tokens")]
    pub title_max_tokens: u32,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

fn default_provider_name() -> String {
    "groq".to_string()
}

fn default_base_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_model() -> String {
    "llama-3.3-70b-versatile".to_string()
}

fn default_temperature() -> f64 {
    0.35
}

fn default_max_tokens() -> u32 {
    768
}

fn default_title_temperature() -> f64 {
    0.5
}

fn default_title_max_tokens() -> u32 {
    20
}

fn default_api_key_env() -> String {
    "GROQ_API_KEY".to_string()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider_name: default_provider_name(),
            base_url: default_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            title_temperature: default_title_temperature(),
            title_max_tokens: default_title_max_tokens(),
            api_key_env: default_api_key_env(),
        }
    }
}

/// Bounds on how much prior conversation is replayed into the prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    #[serde(default = "default_history_max_messages")]
    pub history_max_messages: usize,
    #[serde(default = "default_history_max_chars")]
    pub history_max_chars: usize,
}

fn default_history_max_messages() -> usize {
    20
}

fn default_history_max_chars() -> usize {
    24_000
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            history_max_messages: default_history_max_messages(),
            history_max_chars: default_history_max_chars(),
        }
    }
}

/// Per-list caps applied by the context aggregator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextLimits {
    #[serde(default = "default_max_subjects")]
    pub subjects: usize,
    #[serde(default = "default_max_assessments")]
    pub assessments: usize,
    #[serde(default = "default_max_grades")]
    pub grades: usize,
    #[serde(default = "default_max_students")]
    pub students: usize,
    #[serde(default = "default_max_recent_grades")]
    pub recent_grades: usize,
}

fn default_max_subjects() -> usize {
    24
}

fn default_max_assessments() -> usize {
    32
}

fn default_max_grades() -> usize {
    32
}

fn default_max_students() -> usize {
    40
}

fn default_max_recent_grades() -> usize {
    32
}

impl Default for ContextLimits {
    fn default() -> Self {
        Self {
            subjects: default_max_subjects(),
            assessments: default_max_assessments(),
            grades: default_max_grades(),
            students: default_max_students(),
            recent_grades: default_max_recent_grades(),
        }
    }
}

/// Typewriter reveal rate used by the terminal client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevealConfig {
    #[serde(default = "default_chars_per_tick")]
    pub chars_per_tick: usize,
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

fn default_chars_per_tick() -> usize {
    10
}

fn default_tick_ms() -> u64 {
    5
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            chars_per_tick: default_chars_per_tick(),
            tick_ms: default_tick_ms(),
        }
    }
}
