//! Configuration for OpenAI-compatible providers.

use secrecy::SecretString;

use gradepal_types::config::LlmConfig;

/// Connection settings for an [`super::OpenAiCompatibleProvider`].
///
/// Does not implement Debug; the key is only reachable through
/// `secrecy::ExposeSecret`.
pub struct OpenAiCompatConfig {
    /// Human-readable provider name (e.g., "groq").
    pub provider_name: String,
    pub base_url: String,
    pub api_key: SecretString,
    /// Default model, used when a request leaves `model` empty.
    pub model: String,
}

impl OpenAiCompatConfig {
    /// Build from `[llm]` settings with an already-resolved key.
    pub fn from_llm_config(config: &LlmConfig, api_key: SecretString) -> Self {
        Self {
            provider_name: config.provider_name.clone(),
            base_url: config.base_url.clone(),
            api_key,
            model: config.model.clone(),
        }
    }
}

/// Groq default configuration.
///
/// Base URL: `https://api.groq.com/openai/v1`
pub fn groq_defaults(api_key: SecretString, model: &str) -> OpenAiCompatConfig {
    OpenAiCompatConfig {
        provider_name: "groq".into(),
        base_url: "https://api.groq.com/openai/v1".into(),
        api_key,
        model: model.into(),
    }
}

/// Read the API key from the environment variable named by
/// `config.api_key_env`. `None` when unset or blank.
pub fn api_key_from_env(config: &LlmConfig) -> Option<SecretString> {
    std::env::var(&config.api_key_env)
        .ok()
        .filter(|key| !key.trim().is_empty())
        .map(SecretString::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_groq_defaults() {
        let config = groq_defaults(
            SecretString::from("gsk-test".to_string()),
            "llama-3.3-70b-versatile",
        );
        assert_eq!(config.provider_name, "groq");
        assert_eq!(config.base_url, "https://api.groq.com/openai/v1");
        assert_eq!(config.api_key.expose_secret(), "gsk-test");
    }

    #[test]
    fn test_from_llm_config_follows_settings() {
        let mut llm = LlmConfig::default();
        llm.base_url = "http://localhost:11434/v1".to_string();
        llm.provider_name = "local".to_string();
        let config = OpenAiCompatConfig::from_llm_config(&llm, SecretString::from("k".to_string()));
        assert_eq!(config.provider_name, "local");
        assert_eq!(config.base_url, "http://localhost:11434/v1");
        assert_eq!(config.model, llm.model);
    }
}
