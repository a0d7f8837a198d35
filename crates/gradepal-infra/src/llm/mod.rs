//! LLM provider implementations.
//!
//! Contains the OpenAI-compatible provider (Groq by default) and a factory
//! ([`create_provider`]) that builds it from `[llm]` settings plus the API key
//! found in the environment.

pub mod openai_compat;

use secrecy::SecretString;
use tracing::warn;

use gradepal_core::llm::box_provider::BoxLlmProvider;
use gradepal_types::config::LlmConfig;

use self::openai_compat::OpenAiCompatibleProvider;
use self::openai_compat::config::{OpenAiCompatConfig, api_key_from_env};

/// Create a [`BoxLlmProvider`] from `[llm]` settings.
///
/// A missing key is not fatal: the provider is still built so the server can
/// start, and every call then fails with an authentication error that the
/// HTTP layer reports as an unavailable upstream.
pub fn create_provider(config: &LlmConfig) -> BoxLlmProvider {
    let api_key = api_key_from_env(config).unwrap_or_else(|| {
        warn!(
            env = %config.api_key_env,
            provider = %config.provider_name,
            "LLM API key not set; chat requests will fail"
        );
        SecretString::from(String::new())
    });
    create_provider_with_key(config, api_key)
}

/// Create a [`BoxLlmProvider`] with an explicitly supplied key.
pub fn create_provider_with_key(config: &LlmConfig, api_key: SecretString) -> BoxLlmProvider {
    let provider =
        OpenAiCompatibleProvider::new(OpenAiCompatConfig::from_llm_config(config, api_key));
    BoxLlmProvider::new(provider)
}
