//! LLM provider abstractions for GradePal.
//!
//! - `LlmProvider`: RPITIT trait for concrete provider implementations
//! - `BoxLlmProvider`: object-safe wrapper for dynamic dispatch
//! - `CompletionBridge`: one-shot and delta-streaming entry points used by
//!   chat turns and title generation

pub mod box_provider;
pub mod bridge;
pub mod provider;
