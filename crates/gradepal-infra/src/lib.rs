//! Infrastructure layer for GradePal.
//!
//! Implements the repository traits defined in `gradepal-core` on SQLite,
//! provides the OpenAI-compatible LLM provider, and loads configuration.

pub mod config;
pub mod llm;
pub mod sqlite;
