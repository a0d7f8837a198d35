//! Shared domain types for GradePal.
//!
//! Identities, conversation threads and messages, academic records and the
//! per-turn snapshot built from them, LLM request/stream shapes, the framed
//! wire events of the chat stream, notification events, suggested prompts,
//! configuration, and the error enums shared by every layer.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod chat;
pub mod config;
pub mod error;
pub mod identity;
pub mod llm;
pub mod notification;
pub mod prompt;
pub mod records;
pub mod snapshot;
pub mod stream;
