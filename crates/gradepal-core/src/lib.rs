//! Business logic and repository trait definitions for gradepal.
//!
//! This crate defines the "ports" (repository traits and the LLM provider
//! trait) that the infrastructure layer implements. It depends only on
//! `gradepal-types` -- never on `gradepal-infra` or any database/IO crate.

pub mod chat;
pub mod context;
pub mod llm;
pub mod notify;
pub mod prompt;
pub mod records;
pub mod starters;
pub mod stream;

#[cfg(test)]
mod testing;
