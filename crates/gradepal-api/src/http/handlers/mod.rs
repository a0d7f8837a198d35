//! HTTP request handlers for the REST API.

pub mod chat;
pub mod grades;
pub mod notifications;
pub mod prompts;
