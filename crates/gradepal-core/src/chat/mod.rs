//! Conversations: thread/message persistence, title generation, per-thread
//! turn serialisation, and the turn orchestrator that ties context, prompt,
//! provider and transport together.

pub mod repository;
pub mod service;
pub mod title;
pub mod turn;
pub mod turn_lock;
