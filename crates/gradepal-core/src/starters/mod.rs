//! Suggested conversation starters, filtered by the caller's role.

pub mod catalog;
