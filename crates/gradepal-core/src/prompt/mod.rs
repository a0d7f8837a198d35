//! System prompt assembly: snapshot sections, bounded conversation replay,
//! and the fixed behavioural blocks.

pub mod builder;
pub mod history;
