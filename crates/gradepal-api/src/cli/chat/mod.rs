//! Interactive terminal chat against a running server.
//!
//! Each message is sent to the streaming endpoint and consumed with the
//! reveal effect. Entry point: `loop_runner::run_chat_loop`.

pub mod banner;
pub mod commands;
pub mod loop_runner;
pub mod renderer;
