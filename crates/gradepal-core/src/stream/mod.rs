//! The framed chat stream, both ends.
//!
//! Server side: [`transport`] turns a stream of text deltas into framed
//! bytes pushed through a channel. Client side: [`parser`] recovers events
//! from arbitrary byte chunks, [`reveal`] paces on-screen text, and
//! [`consumer`] drives both and commits the finished turn.

pub mod consumer;
pub mod frame;
pub mod parser;
pub mod reveal;
pub mod transport;
