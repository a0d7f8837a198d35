//! Out-of-band notifications pushed to connected clients.

pub mod bus;
