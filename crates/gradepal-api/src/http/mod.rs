//! HTTP/REST API layer for GradePal.
//!
//! Axum-based REST API at `/api/v1/` with bearer token authentication,
//! envelope response format, and streamed chat/notification endpoints.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod response;
pub mod router;
pub mod sse;

#[cfg(test)]
mod test_support;
