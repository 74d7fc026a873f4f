//! SSE HTTP handler for the web layer.
//!
//! This module only adapts stream controllers to axum handlers. The event encoding,
//! response wrapper and connection bookkeeping live in the `sse` crate.

pub mod handler;
