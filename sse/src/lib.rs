//! Server-Sent Events (SSE) wire protocol and streaming response.
//!
//! This crate turns a long-running producer routine into an HTTP response that
//! pushes events to the client over one open connection.
//!
//! # Architecture
//!
//! - **Event**: immutable value object for one SSE message and its exact wire
//!   encoding (`id`, `retry`, `event`, one `data:` line per JSON line, blank line).
//! - **EventSink**: the output channel handed to a producer. Each `send` writes a
//!   complete frame as its own body chunk, in call order.
//! - **EventStreamResponse**: fixed SSE headers plus the producer. Drives the
//!   producer exactly once and ends the body when it returns.
//! - **StreamMetadata**: per-route connection policy (timeout, abort on client
//!   disconnect, automatic ids) applied by the response.
//! - **ConnectionRegistry**: optional bookkeeping of live streams.
//!
//! # Example: a streaming handler
//!
//! ```rust,ignore
//! use sse::{Event, EventStreamResponse};
//!
//! async fn build_log() -> EventStreamResponse {
//!     EventStreamResponse::new(|sink| async move {
//!         for line in ["compiling", "linking"] {
//!             if sink.send(Event::output(line)).is_err() {
//!                 return; // client went away
//!             }
//!         }
//!         let _ = sink.send(Event::progress(2, 2, Some("done")));
//!     })
//! }
//! ```
//!
//! # Modules
//!
//! - `event`: `Event` and its encoding
//! - `sink`: `EventSink` and per-connection id generation
//! - `response`: `EventStreamResponse`
//! - `metadata`: `StreamMetadata`
//! - `connection`: `ConnectionRegistry` with type-safe `ConnectionId`
//! - `error`: crate error type

pub mod connection;
pub mod error;
pub mod event;
pub mod metadata;
pub mod response;
pub mod sink;

pub use connection::ConnectionRegistry;
pub use event::Event;
pub use metadata::StreamMetadata;
pub use response::EventStreamResponse;
pub use sink::EventSink;
