//! Error types for the `sse` crate.
//!
//! Follows the same pattern as the other layers: a root `Error` struct holding an
//! `error_kind` and an optional `source` for error chaining.

use std::error::Error as StdError;
use std::fmt;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: ErrorKind,
}

/// Categories of errors raised while building or delivering events.
#[derive(Debug, PartialEq)]
pub enum ErrorKind {
    /// Event type is empty or contains a line break.
    InvalidEventType,
    /// Event id contains a line break.
    InvalidEventId,
    /// Event data could not be represented as a JSON object.
    Serialization,
    /// Stream timeout must be greater than zero seconds.
    InvalidTimeout,
    /// The client end of the stream is gone.
    Disconnected,
}

impl Error {
    pub fn new(error_kind: ErrorKind) -> Self {
        Self {
            source: None,
            error_kind,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.error_kind {
            ErrorKind::InvalidEventType => {
                write!(f, "SSE error: event type must be non-empty and single-line")
            }
            ErrorKind::InvalidEventId => write!(f, "SSE error: event id must be single-line"),
            ErrorKind::Serialization => match &self.source {
                Some(source) => write!(f, "SSE error: event data is not a JSON object: {source}"),
                None => write!(f, "SSE error: event data is not a JSON object"),
            },
            ErrorKind::InvalidTimeout => {
                write!(f, "SSE error: stream timeout must be greater than zero")
            }
            ErrorKind::Disconnected => write!(f, "SSE error: client disconnected"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error {
            source: Some(Box::new(err)),
            error_kind: ErrorKind::Serialization,
        }
    }
}
