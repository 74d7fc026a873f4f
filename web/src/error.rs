//! Error types for the `web` layer.
//!
//! Route registration errors are programmer errors: they surface while the route
//! table is being built, before the server accepts a single request.
use std::error::Error as StdError;
use std::fmt;

use sse::error::{Error as SseError, ErrorKind as SseErrorKind};

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: ErrorKind,
}

#[derive(Debug, PartialEq)]
pub enum ErrorKind {
    /// A route group was configured in a way that cannot produce a valid route.
    Config(ConfigErrorKind),
    /// The route table rejected a registration or could not be mounted.
    Router(RouterErrorKind),
    /// Any other failure from the `sse` layer; details are in `source`.
    Stream,
    /// Binding or serving the HTTP listener failed.
    Server,
}

#[derive(Debug, PartialEq)]
pub enum ConfigErrorKind {
    EmptyGroupName,
    /// A verb was registered without a controller and the group has no default.
    MissingDefaultController,
    /// Stream timeout must be greater than zero seconds.
    InvalidTimeout,
}

#[derive(Debug, PartialEq)]
pub enum RouterErrorKind {
    EmptyPath,
    DuplicateRoute { verb: String, path: String },
    /// Same path as an existing route except for its parameter names.
    ConflictingRoute { path: String, existing: String },
    UnknownController(String),
    UnknownMiddleware(String),
}

impl Error {
    pub fn config(kind: ConfigErrorKind) -> Self {
        Self {
            source: None,
            error_kind: ErrorKind::Config(kind),
        }
    }

    pub fn router(kind: RouterErrorKind) -> Self {
        Self {
            source: None,
            error_kind: ErrorKind::Router(kind),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.error_kind {
            ErrorKind::Config(ConfigErrorKind::EmptyGroupName) => {
                write!(f, "Route config error: group name must not be empty")
            }
            ErrorKind::Config(ConfigErrorKind::MissingDefaultController) => write!(
                f,
                "Route config error: no controller given and no default controller set"
            ),
            ErrorKind::Config(ConfigErrorKind::InvalidTimeout) => {
                write!(f, "Route config error: stream timeout must be greater than zero")
            }
            ErrorKind::Router(RouterErrorKind::EmptyPath) => {
                write!(f, "Router error: route path must not be empty")
            }
            ErrorKind::Router(RouterErrorKind::DuplicateRoute { verb, path }) => {
                write!(f, "Router error: {verb} {path} is already registered")
            }
            ErrorKind::Router(RouterErrorKind::ConflictingRoute { path, existing }) => {
                write!(f, "Router error: {path} conflicts with {existing}")
            }
            ErrorKind::Router(RouterErrorKind::UnknownController(name)) => {
                write!(f, "Router error: no handler registered for {name}")
            }
            ErrorKind::Router(RouterErrorKind::UnknownMiddleware(name)) => {
                write!(f, "Router error: unknown middleware '{name}'")
            }
            ErrorKind::Stream => match &self.source {
                Some(source) => write!(f, "Stream error: {source}"),
                None => write!(f, "Stream error"),
            },
            ErrorKind::Server => match &self.source {
                Some(source) => write!(f, "Server error: {source}"),
                None => write!(f, "Server error"),
            },
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

impl From<SseError> for Error {
    fn from(err: SseError) -> Self {
        let error_kind = match err.error_kind {
            SseErrorKind::InvalidTimeout => ErrorKind::Config(ConfigErrorKind::InvalidTimeout),
            _ => ErrorKind::Stream,
        };

        Error {
            source: Some(Box::new(err)),
            error_kind,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error {
            source: Some(Box::new(err)),
            error_kind: ErrorKind::Server,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_stream_timeout_becomes_a_config_error() {
        let err: Error = SseError::new(SseErrorKind::InvalidTimeout).into();
        assert_eq!(
            err.error_kind,
            ErrorKind::Config(ConfigErrorKind::InvalidTimeout)
        );
        assert!(err.source().is_some());
    }

    #[test]
    fn other_sse_errors_keep_their_source() {
        let err: Error = SseError::new(SseErrorKind::Disconnected).into();
        assert_eq!(err.error_kind, ErrorKind::Stream);
        assert!(err.to_string().starts_with("Stream error: "));
    }

    #[test]
    fn duplicate_route_message_names_the_route() {
        let err = Error::router(RouterErrorKind::DuplicateRoute {
            verb: "GET".to_string(),
            path: "/health".to_string(),
        });
        assert_eq!(
            err.to_string(),
            "Router error: GET /health is already registered"
        );
    }
}
