//! The application's route table.
//!
//! Route groups submit records here during startup. Once every group has registered
//! its routes, `into_axum` freezes the table into an `axum::Router`, which performs the
//! actual request matching.

use crate::error::{Error, Result, RouterErrorKind};
use crate::registry::{Controllers, Middleware, StreamSettings};
use crate::route_group::RouteBuilder;
use crate::sse::handler::stream_route;
use axum::routing::{MethodFilter, MethodRouter};
use log::*;
use sse::StreamMetadata;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    Post,
    Put,
    Delete,
}

impl Verb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Post => "POST",
            Verb::Put => "PUT",
            Verb::Delete => "DELETE",
        }
    }

    pub(crate) fn method_filter(&self) -> MethodFilter {
        match self {
            Verb::Get => MethodFilter::GET,
            Verb::Post => MethodFilter::POST,
            Verb::Put => MethodFilter::PUT,
            Verb::Delete => MethodFilter::DELETE,
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Names the code that serves a route: a controller and one of its methods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerRef {
    pub controller: String,
    pub method: String,
}

impl HandlerRef {
    pub fn new(controller: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            controller: controller.into(),
            method: method.into(),
        }
    }
}

impl fmt::Display for HandlerRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}::{}", self.controller, self.method)
    }
}

/// One registration as submitted by a route group.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteRecord {
    pub path: String,
    pub verb: Verb,
    pub handler: HandlerRef,
    /// Middleware names, outermost first.
    pub middleware: Vec<String>,
    /// Present only on streaming routes.
    pub metadata: Option<StreamMetadata>,
}

impl RouteRecord {
    pub fn is_stream(&self) -> bool {
        self.metadata.is_some()
    }

    /// The path the route is served at, always with a leading `/`.
    pub fn mount_path(&self) -> String {
        mount_path(&self.path)
    }
}

#[derive(Debug, Default)]
pub struct Router {
    routes: Vec<RouteRecord>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a route group of kind `B` bound to this table.
    pub fn group<B: RouteBuilder>(&mut self, name: &str) -> Result<B::Group<'_>> {
        B::group(self, name)
    }

    /// Add a route to the table.
    ///
    /// Fails on an empty path, on a `(path, verb)` pair that is already taken, and on
    /// a path that only differs from an existing one in its parameter names (such as
    /// `/users/:id` and `/users/:name`). Paths are compared as mounted, i.e. with a
    /// leading `/`.
    pub fn register_route(&mut self, record: RouteRecord) -> Result<()> {
        if record.path.is_empty() {
            return Err(Error::router(RouterErrorKind::EmptyPath));
        }

        let mounted = mount_path(&record.path);
        let shape = path_shape(&mounted);
        if let Some(existing) = self.routes.iter().find(|existing| {
            let existing = mount_path(&existing.path);
            existing != mounted && path_shape(&existing) == shape
        }) {
            return Err(Error::router(RouterErrorKind::ConflictingRoute {
                path: mounted,
                existing: mount_path(&existing.path),
            }));
        }

        if self
            .routes
            .iter()
            .any(|existing| existing.verb == record.verb && mount_path(&existing.path) == mounted)
        {
            return Err(Error::router(RouterErrorKind::DuplicateRoute {
                verb: record.verb.to_string(),
                path: mounted,
            }));
        }

        debug!(
            "Registered {} {} -> {}",
            record.verb, record.path, record.handler
        );
        self.routes.push(record);
        Ok(())
    }

    /// Registered routes, in registration order.
    pub fn routes(&self) -> &[RouteRecord] {
        &self.routes
    }

    /// Resolve every record's handler and middleware and build the axum router.
    ///
    /// Middleware is applied so that the first name in a record's list is the
    /// outermost layer and sees the request first.
    pub fn into_axum(
        self,
        controllers: &Controllers,
        middleware: &Middleware,
        streams: &StreamSettings,
    ) -> Result<axum::Router> {
        let mut app = axum::Router::new();

        for record in self.routes {
            let path = mount_path(&record.path);
            let mut method_router = resolve_handler(&record, &path, controllers, streams)?;

            for name in record.middleware.iter().rev() {
                let layer = middleware.resolve(name).ok_or_else(|| {
                    Error::router(RouterErrorKind::UnknownMiddleware(name.clone()))
                })?;
                method_router = layer(method_router);
            }

            info!(
                "Mounted {} {} -> {}{}",
                record.verb,
                path,
                record.handler,
                if record.is_stream() { " (stream)" } else { "" }
            );
            app = app.route(&path, method_router);
        }

        Ok(app)
    }
}

fn resolve_handler(
    record: &RouteRecord,
    path: &str,
    controllers: &Controllers,
    streams: &StreamSettings,
) -> Result<MethodRouter> {
    let unknown = || {
        Error::router(RouterErrorKind::UnknownController(
            record.handler.to_string(),
        ))
    };

    match record.metadata {
        Some(metadata) => {
            let controller = controllers
                .resolve_stream(&record.handler.controller)
                .ok_or_else(unknown)?;
            Ok(stream_route(controller, metadata, path, streams.clone()))
        }
        None => controllers
            .resolve_action(&record.handler, record.verb)
            .ok_or_else(unknown),
    }
}

/// `path` with every parameter name erased: `/users/:id/*rest` becomes `/users/:/*`.
fn path_shape(path: &str) -> String {
    path.split('/')
        .map(|segment| match segment.chars().next() {
            Some(marker @ (':' | '*')) => marker.to_string(),
            _ => segment.to_string(),
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn mount_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}
