use crate::error::Result;
use crate::route_group::{GroupCore, RouteGroup};
use crate::router::{HandlerRef, Router, Verb};
use sse::metadata::DEFAULT_TIMEOUT_SECS;
use sse::StreamMetadata;

/// Stream controllers are always entered through this method.
pub const STREAM_HANDLER_METHOD: &str = "execute";

/// Route group for Server-Sent Events routes.
///
/// The connection policy set on the group is captured into each route's metadata at
/// the moment `event` is called; changing the group afterwards does not affect routes
/// already registered.
pub struct StreamRouteGroup<'r> {
    core: GroupCore<'r>,
    timeout: u64,
    abort_with_user: bool,
    enable_ids: bool,
}

impl<'r> StreamRouteGroup<'r> {
    pub(crate) fn new(core: GroupCore<'r>) -> Self {
        Self {
            core,
            timeout: DEFAULT_TIMEOUT_SECS,
            abort_with_user: true,
            enable_ids: false,
        }
    }

    pub fn enable_ids(mut self, enable: bool) -> Self {
        self.enable_ids = enable;
        self
    }

    /// Maximum connection lifetime in seconds. Zero is rejected when the next route
    /// is registered.
    pub fn timeout(mut self, seconds: u64) -> Self {
        self.timeout = seconds;
        self
    }

    pub fn abort_with_user(mut self, abort: bool) -> Self {
        self.abort_with_user = abort;
        self
    }

    /// Register a streaming route served by `controller`'s `execute`.
    pub fn event(self, path: &str, controller: &str) -> Result<Self> {
        let metadata = StreamMetadata::new(self.timeout, self.abort_with_user, self.enable_ids)?;

        self.register_route(
            path,
            Verb::Get,
            HandlerRef::new(controller, STREAM_HANDLER_METHOD),
            Some(metadata),
        )
    }
}

impl RouteGroup for StreamRouteGroup<'_> {
    fn name(&self) -> &str {
        &self.core.name
    }

    fn middleware_list(&self) -> &[String] {
        &self.core.middleware
    }

    fn replace_middleware(&mut self, middleware: Vec<String>) {
        self.core.middleware = middleware;
    }

    fn router(&mut self) -> &mut Router {
        &mut *self.core.router
    }

    // Streaming routes are never prefixed.
    fn build_path(&self, path: &str) -> String {
        path.to_string()
    }
}
