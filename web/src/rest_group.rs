use crate::error::{ConfigErrorKind, Error, Result};
use crate::route_group::{GroupCore, RouteGroup};
use crate::router::{HandlerRef, Router, Verb};

/// Route group for conventional REST verb routes.
///
/// Paths are joined onto an optional prefix, and verb methods fall back to the
/// group's default controller when none is given.
pub struct RestRouteGroup<'r> {
    core: GroupCore<'r>,
    prefix: Option<String>,
    default_controller: Option<String>,
}

impl<'r> RestRouteGroup<'r> {
    pub(crate) fn new(core: GroupCore<'r>) -> Self {
        Self {
            core,
            prefix: None,
            default_controller: None,
        }
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn default_controller(mut self, controller: impl Into<String>) -> Self {
        self.default_controller = Some(controller.into());
        self
    }

    pub fn get<'c>(
        self,
        path: &str,
        method: &str,
        controller: impl Into<Option<&'c str>>,
    ) -> Result<Self> {
        self.verb(Verb::Get, path, method, controller.into())
    }

    pub fn post<'c>(
        self,
        path: &str,
        method: &str,
        controller: impl Into<Option<&'c str>>,
    ) -> Result<Self> {
        self.verb(Verb::Post, path, method, controller.into())
    }

    pub fn put<'c>(
        self,
        path: &str,
        method: &str,
        controller: impl Into<Option<&'c str>>,
    ) -> Result<Self> {
        self.verb(Verb::Put, path, method, controller.into())
    }

    pub fn delete<'c>(
        self,
        path: &str,
        method: &str,
        controller: impl Into<Option<&'c str>>,
    ) -> Result<Self> {
        self.verb(Verb::Delete, path, method, controller.into())
    }

    fn verb(self, verb: Verb, path: &str, method: &str, controller: Option<&str>) -> Result<Self> {
        let controller = match controller {
            Some(controller) => controller.to_string(),
            None => self
                .default_controller
                .clone()
                .ok_or_else(|| Error::config(ConfigErrorKind::MissingDefaultController))?,
        };

        self.register_route(path, verb, HandlerRef::new(controller, method), None)
    }
}

impl RouteGroup for RestRouteGroup<'_> {
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

    /// `prefix + "/" + path`, with one leading `/` removed from `path`; `path`
    /// unchanged when no prefix is set.
    fn build_path(&self, path: &str) -> String {
        match &self.prefix {
            Some(prefix) => {
                let path = path.strip_prefix('/').unwrap_or(path);
                format!("{prefix}/{path}")
            }
            None => path.to_string(),
        }
    }
}
