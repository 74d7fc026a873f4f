//! Route groups: named, chainable builders that submit routes to the `Router`.
//!
//! Every group kind shares one registration pipeline (`RouteGroup::register_route`):
//! compute the final path with the group's own `build_path` strategy, then hand the
//! record to the router. Group kinds differ only in their path policy and in the
//! metadata they attach.

use crate::error::{ConfigErrorKind, Error, Result};
use crate::rest_group::RestRouteGroup;
use crate::router::{HandlerRef, RouteRecord, Router, Verb};
use crate::stream_group::StreamRouteGroup;
use log::*;
use sse::StreamMetadata;

pub trait RouteGroup: Sized {
    fn name(&self) -> &str;

    /// Middleware names attached to every route this group registers, outermost first.
    fn middleware_list(&self) -> &[String];

    fn replace_middleware(&mut self, middleware: Vec<String>);

    fn router(&mut self) -> &mut Router;

    /// The final path a route registered as `path` is submitted under.
    fn build_path(&self, path: &str) -> String;

    /// Replace the group's middleware list.
    fn middleware<I, M>(mut self, middleware: I) -> Self
    where
        I: IntoIterator<Item = M>,
        M: Into<String>,
    {
        self.replace_middleware(middleware.into_iter().map(Into::into).collect());
        self
    }

    fn register_route(
        mut self,
        path: &str,
        verb: Verb,
        handler: HandlerRef,
        metadata: Option<StreamMetadata>,
    ) -> Result<Self> {
        let record = RouteRecord {
            path: self.build_path(path),
            verb,
            handler,
            middleware: self.middleware_list().to_vec(),
            metadata,
        };

        trace!("Group {} submitting {} {}", self.name(), verb, record.path);
        self.router().register_route(record)?;
        Ok(self)
    }
}

/// Creates a concrete route group bound to the application's router.
pub trait RouteBuilder {
    type Group<'r>: RouteGroup;

    fn group<'r>(router: &'r mut Router, name: &str) -> Result<Self::Group<'r>>;
}

/// Builder for conventional REST verb routes.
pub struct Rest;

/// Builder for Server-Sent Events routes.
pub struct Stream;

impl RouteBuilder for Rest {
    type Group<'r> = RestRouteGroup<'r>;

    fn group<'r>(router: &'r mut Router, name: &str) -> Result<RestRouteGroup<'r>> {
        Ok(RestRouteGroup::new(GroupCore::new(router, name)?))
    }
}

impl RouteBuilder for Stream {
    type Group<'r> = StreamRouteGroup<'r>;

    fn group<'r>(router: &'r mut Router, name: &str) -> Result<StreamRouteGroup<'r>> {
        Ok(StreamRouteGroup::new(GroupCore::new(router, name)?))
    }
}

/// State every group kind carries.
pub(crate) struct GroupCore<'r> {
    pub(crate) name: String,
    pub(crate) middleware: Vec<String>,
    pub(crate) router: &'r mut Router,
}

impl<'r> GroupCore<'r> {
    fn new(router: &'r mut Router, name: &str) -> Result<Self> {
        if name.is_empty() {
            return Err(Error::config(ConfigErrorKind::EmptyGroupName));
        }

        Ok(Self {
            name: name.to_string(),
            middleware: Vec::new(),
            router,
        })
    }
}
