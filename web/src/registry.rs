//! Named handlers and middleware that route records refer to.
//!
//! A route record only carries names: `(controller, method)` for its handler and an
//! ordered list of middleware names. When the route table is mounted these names are
//! resolved against the registries below.

use crate::router::{HandlerRef, Verb};
use async_trait::async_trait;
use axum::handler::Handler;
use axum::http::HeaderMap;
use axum::routing::{on, MethodRouter};
use sse::{ConnectionRegistry, EventSink};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Everything a stream controller gets to know about the request that opened it.
#[derive(Debug, Clone, Default)]
pub struct StreamRequest {
    pub path_params: HashMap<String, String>,
    pub query: HashMap<String, String>,
    pub headers: HeaderMap,
}

impl StreamRequest {
    /// Parse a query parameter, falling back to `default` when missing or malformed.
    pub fn query_or<T: std::str::FromStr>(&self, name: &str, default: T) -> T {
        self.query
            .get(name)
            .and_then(|value| value.parse().ok())
            .unwrap_or(default)
    }
}

/// A controller behind a streaming route. `execute` is the producer routine: it runs
/// for the lifetime of the connection and pushes events onto `sink`.
#[async_trait]
pub trait StreamController: Send + Sync + 'static {
    async fn execute(&self, request: StreamRequest, sink: EventSink);
}

type ActionFactory = Arc<dyn Fn(Verb) -> MethodRouter + Send + Sync>;
type Layering = Arc<dyn Fn(MethodRouter) -> MethodRouter + Send + Sync>;

/// Controllers known to the application, keyed by controller name.
#[derive(Default, Clone)]
pub struct Controllers {
    actions: HashMap<(String, String), ActionFactory>,
    streams: HashMap<String, Arc<dyn StreamController>>,
}

impl Controllers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the axum handler behind `controller::method` for REST routes.
    pub fn action<H, T>(mut self, controller: &str, method: &str, handler: H) -> Self
    where
        H: Handler<T, ()> + Sync,
        T: 'static,
    {
        let factory: ActionFactory =
            Arc::new(move |verb: Verb| on(verb.method_filter(), handler.clone()));
        self.actions
            .insert((controller.to_string(), method.to_string()), factory);
        self
    }

    /// Register a stream controller; streaming routes always call its `execute`.
    pub fn stream<C: StreamController>(mut self, controller: &str, stream: C) -> Self {
        self.streams.insert(controller.to_string(), Arc::new(stream));
        self
    }

    pub(crate) fn resolve_action(&self, handler: &HandlerRef, verb: Verb) -> Option<MethodRouter> {
        self.actions
            .get(&(handler.controller.clone(), handler.method.clone()))
            .map(|factory| factory(verb))
    }

    pub(crate) fn resolve_stream(&self, controller: &str) -> Option<Arc<dyn StreamController>> {
        self.streams.get(controller).cloned()
    }
}

/// Middleware known to the application, keyed by the opaque names used on route groups.
#[derive(Default, Clone)]
pub struct Middleware {
    layers: HashMap<String, Layering>,
}

impl Middleware {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `layer` under `name`. It receives a route's `MethodRouter` and returns
    /// it wrapped, typically with `route_layer(from_fn(..))`.
    pub fn with<F>(mut self, name: &str, layer: F) -> Self
    where
        F: Fn(MethodRouter) -> MethodRouter + Send + Sync + 'static,
    {
        self.layers.insert(name.to_string(), Arc::new(layer));
        self
    }

    pub(crate) fn resolve(&self, name: &str) -> Option<Layering> {
        self.layers.get(name).cloned()
    }
}

/// Runtime settings shared by every streaming route.
#[derive(Clone, Default)]
pub struct StreamSettings {
    pub connections: Arc<ConnectionRegistry>,
    pub keep_alive: Option<Duration>,
}
