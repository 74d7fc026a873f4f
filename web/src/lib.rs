//! HTTP surface of the platform: declarative route groups, the route table and the
//! demo controllers behind it.
//!
//! Route groups (`RestRouteGroup`, `StreamRouteGroup`) register named handlers into a
//! `Router`; `Router::into_axum` resolves those names against the `Controllers` and
//! `Middleware` registries and produces the `axum::Router` that serves requests.

use ::sse::ConnectionRegistry;
use axum::http::header::{ACCEPT, CACHE_CONTROL, CONTENT_TYPE};
use axum::http::{HeaderName, HeaderValue, Method};
use log::*;
use service::config::Config;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

pub use error::{Error, Result};
pub use registry::{Controllers, Middleware, StreamController, StreamRequest, StreamSettings};
pub use rest_group::RestRouteGroup;
pub use route_group::{Rest, RouteBuilder, RouteGroup, Stream};
pub use router::{HandlerRef, RouteRecord, Router, Verb};
pub use routes::define_routes;
pub use stream_group::StreamRouteGroup;

mod controller;
pub mod error;
pub(crate) mod middleware;
pub mod registry;
pub mod rest_group;
pub mod route_group;
pub mod router;
mod routes;
pub(crate) mod sse;
pub mod stream_group;

/// Mount the application routes and serve them until the process exits.
pub async fn init_server(config: Config) -> Result<()> {
    let connections = Arc::new(ConnectionRegistry::new());
    let app = define_routes(&config, connections)?.layer(cors_layer(&config));

    let address = config.bind_address();
    info!("Server starting... listening for connections on http://{address}");

    let listener = TcpListener::bind(&address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {origin}");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_methods([Method::DELETE, Method::GET, Method::POST, Method::PUT])
        .allow_credentials(true)
        .allow_headers([
            ACCEPT,
            CACHE_CONTROL,
            CONTENT_TYPE,
            HeaderName::from_static("last-event-id"),
        ])
        .allow_origin(origins)
}
