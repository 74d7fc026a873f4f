use axum::{extract::Request, middleware::Next, response::Response};
use log::*;
use std::time::Instant;

/// Logs method, path, status and time-to-headers for every request on the route.
///
/// For streaming routes the status line is logged as soon as the stream opens; the
/// connection itself stays open afterwards.
pub async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    info!(
        "{} {} -> {} ({:?})",
        method,
        path,
        response.status().as_u16(),
        started.elapsed()
    );
    response
}
