//! The demo application's route table.

use crate::controller::job_stream_controller::JobStreamController;
use crate::controller::log_stream_controller::LogStreamController;
use crate::controller::{health_check_controller, job_controller, stream_status_controller};
use crate::error::Result;
use crate::middleware::request_log::log_request;
use crate::registry::{Controllers, Middleware, StreamSettings};
use crate::route_group::{Rest, RouteGroup, Stream};
use crate::router::Router;
use axum::middleware::from_fn;
use service::config::Config;
use sse::ConnectionRegistry;
use std::sync::Arc;

const LOG_REQUEST: &str = "log_request";

/// Register every route group and mount the result as an `axum::Router`.
///
/// `connections` is shared by all streaming routes and backs `GET /streams`.
pub fn define_routes(config: &Config, connections: Arc<ConnectionRegistry>) -> Result<axum::Router> {
    let mut router = Router::new();

    health_routes(&mut router)?;
    job_routes(&mut router)?;
    stream_routes(&mut router)?;
    stream_status_routes(&mut router)?;

    let tracked_paths = stream_paths(&router);

    let status_connections = connections.clone();
    let controllers = Controllers::new()
        .action(
            "HealthCheckController",
            "index",
            health_check_controller::health_check,
        )
        .action("JobController", "index", job_controller::index)
        .action("JobController", "create", job_controller::create)
        .action("StreamStatusController", "index", move || {
            stream_status_controller::index(status_connections.clone(), tracked_paths.clone())
        })
        .stream("JobStreamController", JobStreamController)
        .stream("LogStreamController", LogStreamController);

    let middleware =
        Middleware::new().with(LOG_REQUEST, |route| route.route_layer(from_fn(log_request)));

    let settings = StreamSettings {
        connections,
        keep_alive: config.stream_keep_alive(),
    };

    router.into_axum(&controllers, &middleware, &settings)
}

/// Streaming routes as their connections are tracked, i.e. by mounted path.
fn stream_paths(router: &Router) -> Vec<String> {
    router
        .routes()
        .iter()
        .filter(|route| route.is_stream())
        .map(|route| route.mount_path())
        .collect()
}

fn health_routes(router: &mut Router) -> Result<()> {
    router
        .group::<Rest>("health")?
        .default_controller("HealthCheckController")
        .get("/health", "index", None)?;
    Ok(())
}

fn job_routes(router: &mut Router) -> Result<()> {
    router
        .group::<Rest>("api")?
        .prefix("api")
        .default_controller("JobController")
        .middleware([LOG_REQUEST])
        .get("/jobs", "index", None)?
        .post("/jobs", "create", None)?;
    Ok(())
}

fn stream_routes(router: &mut Router) -> Result<()> {
    router
        .group::<Stream>("jobs")?
        .middleware([LOG_REQUEST])
        .timeout(300)
        .event("/jobs/stream", "JobStreamController")?
        // Log replay runs to the end even if its reader leaves.
        .abort_with_user(false)
        .timeout(60)
        .enable_ids(true)
        .event("/logs/stream", "LogStreamController")?;
    Ok(())
}

fn stream_status_routes(router: &mut Router) -> Result<()> {
    router
        .group::<Rest>("streams")?
        .get("/streams", "index", "StreamStatusController")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::extract::Request;
    use axum::http::{header, Method, StatusCode};
    use axum::response::Response;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> (axum::Router, Arc<ConnectionRegistry>) {
        let config = Config::from_args(["route_stream_rs", "--stream-keep-alive-secs", "0"]);
        let connections = Arc::new(ConnectionRegistry::new());
        let app = define_routes(&config, connections.clone()).unwrap();
        (app, connections)
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn get(uri: &str) -> Request {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[test]
    fn stream_paths_are_reported_as_mounted() {
        let mut router = Router::new();
        router
            .group::<Rest>("health")
            .unwrap()
            .get("/health", "index", "HealthCheckController")
            .unwrap();
        router
            .group::<Stream>("tail")
            .unwrap()
            .event("logs/tail", "LogStreamController")
            .unwrap()
            .event("/jobs/stream", "JobStreamController")
            .unwrap();

        assert_eq!(stream_paths(&router), vec!["/logs/tail", "/jobs/stream"]);
    }

    #[tokio::test]
    async fn health_check_responds() {
        let (app, _) = app();
        let response = app.oneshot(get("/health")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "healthy");
    }

    #[tokio::test]
    async fn job_routes_are_mounted_under_the_api_prefix() {
        let (app, _) = app();

        let response = app.clone().oneshot(get("/api/jobs")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/jobs")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"name":"lint","steps":2}"#))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app.oneshot(get("/jobs")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn job_stream_runs_to_completion() {
        let (app, connections) = app();

        let response = app
            .oneshot(get("/jobs/stream?name=lint&steps=2&interval_ms=1"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/event-stream"
        );

        let body = body_text(response).await;
        assert_eq!(body.matches("event: progress\n").count(), 2);
        assert!(body.ends_with("event: complete\ndata: {\"name\":\"lint\",\"steps\":2}\n\n"));
        assert!(connections.is_empty());
    }

    #[tokio::test]
    async fn log_stream_numbers_its_events() {
        let (app, _) = app();

        let response = app
            .oneshot(get("/logs/stream?interval_ms=0&fail_at=2"))
            .await
            .unwrap();

        let body = body_text(response).await;
        assert!(body.starts_with("id: 1\nevent: output\n"));
        assert!(body.contains("id: 2\nevent: error\n"));
    }

    #[tokio::test]
    async fn stream_status_reports_open_connections() {
        let (app, connections) = app();
        let _open = connections.register("/jobs/stream", sse::StreamMetadata::default());

        let response = app.oneshot(get("/streams")).await.unwrap();
        let body: Value = serde_json::from_str(&body_text(response).await).unwrap();

        assert_eq!(
            body["data"],
            json!({"open": 1, "paths": {"/jobs/stream": 1, "/logs/stream": 0}})
        );
    }
}
