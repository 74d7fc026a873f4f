use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use sse::ConnectionRegistry;
use std::sync::Arc;

use crate::controller::ApiResponse;

/// GET the number of open event streams, overall and per path
pub async fn index(connections: Arc<ConnectionRegistry>, paths: Vec<String>) -> impl IntoResponse {
    let per_path: serde_json::Map<_, _> = paths
        .into_iter()
        .map(|path| {
            let count = connections.count_for_path(&path);
            (path, json!(count))
        })
        .collect();

    Json(ApiResponse::new(
        StatusCode::OK.into(),
        json!({ "open": connections.len(), "paths": per_path }),
    ))
}
