use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use log::*;
use serde::{Deserialize, Serialize};

use crate::controller::ApiResponse;

const DEFAULT_STEPS: u32 = 5;
const MAX_STEPS: u32 = 1_000;

/// A job the demo application knows how to run over a stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Job {
    pub name: String,
    pub steps: u32,
    pub stream_url: String,
}

impl Job {
    fn new(name: &str, steps: u32) -> Self {
        Self {
            name: name.to_string(),
            steps,
            stream_url: format!("/jobs/stream?name={name}&steps={steps}"),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateJobParams {
    pub name: String,
    pub steps: Option<u32>,
}

/// GET the jobs available to stream
pub async fn index() -> impl IntoResponse {
    debug!("GET all Jobs");

    let jobs = vec![
        Job::new("build", DEFAULT_STEPS),
        Job::new("test", 10),
        Job::new("deploy", 3),
    ];

    Json(ApiResponse::new(StatusCode::OK.into(), jobs))
}

/// POST describe a new job and where its progress can be streamed from
pub async fn create(Json(params): Json<CreateJobParams>) -> impl IntoResponse {
    debug!("POST Create a new Job from: {params:?}");

    let name = params.name.trim();
    let steps = params.steps.unwrap_or(DEFAULT_STEPS);
    if name.is_empty() || name.contains(char::is_whitespace) || steps == 0 || steps > MAX_STEPS {
        warn!("Rejecting Job \"{}\" with {steps} steps", params.name);
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ApiResponse::<Job> {
                status_code: StatusCode::UNPROCESSABLE_ENTITY.into(),
                data: None,
            }),
        );
    }

    let job = Job::new(name, steps);
    info!("Created Job: {}", job.name);

    (
        StatusCode::CREATED,
        Json(ApiResponse::new(StatusCode::CREATED.into(), job)),
    )
}
