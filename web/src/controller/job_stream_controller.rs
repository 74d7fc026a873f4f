use crate::registry::{StreamController, StreamRequest};
use async_trait::async_trait;
use log::*;
use serde_json::json;
use sse::{Event, EventSink};
use std::time::Duration;

const MAX_STEPS: u64 = 1_000;

/// Streams the progress of a simulated job: one `output` and one `progress` event per
/// step, then a final `complete` event.
///
/// Query parameters: `name` (default `job`), `steps` (default 5) and `interval_ms`
/// (default 500), the pause between steps.
#[derive(Debug, Default)]
pub struct JobStreamController;

#[async_trait]
impl StreamController for JobStreamController {
    async fn execute(&self, request: StreamRequest, sink: EventSink) {
        let name = request.query_or("name", "job".to_string());
        let steps = request.query_or("steps", 5u64).clamp(1, MAX_STEPS);
        let interval = Duration::from_millis(request.query_or("interval_ms", 500u64));

        debug!("Starting job {name} with {steps} steps");

        for step in 1..=steps {
            if sink.is_closed() {
                debug!("Client left job {name} at step {step}");
                return;
            }

            let message = format!("{name}: step {step} of {steps}");
            if sink.send(Event::output(message.as_str())).is_err()
                || sink
                    .send(Event::progress(step, steps, Some(message.as_str())))
                    .is_err()
            {
                return;
            }

            if step < steps {
                tokio::time::sleep(interval).await;
            }
        }

        match Event::complete(&json!({ "name": name, "steps": steps })) {
            Ok(event) => {
                if sink.send(event).is_ok() {
                    info!("Job {name} completed");
                }
            }
            Err(e) => error!("Failed to build completion event for job {name}: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::response::IntoResponse;
    use sse::EventStreamResponse;
    use std::collections::HashMap;
    use std::sync::Arc;

    async fn run(query: &[(&str, &str)]) -> String {
        let request = StreamRequest {
            query: query
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<HashMap<_, _>>(),
            ..Default::default()
        };
        let controller = Arc::new(JobStreamController);

        let response = EventStreamResponse::new(move |sink| async move {
            controller.execute(request, sink).await;
        })
        .into_response();

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn emits_output_and_progress_per_step_then_completes() {
        let body = run(&[("name", "build"), ("steps", "2"), ("interval_ms", "1")]).await;

        let expected = concat!(
            "event: output\ndata: {\"line\":\"build: step 1 of 2\"}\n\n",
            "event: progress\ndata: {\"current\":1,\"total\":2,\"percentage\":50.0,\"message\":\"build: step 1 of 2\"}\n\n",
            "event: output\ndata: {\"line\":\"build: step 2 of 2\"}\n\n",
            "event: progress\ndata: {\"current\":2,\"total\":2,\"percentage\":100.0,\"message\":\"build: step 2 of 2\"}\n\n",
            "event: complete\ndata: {\"name\":\"build\",\"steps\":2}\n\n",
        );
        assert_eq!(body, expected);
    }

    #[tokio::test]
    async fn malformed_steps_fall_back_to_the_default() {
        let body = run(&[("steps", "many"), ("interval_ms", "0")]).await;

        assert_eq!(body.matches("event: progress\n").count(), 5);
        assert!(body.ends_with("event: complete\ndata: {\"name\":\"job\",\"steps\":5}\n\n"));
    }
}
