use crate::registry::{StreamController, StreamRequest};
use async_trait::async_trait;
use log::*;
use serde_json::json;
use sse::{Event, EventSink};
use std::time::Duration;

const BUILD_LOG: [&str; 6] = [
    "Resolving dependencies",
    "Downloading crates",
    "Compiling sources",
    "Running tests",
    "Packaging artifacts",
    "Publishing release",
];

/// Replays a build log one `output` event per line.
///
/// `fail_at` (1-based) stops the replay at that line with an `error` event instead of
/// finishing with `complete`. `interval_ms` (default 250) is the pause between lines.
#[derive(Debug, Default)]
pub struct LogStreamController;

#[async_trait]
impl StreamController for LogStreamController {
    async fn execute(&self, request: StreamRequest, sink: EventSink) {
        let fail_at: Option<usize> = request.query.get("fail_at").and_then(|v| v.parse().ok());
        let interval = Duration::from_millis(request.query_or("interval_ms", 250u64));

        for (index, line) in BUILD_LOG.iter().enumerate() {
            let line_number = index + 1;

            if fail_at == Some(line_number) {
                warn!("Build log replay failing at line {line_number}");
                if sink.send(Event::error(format!("{line} failed"))).is_err() {
                    debug!("Log reader disconnected before the failure at line {line_number}");
                }
                return;
            }

            if sink.send(Event::output(*line)).is_err() {
                debug!("Log reader disconnected at line {line_number}");
                return;
            }

            tokio::time::sleep(interval).await;
        }

        match Event::complete(&json!({ "lines": BUILD_LOG.len() })) {
            Ok(event) => {
                if sink.send(event).is_ok() {
                    info!("Build log replay completed");
                }
            }
            Err(e) => error!("Failed to build completion event for the build log: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::response::IntoResponse;
    use sse::{EventStreamResponse, StreamMetadata};
    use std::sync::Arc;

    async fn run(query: &[(&str, &str)]) -> String {
        let request = StreamRequest {
            query: query
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            ..Default::default()
        };
        let controller = Arc::new(LogStreamController);

        let response = EventStreamResponse::new(move |sink| async move {
            controller.execute(request, sink).await;
        })
        .with_metadata(StreamMetadata::new(30, false, true).unwrap())
        .into_response();

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn replays_every_line_with_sequential_ids() {
        let body = run(&[("interval_ms", "0")]).await;

        assert!(body.starts_with(
            "id: 1\nevent: output\ndata: {\"line\":\"Resolving dependencies\"}\n\n"
        ));
        assert_eq!(body.matches("event: output\n").count(), BUILD_LOG.len());
        assert!(body.ends_with("id: 7\nevent: complete\ndata: {\"lines\":6}\n\n"));
    }

    #[tokio::test]
    async fn fail_at_ends_with_an_error_event() {
        let body = run(&[("interval_ms", "0"), ("fail_at", "3")]).await;

        assert_eq!(body.matches("event: output\n").count(), 2);
        assert!(body.ends_with(
            "id: 3\nevent: error\ndata: {\"message\":\"Compiling sources failed\"}\n\n"
        ));
        assert!(!body.contains("event: complete"));
    }
}
