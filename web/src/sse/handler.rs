use crate::registry::{StreamController, StreamRequest, StreamSettings};
use axum::extract::{Query, RawPathParams};
use axum::http::HeaderMap;
use axum::routing::{get, MethodRouter};
use log::*;
use sse::{EventStreamResponse, StreamMetadata};
use std::collections::HashMap;
use std::sync::Arc;

/// Build the GET handler for a streaming route.
///
/// Each request opens one long-lived connection: the controller's `execute` becomes the
/// producer of an `EventStreamResponse` carrying the route's metadata.
pub(crate) fn stream_route(
    controller: Arc<dyn StreamController>,
    metadata: StreamMetadata,
    path: &str,
    settings: StreamSettings,
) -> MethodRouter {
    let path = path.to_string();

    get(
        move |params: RawPathParams,
              Query(query): Query<HashMap<String, String>>,
              headers: HeaderMap| {
            let controller = controller.clone();
            let settings = settings.clone();
            let path = path.clone();

            async move {
                debug!(
                    "Establishing SSE connection on {path} (timeout {}s, abort_with_user {}, ids {})",
                    metadata.timeout_secs(),
                    metadata.abort_with_user(),
                    metadata.enable_ids()
                );

                let request = StreamRequest {
                    path_params: params
                        .iter()
                        .map(|(key, value)| (key.to_string(), value.to_string()))
                        .collect(),
                    query,
                    headers,
                };

                let response = EventStreamResponse::new(move |sink| async move {
                    controller.execute(request, sink).await;
                })
                .with_metadata(metadata)
                .tracked_by(settings.connections.clone(), path);

                match settings.keep_alive {
                    Some(interval) => response.with_keep_alive(interval),
                    None => response,
                }
            }
        },
    )
}
