use crate::connection::{ConnectionId, ConnectionRegistry};
use crate::event::comment;
use crate::metadata::StreamMetadata;
use crate::sink::EventSink;
use async_stream::stream;
use axum::body::Body;
use axum::http::header::{CACHE_CONTROL, CONNECTION, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use futures::future::BoxFuture;
use futures::FutureExt;
use log::*;
use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval};

type Producer = Box<dyn FnOnce(EventSink) -> BoxFuture<'static, ()> + Send>;

/// An HTTP response whose body is an open Server-Sent Events stream.
///
/// The response owns a producer routine and nothing else: it does not buffer or
/// collect events. When the response is turned into a body, the producer is spawned
/// with the stream's `EventSink` and every frame it sends is written as it arrives.
/// The body ends when the producer returns, is aborted, or runs past the route's
/// timeout.
pub struct EventStreamResponse {
    status: StatusCode,
    headers: HeaderMap,
    producer: Producer,
    metadata: StreamMetadata,
    keep_alive: Option<Duration>,
    tracking: Option<(Arc<ConnectionRegistry>, String)>,
}

impl EventStreamResponse {
    pub fn new<F, Fut>(producer: F) -> Self
    where
        F: FnOnce(EventSink) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self {
            status: StatusCode::OK,
            headers: stream_headers(),
            producer: Box::new(move |sink| producer(sink).boxed()),
            metadata: StreamMetadata::default(),
            keep_alive: None,
            tracking: None,
        }
    }

    /// Apply the connection policy registered with the route.
    pub fn with_metadata(mut self, metadata: StreamMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Send a comment frame whenever the stream has been idle for `interval`.
    pub fn with_keep_alive(mut self, interval: Duration) -> Self {
        self.keep_alive = Some(interval);
        self
    }

    /// Record the stream in `registry` for as long as its body is alive.
    pub fn tracked_by(mut self, registry: Arc<ConnectionRegistry>, path: impl Into<String>) -> Self {
        self.tracking = Some((registry, path.into()));
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn metadata(&self) -> &StreamMetadata {
        &self.metadata
    }
}

impl IntoResponse for EventStreamResponse {
    fn into_response(self) -> Response {
        let Self {
            status,
            headers,
            producer,
            metadata,
            keep_alive,
            tracking,
        } = self;

        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        let sink = EventSink::new(tx, metadata.enable_ids());
        let work = producer(sink);
        let timeout = metadata.timeout();

        let task = tokio::spawn(async move {
            if tokio::time::timeout(timeout, work).await.is_err() {
                info!(
                    "SSE producer stopped after reaching its {}s timeout",
                    timeout.as_secs()
                );
            }
        });

        let tracking = tracking.map(|(registry, path)| {
            let connection_id = registry.register(path, metadata);
            (registry, connection_id)
        });

        let mut guard = StreamGuard {
            task,
            finished: false,
            abort_with_user: metadata.abort_with_user(),
            tracking,
        };
        let mut ticker = keep_alive.map(|period| interval_at(Instant::now() + period, period));

        let body = stream! {
            loop {
                let step = tokio::select! {
                    biased;
                    frame = rx.recv() => match frame {
                        Some(frame) => Step::Frame(frame),
                        None => Step::Closed,
                    },
                    joined = &mut guard.task, if !guard.finished => {
                        if let Err(e) = joined {
                            if e.is_panic() {
                                error!("SSE producer panicked: {e}");
                            }
                        }
                        Step::Finished
                    },
                    _ = next_tick(&mut ticker) => Step::KeepAlive,
                };

                match step {
                    Step::Frame(frame) => {
                        // Keep-alive only fills idle gaps.
                        if let Some(ticker) = ticker.as_mut() {
                            ticker.reset();
                        }
                        yield Ok::<_, Infallible>(frame);
                    }
                    Step::KeepAlive => yield Ok(comment("keep-alive")),
                    Step::Finished => {
                        guard.finished = true;
                        // Producer clones of the sink may outlive the task; flush what
                        // was already sent and end the stream.
                        while let Ok(frame) = rx.try_recv() {
                            yield Ok(frame);
                        }
                        break;
                    }
                    Step::Closed => {
                        guard.finished = true;
                        break;
                    }
                }
            }
        };

        let mut response = Response::new(Body::from_stream(body));
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        response
    }
}

enum Step {
    Frame(String),
    KeepAlive,
    Finished,
    Closed,
}

/// Lives inside the body stream; runs when the body completes or is dropped by the
/// HTTP layer (client disconnect).
struct StreamGuard {
    task: JoinHandle<()>,
    finished: bool,
    abort_with_user: bool,
    tracking: Option<(Arc<ConnectionRegistry>, ConnectionId)>,
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        if !self.finished {
            if self.abort_with_user {
                debug!("SSE client disconnected, aborting producer");
                self.task.abort();
            } else {
                debug!("SSE client disconnected, producer continues until it returns");
            }
        }

        if let Some((registry, connection_id)) = self.tracking.take() {
            registry.unregister(&connection_id);
        }
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}

fn stream_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/event-stream"));
    headers.insert(
        CACHE_CONTROL,
        HeaderValue::from_static("no-cache, no-store, must-revalidate"),
    );
    headers.insert("x-accel-buffering", HeaderValue::from_static("no"));
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Event;
    use axum::body::to_bytes;
    use tokio::sync::oneshot;

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn fixed_headers_are_set_at_construction() {
        let response = EventStreamResponse::new(|_sink| async {});

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers["content-type"], "text/event-stream");
        assert_eq!(
            headers["cache-control"],
            "no-cache, no-store, must-revalidate"
        );
        assert_eq!(headers["x-accel-buffering"], "no");
        assert_eq!(headers["connection"], "keep-alive");
    }

    #[tokio::test]
    async fn response_carries_headers_and_ordered_frames() {
        let a = Event::output("first");
        let b = Event::progress(1, 2, None);
        let expected = format!("{}{}", a.to_sse(), b.to_sse());

        let response = EventStreamResponse::new(move |sink| async move {
            sink.send(a).unwrap();
            sink.send(b).unwrap();
        })
        .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-type"], "text/event-stream");
        assert_eq!(body_text(response).await, expected);
    }

    #[tokio::test]
    async fn frames_sent_from_spawned_tasks_are_not_interleaved() {
        let response = EventStreamResponse::new(|sink| async move {
            for i in 0..50 {
                let sink = sink.clone();
                tokio::spawn(async move {
                    let _ = sink.send(Event::output(format!("line {i}\nwith a break")));
                })
                .await
                .unwrap();
            }
        })
        .into_response();

        let body = body_text(response).await;
        let frames: Vec<&str> = body.split_terminator("\n\n").collect();
        assert_eq!(frames.len(), 50);
        for (i, frame) in frames.iter().enumerate() {
            assert!(frame.contains(&format!("line {i}")), "frame {i}: {frame}");
        }
    }

    #[tokio::test]
    async fn enable_ids_numbers_frames() {
        let metadata = StreamMetadata::new(30, true, true).unwrap();
        let response = EventStreamResponse::new(|sink| async move {
            sink.send(Event::output("a")).unwrap();
            sink.send(Event::output("b")).unwrap();
        })
        .with_metadata(metadata)
        .into_response();

        let body = body_text(response).await;
        assert!(body.starts_with("id: 1\nevent: output\n"));
        assert!(body.contains("\n\nid: 2\nevent: output\n"));
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_ends_the_stream() {
        let metadata = StreamMetadata::new(1, true, false).unwrap();
        let response = EventStreamResponse::new(|sink| async move {
            sink.send(Event::output("before")).unwrap();
            tokio::time::sleep(Duration::from_secs(3600)).await;
            let _ = sink.send(Event::output("after"));
        })
        .with_metadata(metadata)
        .into_response();

        let body = body_text(response).await;
        assert_eq!(body, Event::output("before").to_sse());
    }

    #[tokio::test(start_paused = true)]
    async fn keep_alive_comments_fill_idle_gaps() {
        let response = EventStreamResponse::new(|sink| async move {
            tokio::time::sleep(Duration::from_millis(250)).await;
            sink.send(Event::output("done")).unwrap();
        })
        .with_keep_alive(Duration::from_millis(100))
        .into_response();

        let body = body_text(response).await;
        assert_eq!(
            body,
            format!(
                ": keep-alive\n\n: keep-alive\n\n{}",
                Event::output("done").to_sse()
            )
        );
    }

    #[tokio::test(start_paused = true)]
    async fn keep_alive_stays_quiet_while_frames_flow() {
        let response = EventStreamResponse::new(|sink| async move {
            for _ in 0..6 {
                tokio::time::sleep(Duration::from_millis(50)).await;
                sink.send(Event::output("tick")).unwrap();
            }
        })
        .with_keep_alive(Duration::from_millis(100))
        .into_response();

        let body = body_text(response).await;
        assert_eq!(body.matches("event: output\n").count(), 6);
        assert!(!body.contains(": keep-alive"));
    }

    fn chatty_producer(done: oneshot::Sender<()>) -> impl FnOnce(EventSink) -> BoxFuture<'static, ()> {
        move |sink| {
            async move {
                loop {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    if sink.send(Event::output("tick")).is_err() {
                        let _ = done.send(());
                        return;
                    }
                }
            }
            .boxed()
        }
    }

    #[tokio::test]
    async fn disconnect_aborts_producer_when_abort_with_user() {
        let (done_tx, done_rx) = oneshot::channel();
        let response = EventStreamResponse::new(chatty_producer(done_tx)).into_response();

        drop(response);

        // Aborted producers never observe the failed send; the sender is dropped instead.
        let outcome = tokio::time::timeout(Duration::from_secs(5), done_rx)
            .await
            .expect("producer should have been stopped");
        assert!(outcome.is_err());
    }

    #[tokio::test]
    async fn disconnect_lets_producer_finish_without_abort_with_user() {
        let metadata = StreamMetadata::new(30, false, false).unwrap();
        let (done_tx, done_rx) = oneshot::channel();
        let response = EventStreamResponse::new(chatty_producer(done_tx))
            .with_metadata(metadata)
            .into_response();

        drop(response);

        let outcome = tokio::time::timeout(Duration::from_secs(5), done_rx)
            .await
            .expect("producer should notice the disconnect");
        assert!(outcome.is_ok());
    }

    #[tokio::test]
    async fn tracked_stream_is_registered_until_the_body_ends() {
        let registry = Arc::new(ConnectionRegistry::new());
        let (release_tx, release_rx) = oneshot::channel::<()>();

        let response = EventStreamResponse::new(|sink| async move {
            let _ = release_rx.await;
            sink.send(Event::output("bye")).unwrap();
        })
        .tracked_by(registry.clone(), "/logs")
        .into_response();

        assert_eq!(registry.count_for_path("/logs"), 1);

        release_tx.send(()).unwrap();
        let _ = body_text(response).await;

        assert!(registry.is_empty());
    }
}
