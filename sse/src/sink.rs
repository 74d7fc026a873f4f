use crate::error::{Error, ErrorKind, Result};
use crate::event::{comment, Event};
use log::*;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

/// Monotonic id counter for one connection. The first id handed out is `1`.
#[derive(Debug, Default)]
pub struct EventIds(AtomicU64);

impl EventIds {
    pub fn next_id(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed) + 1
    }
}

/// The output channel of one open stream.
///
/// Every `send` encodes a whole frame and hands it to the HTTP layer as its own body
/// chunk, so frames reach the client in call order and are never merged or split
/// by a buffer on our side.
#[derive(Debug, Clone)]
pub struct EventSink {
    sender: UnboundedSender<String>,
    ids: Option<Arc<EventIds>>,
}

impl EventSink {
    pub(crate) fn new(sender: UnboundedSender<String>, enable_ids: bool) -> Self {
        Self {
            sender,
            ids: enable_ids.then(|| Arc::new(EventIds::default())),
        }
    }

    /// Encode and write one event onto the stream.
    ///
    /// Events without an explicit id get the next connection id when ids are enabled.
    pub fn send(&self, event: Event) -> Result<()> {
        let event = match (&self.ids, event.id()) {
            (Some(ids), None) => event.with_assigned_id(ids.next_id()),
            _ => event,
        };

        self.write(event.to_sse())
    }

    /// Write a comment frame (ignored by clients).
    pub fn comment(&self, text: &str) -> Result<()> {
        self.write(comment(text))
    }

    /// True once the client end of the stream is gone.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    fn write(&self, frame: String) -> Result<()> {
        self.sender.send(frame).map_err(|e| {
            debug!("Dropping SSE frame, client disconnected: {e}");
            Error::new(ErrorKind::Disconnected)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn send_writes_frames_in_call_order() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sink = EventSink::new(tx, false);

        sink.send(Event::output("a")).unwrap();
        sink.send(Event::output("b")).unwrap();

        assert_eq!(rx.try_recv().unwrap(), Event::output("a").to_sse());
        assert_eq!(rx.try_recv().unwrap(), Event::output("b").to_sse());
    }

    #[test]
    fn enabled_ids_are_assigned_monotonically() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sink = EventSink::new(tx, true);

        sink.send(Event::output("a")).unwrap();
        sink.send(Event::output("b").with_id("custom").unwrap()).unwrap();
        sink.send(Event::output("c")).unwrap();

        assert!(rx.try_recv().unwrap().starts_with("id: 1\n"));
        assert!(rx.try_recv().unwrap().starts_with("id: custom\n"));
        assert!(rx.try_recv().unwrap().starts_with("id: 2\n"));
    }

    #[test]
    fn disabled_ids_leave_events_untouched() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sink = EventSink::new(tx, false);

        sink.send(Event::output("a")).unwrap();

        assert!(rx.try_recv().unwrap().starts_with("event: output\n"));
    }

    #[test]
    fn send_after_disconnect_reports_disconnected() {
        let (tx, rx) = mpsc::unbounded_channel();
        let sink = EventSink::new(tx, false);
        drop(rx);

        assert!(sink.is_closed());
        let err = sink.send(Event::output("late")).unwrap_err();
        assert_eq!(err.error_kind, ErrorKind::Disconnected);
    }
}
