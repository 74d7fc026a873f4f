use crate::error::{Error, ErrorKind, Result};
use serde::Serialize;
use serde_json::{json, Map, Value};

/// One Server-Sent Events message.
///
/// Events are immutable once built: `with_id` and `with_retry` consume the event and
/// return a new one. Data is always a JSON object, so an existing `Event` always
/// encodes to a well-formed frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    event_type: String,
    data: Value,
    id: Option<String>,
    retry: Option<u64>,
}

impl Event {
    /// Build an event from a type name and a JSON object.
    pub fn new(event_type: impl Into<String>, data: Map<String, Value>) -> Result<Self> {
        let event_type = event_type.into();
        if event_type.is_empty() || has_line_break(&event_type) {
            return Err(Error::new(ErrorKind::InvalidEventType));
        }

        Ok(Self::from_parts(event_type, data))
    }

    /// Event with a caller-chosen type and any serializable payload that maps to a JSON object.
    pub fn data<T: Serialize + ?Sized>(event_type: impl Into<String>, data: &T) -> Result<Self> {
        match serde_json::to_value(data)? {
            Value::Object(map) => Self::new(event_type, map),
            other => Err(Error {
                source: Some(format!("expected a JSON object, found {other}").into()),
                error_kind: ErrorKind::Serialization,
            }),
        }
    }

    /// A single line of output, e.g. one line of a running job's log.
    pub fn output(line: impl Into<String>) -> Self {
        Self::from_object("output", json!({ "line": line.into() }))
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::from_object("error", json!({ "message": message.into() }))
    }

    /// Progress report. `percentage` is rounded to two decimal places and is `0.0`
    /// when `total` is zero.
    pub fn progress(current: u64, total: u64, message: Option<&str>) -> Self {
        Self::from_object(
            "progress",
            json!({
                "current": current,
                "total": total,
                "percentage": percentage(current, total),
                "message": message,
            }),
        )
    }

    pub fn complete<T: Serialize + ?Sized>(data: &T) -> Result<Self> {
        Self::data("complete", data)
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if has_line_break(&id) {
            return Err(Error::new(ErrorKind::InvalidEventId));
        }
        self.id = Some(id);
        Ok(self)
    }

    /// Reconnection delay hint for the client, in milliseconds.
    pub fn with_retry(mut self, retry_ms: u64) -> Self {
        self.retry = Some(retry_ms);
        self
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn data_value(&self) -> &Value {
        &self.data
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn retry(&self) -> Option<u64> {
        self.retry
    }

    /// Encode this event as an SSE frame.
    ///
    /// Field order is fixed: `id`, `retry`, `event`, then one `data:` line per physical
    /// line of the JSON document, terminated by a blank line.
    pub fn to_sse(&self) -> String {
        let mut frame = String::new();

        if let Some(id) = &self.id {
            frame.push_str("id: ");
            frame.push_str(id);
            frame.push('\n');
        }

        if let Some(retry) = self.retry {
            frame.push_str(&format!("retry: {retry}\n"));
        }

        frame.push_str("event: ");
        frame.push_str(&self.event_type);
        frame.push('\n');

        let document = self.data.to_string();
        for line in document.split('\n') {
            frame.push_str("data: ");
            frame.push_str(line);
            frame.push('\n');
        }

        frame.push('\n');
        frame
    }

    // Ids assigned by the stream itself are numeric and need no validation.
    pub(crate) fn with_assigned_id(mut self, id: u64) -> Self {
        self.id = Some(id.to_string());
        self
    }

    fn from_object(event_type: &str, data: Value) -> Self {
        debug_assert!(data.is_object());
        Self {
            event_type: event_type.to_string(),
            data,
            id: None,
            retry: None,
        }
    }

    fn from_parts(event_type: String, data: Map<String, Value>) -> Self {
        Self {
            event_type,
            data: Value::Object(data),
            id: None,
            retry: None,
        }
    }
}

/// Encode a comment frame. Clients ignore comments; they keep idle connections open.
pub fn comment(text: &str) -> String {
    let mut frame = String::new();
    for line in text.split('\n') {
        frame.push_str(": ");
        frame.push_str(line);
        frame.push('\n');
    }
    frame.push('\n');
    frame
}

fn percentage(current: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let raw = current as f64 / total as f64 * 100.0;
    (raw * 100.0).round() / 100.0
}

fn has_line_break(value: &str) -> bool {
    value.contains('\n') || value.contains('\r')
}
