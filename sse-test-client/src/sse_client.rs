use anyhow::Result;
use eventsource_client::{self as es, Client};
use futures_util::stream::StreamExt;
use log::*;
use serde_json::Value;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

#[derive(Debug, Clone)]
pub struct Event {
    pub event_type: String,
    pub id: Option<String>,
    pub data: Value,
}

pub struct Connection {
    pub label: String,
    event_rx: mpsc::UnboundedReceiver<Event>,
    handle: tokio::task::JoinHandle<()>,
}

impl Connection {
    /// Open `url` (relative to `base_url`) and forward every decoded event.
    ///
    /// Reconnection is disabled: a finished stream must stay finished so scenarios can
    /// observe its last event.
    pub async fn establish(base_url: &str, url: &str, label: String) -> Result<Self> {
        let url = format!("{}{}", base_url, url);
        let (tx, rx) = mpsc::unbounded_channel();

        let client = es::ClientBuilder::for_url(&url)?
            .reconnect(es::ReconnectOptions::reconnect(false).build())
            .build();

        let stream_label = label.clone();
        let handle = tokio::spawn(async move {
            let mut stream = client.stream();

            loop {
                match stream.next().await {
                    Some(Ok(es::SSE::Event(event))) => {
                        if let Ok(data) = serde_json::from_str(&event.data) {
                            let sse_event = Event {
                                event_type: event.event_type,
                                id: event.id,
                                data,
                            };

                            if tx.send(sse_event).is_err() {
                                debug!("SSE receiver dropped for {}", stream_label);
                                break;
                            }
                        }
                    }
                    Some(Ok(es::SSE::Comment(_))) => {
                        // Ignore comments (keep-alive)
                    }
                    Some(Err(e)) => {
                        debug!("SSE stream for {} stopped: {}", stream_label, e);
                        break;
                    }
                    None => {
                        debug!("SSE stream ended for {}", stream_label);
                        break;
                    }
                }
            }
        });

        Ok(Self {
            label,
            event_rx: rx,
            handle,
        })
    }

    pub async fn wait_for_event(&mut self, event_type: &str, timeout: Duration) -> Result<Event> {
        let deadline = Instant::now() + timeout;

        loop {
            match self.next_event(deadline).await? {
                event if event.event_type == event_type => return Ok(event),
                // Wrong event type, keep waiting
                _ => continue,
            }
        }
    }

    /// Every event up to and including the first one of type `last`.
    pub async fn collect_until(&mut self, last: &str, timeout: Duration) -> Result<Vec<Event>> {
        let deadline = Instant::now() + timeout;
        let mut events = Vec::new();

        loop {
            let event = self.next_event(deadline).await?;
            let done = event.event_type == last;
            events.push(event);
            if done {
                return Ok(events);
            }
        }
    }

    /// Drop the connection from the client side.
    pub fn close(self) {
        self.handle.abort();
    }

    async fn next_event(&mut self, deadline: Instant) -> Result<Event> {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            anyhow::bail!("Timeout waiting for events on {}", self.label);
        }

        match tokio::time::timeout(remaining, self.event_rx.recv()).await {
            Ok(Some(event)) => Ok(event),
            Ok(None) => anyhow::bail!("SSE connection closed for {}", self.label),
            Err(_) => anyhow::bail!("Timeout waiting for events on {}", self.label),
        }
    }
}
