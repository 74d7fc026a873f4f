use crate::metadata::StreamMetadata;
use dashmap::DashMap;
use log::*;
use std::collections::HashSet;
use std::time::Instant;

/// Unique identifier for a streaming connection (server-generated)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

/// What we know about one open stream
#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    pub path: String,
    pub metadata: StreamMetadata,
    pub opened_at: Instant,
}

/// Registry of live streams with a secondary index by route path
pub struct ConnectionRegistry {
    /// Primary storage: lookup by connection_id for registration/cleanup - O(1)
    connections: DashMap<ConnectionId, ConnectionInfo>,

    /// Secondary index: open connections per route path - O(1)
    path_index: DashMap<String, HashSet<ConnectionId>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
            path_index: DashMap::new(),
        }
    }

    /// Register a new connection - O(1)
    pub fn register(&self, path: impl Into<String>, metadata: StreamMetadata) -> ConnectionId {
        let connection_id = ConnectionId::new();
        let path = path.into();

        self.connections.insert(
            connection_id.clone(),
            ConnectionInfo {
                path: path.clone(),
                metadata,
                opened_at: Instant::now(),
            },
        );

        self.path_index
            .entry(path)
            .or_default()
            .insert(connection_id.clone());

        connection_id
    }

    /// Unregister a connection - O(1)
    pub fn unregister(&self, connection_id: &ConnectionId) {
        if let Some((_, info)) = self.connections.remove(connection_id) {
            debug!(
                "Stream {} on {} closed after {:?}",
                connection_id.as_str(),
                info.path,
                info.opened_at.elapsed()
            );

            if let Some(mut entry) = self.path_index.get_mut(&info.path) {
                entry.remove(connection_id);

                if entry.is_empty() {
                    drop(entry); // Release lock before removal
                    self.path_index.remove(&info.path);
                }
            }
        }
    }

    pub fn get(&self, connection_id: &ConnectionId) -> Option<ConnectionInfo> {
        self.connections
            .get(connection_id)
            .map(|entry| entry.value().clone())
    }

    /// Total number of open streams
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Number of open streams on one route path
    pub fn count_for_path(&self, path: &str) -> usize {
        self.path_index
            .get(path)
            .map(|entry| entry.len())
            .unwrap_or(0)
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
