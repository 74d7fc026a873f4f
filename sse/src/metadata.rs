use crate::error::{Error, ErrorKind, Result};
use serde::Serialize;
use std::time::Duration;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection policy attached to a single streaming route at registration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamMetadata {
    /// Ceiling on the connection lifetime, in seconds.
    timeout: u64,
    /// Stop the producer as soon as the client disconnects.
    abort_with_user: bool,
    /// Number events that were sent without an explicit id.
    enable_ids: bool,
}

impl StreamMetadata {
    pub fn new(timeout: u64, abort_with_user: bool, enable_ids: bool) -> Result<Self> {
        if timeout == 0 {
            return Err(Error::new(ErrorKind::InvalidTimeout));
        }

        Ok(Self {
            timeout,
            abort_with_user,
            enable_ids,
        })
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    pub fn abort_with_user(&self) -> bool {
        self.abort_with_user
    }

    pub fn enable_ids(&self) -> bool {
        self.enable_ids
    }
}

impl Default for StreamMetadata {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT_SECS,
            abort_with_user: true,
            enable_ids: false,
        }
    }
}
