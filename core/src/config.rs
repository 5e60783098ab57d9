//! Transport and socket client configuration.
//!
//! # Design
//! Plain serde structs with `Default` and `with_*` builders. Zero values in
//! `SocketConfig` mean "use the default", matching the C ABI, so a client
//! never hands the OS a zero timeout or reads into an empty buffer.

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_REDIRECTS: u32 = 10;
pub const DEFAULT_SOCKET_TIMEOUT: Duration = Duration::from_millis(5000);
pub const DEFAULT_MAX_BUFFER_SIZE: usize = 2048;

/// Configuration for `UreqTransport`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Upper bound for a whole exchange. `None` leaves it to the network stack.
    pub timeout: Option<Duration>,
    /// Redirects followed before the last 3xx response is returned as-is.
    /// Zero returns the first 3xx without following it.
    pub max_redirects: u32,
    /// Largest response body read, in bytes. Defaults to unbounded.
    pub max_body_size: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: None,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            max_body_size: u64::MAX,
        }
    }
}

impl TransportConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_max_redirects(mut self, max_redirects: u32) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    pub fn with_max_body_size(mut self, max_body_size: u64) -> Self {
        self.max_body_size = max_body_size;
        self
    }
}

/// Configuration for `SocketClient`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocketConfig {
    /// Time each connect/send/receive may wait before giving up.
    pub timeout: Duration,
    /// Largest chunk a single receive returns.
    pub max_buffer_size: usize,
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_SOCKET_TIMEOUT,
            max_buffer_size: DEFAULT_MAX_BUFFER_SIZE,
        }
    }
}

impl SocketConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero keeps the default timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self.normalized()
    }

    /// Zero keeps the default buffer size.
    pub fn with_max_buffer_size(mut self, size: usize) -> Self {
        self.max_buffer_size = size;
        self.normalized()
    }

    /// Replace zero fields (e.g. from a deserialized file) with defaults.
    pub fn normalized(mut self) -> Self {
        if self.timeout.is_zero() {
            self.timeout = DEFAULT_SOCKET_TIMEOUT;
        }
        if self.max_buffer_size == 0 {
            self.max_buffer_size = DEFAULT_MAX_BUFFER_SIZE;
        }
        self
    }
}
