use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Environment variable holding the service manager's datagram socket.
pub const NOTIFY_SOCKET: &str = "NOTIFY_SOCKET";

/// Payload of the control datagram.
pub const BARRIER_MESSAGE: &[u8] = b"BARRIER=1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BarrierConfig {
    /// Remove `NOTIFY_SOCKET` from the environment once it has been read.
    pub unset_environment: bool,

    /// Upper bound on the wait, in milliseconds. `None` waits until the
    /// service manager closes its copy of the pipe or the caller cancels.
    pub timeout_ms: Option<u64>,
}

impl BarrierConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

impl Default for BarrierConfig {
    fn default() -> Self {
        Self {
            unset_environment: false,
            timeout_ms: None,
        }
    }
}
