use serde::{Deserialize, Serialize};

/// Upper bound on the Content-Length based capacity hint: 4 MiB.
pub const DEFAULT_MAX_BODY_HINT: usize = 4 * 1024 * 1024;

/// Host entry point settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Largest Content-Length honored when presizing the request buffer.
    /// Bodies longer than this are still accepted; the buffer just grows.
    pub max_body_hint: usize,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            max_body_hint: DEFAULT_MAX_BODY_HINT,
        }
    }
}

impl HostConfig {
    /// Clamp an advertised content length to a buffer capacity.
    pub fn capacity_hint(&self, content_length: usize) -> usize {
        content_length.min(self.max_body_hint)
    }
}
