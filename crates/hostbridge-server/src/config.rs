//! hostbridge.toml configuration.

use std::net::SocketAddr;
use std::path::Path;

use anyhow::Context;
use hostbridge_body::DEFAULT_CHUNK_SIZE;
use hostbridge_host::HostConfig;
use hostbridge_host::config::DEFAULT_MAX_BODY_HINT;
use serde::{Deserialize, Serialize};

use crate::server::BodyOptions;

pub const DEFAULT_LOG_FILTER: &str = "info,hostbridge=debug";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub server: ServerSection,
    pub bridge: BridgeSection,
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub bind: SocketAddr,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8080)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeSection {
    /// Cap on the Content-Length based request buffer presize.
    pub max_body_hint: usize,
    /// Response chunks buffered per request before the writer is paused.
    pub response_buffer_chunks: usize,
    /// Chunk size used when pushing request bodies to the application.
    pub chunk_size: usize,
}

impl Default for BridgeSection {
    fn default() -> Self {
        Self {
            max_body_hint: DEFAULT_MAX_BODY_HINT,
            response_buffer_chunks: 8,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    pub filter: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl ServerConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: ServerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(self.bridge.chunk_size > 0, "bridge.chunk_size must be positive");
        anyhow::ensure!(
            self.bridge.response_buffer_chunks > 0,
            "bridge.response_buffer_chunks must be positive"
        );
        Ok(())
    }

    pub fn host_config(&self) -> HostConfig {
        HostConfig {
            max_body_hint: self.bridge.max_body_hint,
        }
    }

    pub fn body_options(&self) -> BodyOptions {
        BodyOptions {
            chunk_size: self.bridge.chunk_size,
            response_buffer_chunks: self.bridge.response_buffer_chunks,
        }
    }
}
