//! Error type shared by every layer of the bridge.

use std::any::Any;

use thiserror::Error;

/// Result alias for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Errors surfaced at the host boundary.
///
/// Errors are moved, never cloned: whichever callback receives one owns it,
/// so a producer failure reaches the host's error callback unchanged.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("host contract version 1.0 is required, got {}", .0.as_deref().unwrap_or("none"))]
    UnsupportedVersion(Option<String>),

    #[error("environment key missing: {0}")]
    MissingKey(&'static str),

    #[error("environment key {key} holds an unexpected value, expected {expected}")]
    InvalidValue {
        key: &'static str,
        expected: &'static str,
    },

    #[error("request body failed: {0}")]
    Body(String),

    #[error("engine error: {0}")]
    Engine(String),

    #[error("content writer failed: {0}")]
    ContentWriter(String),

    #[error("bootstrap failed: {0}")]
    Bootstrap(String),

    #[error("body cancelled")]
    Cancelled,

    #[error("panicked: {0}")]
    Panicked(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// Convert a payload caught by `std::panic::catch_unwind`.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };
        Self::Panicked(message)
    }
}
