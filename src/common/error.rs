//! Error types for the adapter bridge
//!
//! Creation-time failures (missing contributions, spawn/connect failures)
//! are returned to the caller; post-creation failures are delivered in-band
//! as synthesized protocol events instead.

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the adapter bridge
#[derive(Error, Debug)]
pub enum Error {
    // === Registry Errors ===
    #[error("No debug adapter contribution registered for type '{0}'")]
    NotFound(String),

    #[error("Invalid adapter manifest at '{path}': {reason}")]
    Manifest { path: String, reason: String },

    // === Transport Errors ===
    #[error("Failed to start debug adapter '{command}': {reason}")]
    SpawnFailed { command: String, reason: String },

    #[error("Failed to connect to debug server at {endpoint}: {reason}")]
    ConnectFailed { endpoint: String, reason: String },

    #[error("Connection to debug server at {endpoint} timed out after {secs} seconds")]
    ConnectTimeout { endpoint: String, secs: u64 },

    #[error("Transport is closed")]
    TransportClosed,

    // === Protocol Errors ===
    #[error("Protocol framing error: {0}")]
    ProtocolFraming(String),

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Internal Errors ===
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a spawn failure error
    pub fn spawn_failed(command: impl Into<String>, reason: impl ToString) -> Self {
        Self::SpawnFailed {
            command: command.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a connect failure error
    pub fn connect_failed(endpoint: impl Into<String>, reason: impl ToString) -> Self {
        Self::ConnectFailed {
            endpoint: endpoint.into(),
            reason: reason.to_string(),
        }
    }

    /// Create an adapter manifest error
    pub fn manifest(path: impl Into<String>, reason: impl ToString) -> Self {
        Self::Manifest {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_names_the_debug_type() {
        let err = Error::NotFound("node".to_string());
        assert!(err.to_string().contains("'node'"));
    }

    #[test]
    fn io_errors_convert() {
        let io_err = io::Error::new(io::ErrorKind::BrokenPipe, "gone");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
