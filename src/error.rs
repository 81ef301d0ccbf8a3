//! Error types for telemetry ingest.
//!
//! This module provides the error handling for the flightline ingest engine.
//! All errors implement the `std::error::Error` trait and carry structured context
//! for debugging and recovery guidance.
//!
//! ## Error Categories
//!
//! - **Bind Errors**: The listening endpoint could not be created (fatal at startup)
//! - **Connection Errors**: The sending client could not reach or write to the endpoint
//! - **Configuration Errors**: Unreadable, malformed, or invalid session configuration
//! - **Record Errors**: A record of the wrong size reached the codec
//! - **Index Errors**: Episode access outside the recorded range
//!
//! Transient conditions (no pending peer, no data yet, a partial record in the buffer)
//! are ordinary values in this crate and never show up here.
//!
//! ## Recovery and Retry
//!
//! ```rust
//! use flightline::TelemetryError;
//!
//! let error = TelemetryError::connection_failed("visualizer not listening");
//! if error.is_retryable() {
//!     for suggestion in error.recovery_suggestions() {
//!         println!("  - {}", suggestion);
//!     }
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for telemetry operations.
pub type Result<T, E = TelemetryError> = std::result::Result<T, E>;

/// Main error type for telemetry operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TelemetryError {
    #[error("Failed to bind telemetry endpoint {address}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Telemetry connection failed: {reason}")]
    Connection {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Configuration file error: {path}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error in {context}: {details}")]
    Parse { context: String, details: String },

    #[error("Invalid configuration: {reason}")]
    Config { reason: String },

    #[error("Record size mismatch: expected {expected} bytes, found {found}")]
    RecordSize { expected: usize, found: usize },

    #[error("Episode index {index} out of range (episode holds {len} records)")]
    Index { index: usize, len: usize },

    #[error("Tick driver failure: {reason}")]
    Driver { reason: String },
}

impl TelemetryError {
    /// Returns whether this error is potentially recoverable through retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            TelemetryError::Connection { .. } => true,
            TelemetryError::Bind { source, .. } => source.kind() == std::io::ErrorKind::AddrInUse,
            TelemetryError::File { .. } => false,
            TelemetryError::Parse { .. } => false,
            TelemetryError::Config { .. } => false,
            TelemetryError::RecordSize { .. } => false,
            TelemetryError::Index { .. } => false,
            TelemetryError::Driver { .. } => false,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            TelemetryError::Bind { .. } => vec![
                "Check that no other visualizer instance holds the port",
                "Verify the configured address is a local interface",
                "Pick a different port in the session configuration",
            ],
            TelemetryError::Connection { .. } => vec![
                "Ensure the visualizer is running and listening",
                "Check the address and port match on both ends",
                "Retry once the listening side has started",
            ],
            TelemetryError::File { .. } => vec![
                "Check the configuration file exists and is readable",
                "Check file permissions",
            ],
            TelemetryError::Parse { .. } => vec![
                "Check the configuration is valid YAML",
                "Compare field names against the documented defaults",
            ],
            TelemetryError::Config { .. } => vec![
                "Use non-zero buffer sizes, thresholds, and intervals",
                "Fall back to the default configuration",
            ],
            TelemetryError::RecordSize { .. } => vec![
                "Agree on the record layout on both ends out of band",
                "Feed records through the frame decoder before decoding",
            ],
            TelemetryError::Index { .. } => vec![
                "Check the episode length before indexing",
                "Iterate the episode instead of indexing",
            ],
            TelemetryError::Driver { .. } => vec![
                "Check the tokio runtime is still running",
                "Restart the pose feed",
            ],
        }
    }

    /// Helper constructor for bind errors with address context.
    pub fn bind_error(address: impl Into<String>, source: std::io::Error) -> Self {
        TelemetryError::Bind { address: address.into(), source }
    }

    /// Helper constructor for configuration file errors.
    pub fn file_error(path: PathBuf, source: std::io::Error) -> Self {
        TelemetryError::File { path, source }
    }

    /// Helper constructor for connection errors.
    pub fn connection_failed(reason: impl Into<String>) -> Self {
        TelemetryError::Connection { reason: reason.into(), source: None }
    }

    /// Helper constructor for connection errors with source.
    pub fn connection_failed_with_source(
        reason: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        TelemetryError::Connection { reason: reason.into(), source: Some(source) }
    }

    /// Helper constructor for configuration validation errors.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        TelemetryError::Config { reason: reason.into() }
    }
}

impl From<std::io::Error> for TelemetryError {
    fn from(err: std::io::Error) -> Self {
        TelemetryError::Connection {
            reason: "I/O failure".to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<serde_yaml_ng::Error> for TelemetryError {
    fn from(err: serde_yaml_ng::Error) -> Self {
        TelemetryError::Parse {
            context: "Session configuration".to_string(),
            details: err.to_string(),
        }
    }
}
