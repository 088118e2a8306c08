//! Error types for the broker.

use std::path::PathBuf;

use kraftwire_protocol::ProtocolError;
use thiserror::Error;

/// Result type for broker operations.
pub type BrokerResult<T> = Result<T, BrokerError>;

/// Errors that can occur while serving requests.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// A request or control log could not be decoded.
    #[error("protocol decode error: {0}")]
    Protocol(#[from] ProtocolError),

    /// I/O error during network operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A log file exists but could not be read.
    #[error("failed to read log {}: {message}", path.display())]
    LogRead {
        /// Path of the log file.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// A frame declared a length above the configured limit.
    #[error("message too large: {length} bytes (max {max})")]
    FrameTooLarge {
        /// Declared payload length.
        length: usize,
        /// Configured limit.
        max: usize,
    },

    /// The request named an api key this broker does not serve.
    #[error("unsupported API key: {api_key}")]
    UnsupportedApi {
        /// Wire api key.
        api_key: i16,
    },

    /// Connection closed by client.
    #[error("connection closed")]
    ConnectionClosed,
}

impl BrokerError {
    /// Create a log read error from any error type.
    pub fn log_read<E: std::fmt::Display>(path: impl Into<PathBuf>, err: E) -> Self {
        Self::LogRead {
            path: path.into(),
            message: err.to_string(),
        }
    }
}
