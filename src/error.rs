//! Error types for channel-harvest
//!
//! This module provides the error taxonomy of the library:
//! - [`TransportError`] - failures reported by the messaging service transport
//! - [`Error`] - construction, configuration and persistence failures
//!
//! Collection itself never fails: transport errors are classified by the
//! channel collector and surfaced in the [`ChannelReport`](crate::types::ChannelReport).

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for channel-harvest operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for channel-harvest
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "window.start")
        key: Option<String>,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV encoding error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Serialization error (configuration files)
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Error reported by the transport
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Persisting a channel result set failed
    #[error("failed to write {path}: {reason}")]
    Persist {
        /// The output file that could not be written
        path: PathBuf,
        /// The reason the write failed
        reason: String,
    },

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Shorthand for a configuration error on a specific key
    pub(crate) fn config(key: &str, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.to_string()),
        }
    }
}

/// Why a channel could not be read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnavailableReason {
    /// The channel is private or the session lacks access
    Private,
    /// The identifier is malformed or refers to something that is not a channel
    Invalid,
    /// No channel exists under this identifier
    NotFound,
}

impl std::fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnavailableReason::Private => write!(f, "private or restricted"),
            UnavailableReason::Invalid => write!(f, "invalid channel"),
            UnavailableReason::NotFound => write!(f, "does not exist"),
        }
    }
}

/// Errors raised by a [`Transport`](crate::transport::Transport) implementation
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The service asked the caller to pause before issuing further requests
    #[error("flood wait: the service requires a pause of {} seconds", wait.as_secs())]
    FloodWait {
        /// How long the service requires the caller to wait
        wait: Duration,
    },

    /// The channel is private, invalid or does not exist
    #[error("channel '{channel}' is {reason}")]
    ChannelUnavailable {
        /// The channel identifier that was rejected
        channel: String,
        /// Why the channel was rejected
        reason: UnavailableReason,
    },

    /// Any other transport failure (network, protocol, session)
    #[error("{0}")]
    Other(String),
}
