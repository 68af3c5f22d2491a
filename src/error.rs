//! Error types for Interpose

use std::io;
use thiserror::Error;

use crate::fingerprint::Fingerprint;

/// Result type for Interpose operations
pub type Result<T> = std::result::Result<T, InterposeError>;

/// Errors that can occur in Interpose
#[derive(Debug, Error)]
pub enum InterposeError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Invalid cassette document
    #[error("Invalid cassette format: {0}")]
    InvalidFormat(String),

    /// Cassette file not found
    #[error("Cassette file not found: {0}")]
    FileNotFound(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The engine holds no interaction for this fingerprint
    #[error("Interaction not found for fingerprint {0}")]
    InteractionNotFound(Fingerprint),

    /// Status metadata that is not an integer
    #[error("Malformed status_code metadata: {value:?}")]
    MalformedStatus {
        /// Raw metadata value
        value: String,
    },

    /// Status metadata that is an integer but not a valid HTTP status
    #[error("Invalid status code: {0}")]
    InvalidStatus(u16),

    /// Request too large
    #[error("Data too large: {size} bytes exceeds limit of {limit} bytes")]
    DataTooLarge {
        /// Actual size
        size: usize,
        /// Size limit
        limit: usize,
    },

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl InterposeError {
    /// Whether this is the engine's definitive "no matching interaction" signal
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::InteractionNotFound(_))
    }
}
