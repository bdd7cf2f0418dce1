//! Error types for s3dict
//!
//! Every transport maps its failures onto [`Error`] so the facade can treat
//! "not found" and authentication failures uniformly.

use thiserror::Error;

/// Result type alias using the s3dict error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the facade and its transports
#[derive(Debug, Error)]
pub enum Error {
    /// Credentials are missing, invalid, or lack permission
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// The object (or bucket) does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Network or HTTP failure not classified above
    #[error("Transport error: {0}")]
    Transport(String),

    /// The key cannot be addressed by the transport
    #[error("Invalid key '{0}'")]
    InvalidKey(String),

    /// Invalid or incomplete configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Local I/O failure while reading a value to upload
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error means the key is absent
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// Whether this error is an authentication failure
    pub fn is_auth(&self) -> bool {
        matches!(self, Error::Auth(_))
    }
}
