//! Error types for cfdnsupdater
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for cfdnsupdater operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for cfdnsupdater
#[derive(Error, Debug)]
pub enum Error {
    /// IP source errors (transport or read failures)
    #[error("IP source error: {0}")]
    IpSource(String),

    /// The IP discovery service answered with something other than 200 OK
    #[error("Unexpected HTTP status {0}")]
    HttpStatus(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Authentication errors
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Zone or record not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// More than one A record exists for the managed host
    #[error("Name {name} has {count} DNS records - only a single record is supported")]
    AmbiguousRecordSet {
        /// Fully-qualified record name
        name: String,
        /// Number of records returned by the registrar
        count: usize,
    },

    /// Registrar-specific error
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },
}

impl Error {
    /// Create an IP source error
    pub fn ip_source(msg: impl Into<String>) -> Self {
        Self::IpSource(msg.into())
    }

    /// Create an unexpected HTTP status error
    pub fn http_status(status: impl Into<String>) -> Self {
        Self::HttpStatus(status.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an ambiguous record set error
    pub fn ambiguous(name: impl Into<String>, count: usize) -> Self {
        Self::AmbiguousRecordSet {
            name: name.into(),
            count,
        }
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Whether this error came from the IP discovery step
    pub fn is_resolve_error(&self) -> bool {
        matches!(self, Self::IpSource(_) | Self::HttpStatus(_))
    }
}
