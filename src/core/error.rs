//! Error types and handling for the server.
//!
//! This module defines the unified error type for server construction and
//! startup. Request-scoped failures are represented separately by
//! [`FhirError`](crate::interactions::FhirError) and rendered to clients as
//! operation outcomes; this type covers everything that can go wrong before
//! a request exists.

use thiserror::Error;

/// A specialized Result type for server operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for server configuration and startup.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration-related errors, including invalid registrations.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors from file operations or network communication.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file parse errors.
    #[error("Configuration file error: {0}")]
    ConfigFile(#[from] toml::de::Error),

    /// Internal server errors that should not occur under normal operation.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
