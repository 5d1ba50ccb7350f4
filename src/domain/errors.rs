//! Domain error types
//!
//! This module defines the error hierarchy for trac2gitlab. Adapters translate
//! HTTP and XML-RPC failures into these types so that third-party error types
//! never leak past the adapter boundary.

use thiserror::Error;

/// Main migration error type
///
/// This is the primary error type used throughout the application.
/// It wraps the source- and target-specific error types and provides
/// context for the skip/abort boundaries of the export and sync phases.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Trac (source system) errors
    #[error("Trac error: {0}")]
    Trac(#[from] TracError),

    /// GitLab (target system) errors
    #[error("GitLab error: {0}")]
    GitLab(#[from] GitLabError),

    /// Export pipeline errors
    #[error("Export error: {0}")]
    Export(String),

    /// Import/synchronization errors
    #[error("Import error: {0}")]
    Import(String),

    /// A value had a shape the normalizer does not accept
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// A decoded remote value did not have the expected structure
    #[error("Decode error: {0}")]
    Decode(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

impl MigrationError {
    /// Wraps the error with the natural key of the record being processed
    ///
    /// The variant is kept so callers can still classify the failure.
    pub fn with_key(self, key: impl std::fmt::Display) -> Self {
        match self {
            MigrationError::Export(msg) => MigrationError::Export(format!("{key}: {msg}")),
            MigrationError::Import(msg) => MigrationError::Import(format!("{key}: {msg}")),
            MigrationError::Io(msg) => MigrationError::Io(format!("{key}: {msg}")),
            MigrationError::Decode(msg) => MigrationError::Decode(format!("{key}: {msg}")),
            MigrationError::Serialization(msg) => {
                MigrationError::Serialization(format!("{key}: {msg}"))
            }
            MigrationError::InvalidValue(msg) => {
                MigrationError::InvalidValue(format!("{key}: {msg}"))
            }
            MigrationError::Other(msg) => MigrationError::Other(format!("{key}: {msg}")),
            other => other,
        }
    }

    /// True when the error came from the network layer of either system
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            MigrationError::Trac(TracError::ConnectionFailed(_))
                | MigrationError::Trac(TracError::Timeout(_))
                | MigrationError::GitLab(GitLabError::ConnectionFailed(_))
                | MigrationError::GitLab(GitLabError::Timeout(_))
        )
    }
}

/// Trac-specific errors
///
/// Errors that occur when talking to the Trac XML-RPC endpoint.
#[derive(Debug, Error)]
pub enum TracError {
    /// Failed to connect to the Trac server
    #[error("Failed to connect to Trac server: {0}")]
    ConnectionFailed(String),

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The server answered with an XML-RPC fault
    #[error("XML-RPC fault {code}: {message}")]
    Fault { code: i64, message: String },

    /// Invalid response from server
    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),

    /// The XML-RPC plugin is older than the supported minimum
    #[error("Unsupported XML-RPC plugin version: {0}")]
    UnsupportedPluginVersion(String),

    /// A required RPC method is not exposed by the server
    #[error("Required XML-RPC method not available: {0}")]
    MissingMethod(String),

    /// Server error (5xx)
    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    /// Client error (4xx)
    #[error("Client error: {status} - {message}")]
    ClientError { status: u16, message: String },

    /// Timeout
    #[error("Request timeout: {0}")]
    Timeout(String),
}

/// GitLab-specific errors
///
/// Errors that occur when talking to the GitLab REST API.
#[derive(Debug, Error)]
pub enum GitLabError {
    /// Failed to connect to GitLab
    #[error("Failed to connect to GitLab: {0}")]
    ConnectionFailed(String),

    /// Authentication failed (401/403)
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Resource not found (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// No user matched the lookup
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// Invalid response body
    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),

    /// Server error (5xx)
    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    /// Client error (4xx)
    #[error("Client error: {status} - {message}")]
    ClientError { status: u16, message: String },

    /// Timeout
    #[error("Request timeout: {0}")]
    Timeout(String),
}

// Conversion from std::io::Error
impl From<std::io::Error> for MigrationError {
    fn from(err: std::io::Error) -> Self {
        MigrationError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for MigrationError {
    fn from(err: serde_json::Error) -> Self {
        MigrationError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for MigrationError {
    fn from(err: toml::de::Error) -> Self {
        MigrationError::Configuration(format!("TOML parse error: {err}"))
    }
}
