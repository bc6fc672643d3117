//! Error types for Convoscope
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling. The session grouping
//! engine itself is infallible; everything here belongs to configuration,
//! date handling, and the message source adapters.

use thiserror::Error;

/// Main error type for Convoscope operations
///
/// Retrieval failures (authentication, network, rate limiting) are fatal and
/// abort the run before any sessions are reconstructed.
#[derive(Error, Debug)]
pub enum ConvoscopeError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Message source errors (unexpected API responses, malformed exports)
    #[error("Source error: {0}")]
    Source(String),

    /// Authentication errors (e.g., 401 Unauthorized, 403 Forbidden)
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Rate limit still exceeded after all retries were spent
    #[error("Rate limit exceeded after {retries} retries: {message}")]
    RateLimited {
        /// Number of retries attempted before giving up
        retries: u32,
        /// Additional context about the failing request
        message: String,
    },

    /// A requested space could not be found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid date or date range supplied by the user
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for Convoscope operations
///
/// Uses `anyhow::Error` as the error type so adapters can attach context
/// while still carrying a [`ConvoscopeError`] for callers that downcast.
pub type Result<T> = anyhow::Result<T>;
