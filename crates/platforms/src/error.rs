//! Error types for platform adapters.
//!
//! Adapter operations fold these into structured results; they only surface
//! directly from construction and configuration.

use thiserror::Error;

/// Errors raised while talking to a platform.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Platform answered with a non-success status
    #[error("{platform} API returned {status}: {body}")]
    Api {
        platform: String,
        status: u16,
        body: String,
    },

    /// Response did not have the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Adapter is missing settings it needs
    #[error("Adapter not configured: {0}")]
    NotConfigured(String),

    /// Operation is not available on this platform
    #[error("Operation not supported: {0}")]
    Unsupported(String),

    /// No constructor registered for the platform
    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Stored credential could not be decrypted
    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),
}

pub type AdapterResult<T> = Result<T, AdapterError>;

/// Errors from credential decryption.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CredentialError {
    #[error("CMS_ENCRYPTION_KEY is not set")]
    MissingKey,

    #[error("Invalid encryption key: {0}")]
    InvalidKey(String),

    #[error("Malformed encrypted credential: {0}")]
    Malformed(String),

    #[error("Credential decryption failed")]
    Decrypt,
}

/// Errors from loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing configuration value: {0}")]
    Missing(String),

    #[error("Invalid value for {key}: {message}")]
    Invalid { key: String, message: String },

    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Toml(#[from] toml::de::Error),
}
