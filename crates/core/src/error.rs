//! Core error types

use thiserror::Error;

/// Core error type for the onboarding workspace
#[derive(Debug, Error)]
pub enum CoreError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration parsed but failed validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
