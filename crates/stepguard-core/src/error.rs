//! Unified error types for stepguard

use thiserror::Error;

/// Unified error type for all stepguard operations
#[derive(Error, Debug)]
pub enum StepGuardError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid reuse threshold {0}: must be within [0, 1]")]
    InvalidThreshold(f64),

    // Corpus errors
    #[error("Scan error: {0}")]
    Scan(String),

    #[error("Invalid glob pattern: {0}")]
    InvalidGlob(String),

    #[error("Corpus file error: {0}")]
    Corpus(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using StepGuardError
pub type Result<T> = std::result::Result<T, StepGuardError>;
