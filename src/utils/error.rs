//! Error Handling Module
//!
//! Defines the error type shared by every layer of the hashing pipeline.
//! Uses thiserror for ergonomic error definitions.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for anchor hashing operations
#[derive(Error, Debug)]
pub enum HashError {
    /// Invalid or inconsistent configuration, raised before any epoch starts
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error reading or partitioning a dataset
    #[error("Dataset error: {0}")]
    Dataset(String),

    /// Tensor or buffer with an unexpected shape
    #[error("Shape mismatch: {0}")]
    Shape(String),

    /// Error raised inside the training loop
    #[error("Training error: {0}")]
    Training(String),

    /// Error persisting or restoring a checkpoint
    #[error("Checkpoint error: {0}")]
    Checkpoint(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Path not found
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),
}

impl From<serde_json::Error> for HashError {
    fn from(err: serde_json::Error) -> Self {
        HashError::Serialization(err.to_string())
    }
}

impl From<image::ImageError> for HashError {
    fn from(err: image::ImageError) -> Self {
        HashError::Dataset(err.to_string())
    }
}

/// Convenience Result type for anchor hashing operations
pub type Result<T> = std::result::Result<T, HashError>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, msg: &str) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: std::error::Error> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, msg: &str) -> Result<T> {
        self.map_err(|e| HashError::InvalidInput(format!("{}: {}", msg, e)))
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| HashError::InvalidInput(format!("{}: {}", f(), e)))
    }
}

impl<T> ResultExt<T> for Option<T> {
    fn context(self, msg: &str) -> Result<T> {
        self.ok_or_else(|| HashError::InvalidInput(msg.to_string()))
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.ok_or_else(|| HashError::InvalidInput(f()))
    }
}
