//! Error types for ringlog
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using RingLogError
pub type Result<T> = std::result::Result<T, RingLogError>;

/// Unified error type for ringlog operations
#[derive(Debug, Error)]
pub enum RingLogError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Codec Errors
    // -------------------------------------------------------------------------
    /// A stored record does not decode into a log entry
    #[error("Invalid log entry format: {0}")]
    Format(String),

    /// An entry cannot be encoded without corrupting its field boundaries
    #[error("Invalid log entry: {0}")]
    Validation(String),

    // -------------------------------------------------------------------------
    // Queue Errors
    // -------------------------------------------------------------------------
    #[error("Queue file corruption detected: {0}")]
    QueueCorruption(String),

    #[error("Record too large: {size} bytes (max {max})")]
    RecordTooLarge { size: usize, max: usize },

    #[error("Log is closed")]
    Closed,

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}
