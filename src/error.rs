//! Error types for the chat-analyzer library.
//!
//! This module provides custom error types using `thiserror` for better error handling
//! and more specific error messages throughout the application.

use thiserror::Error;

/// Errors that can occur while loading and analyzing a chat export.
#[derive(Error, Debug)]
pub enum ChatAnalyzerError {
    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The uploaded export is not valid UTF-8
    #[error("Chat export is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Binary serialization errors
    #[error("Binary serialization error: {0}")]
    Bincode(#[from] bincode::Error),

    /// CSV export errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Cache errors
    #[error("Cache error: {0}")]
    Cache(String),

    /// Invalid date format
    #[error("Invalid date format: {0}")]
    InvalidDate(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// No message could be parsed from the export
    #[error("No messages found in chat export ({skipped} lines skipped)")]
    EmptyChat {
        /// Number of lines that did not match any known layout
        skipped: usize,
    },

    /// The selected user does not appear in the chat
    #[error("User not found in chat: {0}")]
    UnknownUser(String),

    /// A caller-supplied argument is out of range
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// General error with context
    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Result with `ChatAnalyzerError`
pub type Result<T> = std::result::Result<T, ChatAnalyzerError>;

impl From<anyhow::Error> for ChatAnalyzerError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

impl From<sled::Error> for ChatAnalyzerError {
    fn from(err: sled::Error) -> Self {
        Self::Cache(err.to_string())
    }
}
