/*!
 * Error types for the amarelo application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that can occur while reading or decoding subtitle data
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SubtitleError {
    /// A time code did not match the grammar of its format
    #[error("Invalid {format} timestamp: '{value}'")]
    InvalidTimestamp {
        /// Format name ("SRT" or "ASS")
        format: &'static str,
        /// The rejected input
        value: String,
    },

    /// The file extension does not map to a known subtitle format
    #[error("Unsupported subtitle format: {0}")]
    UnsupportedFormat(String),

    /// The file structure is broken beyond recovery
    #[error("Malformed subtitle at line {line}: {message}")]
    Malformed {
        /// 1-based line number
        line: usize,
        /// What went wrong
        message: String,
    },

    /// Reading the subtitle file failed
    #[error("Failed to read subtitle file {path}: {message}")]
    Io {
        /// Path that was being read
        path: String,
        /// Underlying I/O message
        message: String,
    },
}

/// Errors reported by the external recognition and translation collaborators
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// The speech recognizer failed
    #[error("Recognition failed: {0}")]
    Recognition(String),

    /// The translation service failed
    #[error("Translation failed: {0}")]
    Translation(String),

    /// The recognition model could not be loaded
    #[error("Failed to load model '{model}': {message}")]
    ModelLoad {
        /// Model name from the configuration
        model: String,
        /// Loader message
        message: String,
    },

    /// The collaborator did not answer in time
    #[error("Engine timed out after {0} seconds")]
    Timeout(u64),

    /// The collaborator answered with something we cannot use
    #[error("Invalid engine output: {0}")]
    InvalidOutput(String),

    /// A batch transform returned a different number of entries
    #[error("Entry count changed: expected {expected}, got {actual}")]
    EntryCountMismatch {
        /// Entries sent
        expected: usize,
        /// Entries received
        actual: usize,
    },
}

/// Errors raised by the per-video workflow
#[derive(Error, Debug)]
pub enum WorkflowError {
    /// Nothing to work on
    #[error("Missing input: {0}")]
    MissingInput(String),

    /// Output could not be written
    #[error("File error: {0}")]
    File(String),

    /// Error from subtitle processing
    #[error("Subtitle error: {0}")]
    Subtitle(#[from] SubtitleError),

    /// Error from an external engine
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),
}
