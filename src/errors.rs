// ABOUTME: Error types for the deckforge application
// ABOUTME: Provides structured error handling for each stage of the pipeline

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeckError {
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("Presentation not found: {0}")]
    NotFound(String),

    #[error("Presentation already exists: {0}")]
    AlreadyExists(String),

    #[error("Stored presentation is corrupt: {name}: {reason}")]
    Corrupt { name: String, reason: String },

    #[error("Slide index {index} out of range for presentation with {len} slide(s)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("{tool} exited with {code}: {stderr}")]
    ConversionFailed {
        tool: String,
        code: String,
        stderr: String,
    },

    #[error("{tool} timed out after {timeout_ms} ms")]
    ConversionTimeout { tool: String, timeout_ms: u64 },

    #[error("PPTX generation error: {0}")]
    Pptx(String),

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("No rendered pages found matching pattern: {0}")]
    NoOutputsFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("State serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<zip::result::ZipError> for DeckError {
    fn from(err: zip::result::ZipError) -> Self {
        DeckError::Pptx(format!("ZIP operation failed: {}", err))
    }
}

impl From<anyhow::Error> for DeckError {
    fn from(err: anyhow::Error) -> Self {
        DeckError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DeckError>;
