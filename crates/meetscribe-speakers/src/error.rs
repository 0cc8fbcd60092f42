//! Speaker store error types

use thiserror::Error;

/// Speaker profile store errors
#[derive(Error, Debug)]
pub enum SpeakerStoreError {
    /// Speaker not found
    #[error("Speaker '{0}' not found")]
    NotFound(String),

    /// Speaker name already taken
    #[error("Speaker '{0}' already exists")]
    AlreadyExists(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
