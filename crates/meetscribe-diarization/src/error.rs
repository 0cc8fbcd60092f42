//! Diarization error types

use thiserror::Error;

/// Diarization-related errors
#[derive(Error, Debug)]
pub enum DiarizationError {
    /// Models not loaded
    #[error("Models not loaded. Please load the diarization models first.")]
    ModelNotLoaded,

    /// Model loading failed
    #[error("Failed to load model: {0}")]
    ModelLoadFailed(String),

    /// Model file not found
    #[error("Model file not found: {0}")]
    FileNotFound(String),

    /// Diarization failed
    #[error("Diarization failed: {0}")]
    DiarizationFailed(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
