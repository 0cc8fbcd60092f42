//! Speech-to-text via whisper-rs
//!
//! Provides the transcription side of the pipeline: an explicitly-loaded
//! Whisper model that turns 16 kHz mono samples into time-stamped transcript
//! segments plus a detected language code.

pub mod error;
pub mod languages;
pub mod provider;

pub use error::AsrError;
pub use languages::{Language, SUPPORTED_LANGUAGES};
pub use provider::{TranscribeProgress, TranscriptionOptions, WhisperProvider, WHISPER_SAMPLE_RATE};

// Re-export types from meetscribe-core
pub use meetscribe_core::{TranscriptResult, TranscriptSegment};
