//! Speaker diarization and transcript alignment
//!
//! Diarization (who spoke when) runs through pyannote-rs with ONNX Runtime
//! inference. The aligner merges a diarization result with a transcript into
//! speaker-attributed blocks.

pub mod aligner;
pub mod error;
pub mod provider;

pub use aligner::align;
pub use error::DiarizationError;
pub use provider::{
    DiarizationOptions, DiarizationProgress, DiarizationProvider, DiarizationResult,
    SpeakerSegment,
};

// Re-export types from meetscribe-core
pub use meetscribe_core::{AttributedBlock, SpeakerLabelMap, TranscriptSegment};
