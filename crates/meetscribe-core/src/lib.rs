//! meetscribe-core - shared types, audio loading, and document rendering
//!
//! Everything the provider crates and the CLI have in common: the segment
//! types that flow between transcription, diarization, and alignment, the
//! audio decoder, and the markdown transcript renderer.

pub mod audio;
pub mod document;
pub mod types;

pub use audio::{AudioData, AudioProcessor};
pub use document::{DocumentRenderer, TranscriptDocument};
pub use types::*;
