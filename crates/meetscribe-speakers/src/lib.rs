//! Persistent speaker identity
//!
//! A flat JSON profile store (name -> embedding, description, sample count)
//! and an embedding matcher that turns per-run diarization speakers into
//! long-term names. The aligner never touches any of this; it only receives
//! the resulting label map.

pub mod error;
pub mod recognition;
pub mod store;

pub use error::SpeakerStoreError;
pub use recognition::{recognize_speakers, SIMILARITY_THRESHOLD};
pub use store::{SpeakerProfile, SpeakerStore};
