//! Shared type definitions

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Display label used when no diarization speaker can be attributed
pub const UNKNOWN_SPEAKER: &str = "UNKNOWN";

/// A time-stamped unit of transcribed speech
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds
    pub end: f64,
    /// Transcribed text
    pub text: String,
}

impl TranscriptSegment {
    /// Get the duration of this segment
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Transcription result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptResult {
    /// Transcript segments in start-time order
    pub segments: Vec<TranscriptSegment>,
    /// Detected (or requested) language code
    pub language: String,
    /// Audio duration in seconds
    pub duration: f64,
}

/// Mean embedding for one diarized speaker, used by speaker recognition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeakerEmbedding {
    /// Opaque per-run speaker ID from diarization
    pub speaker_id: String,
    /// Mean embedding vector over the speaker's segments
    pub embedding: Vec<f32>,
    /// Number of segments averaged into the embedding
    pub segment_count: u32,
}

/// One or more transcript segments merged under a single speaker label
///
/// Produced by the aligner; consumed by the document renderer. Immutable
/// once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributedBlock {
    /// Start time of the first constituent segment, in seconds
    pub start_time: f64,
    /// Display label for the attributed speaker
    pub speaker_label: String,
    /// Constituent segment texts joined by single spaces
    pub text: String,
}

/// Mapping from opaque diarization speaker IDs to display labels
///
/// Derived per transcription run unless the speaker-recognition layer
/// supplies one keyed by long-term identity. Labels are only stable within
/// the run that derived them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpeakerLabelMap(BTreeMap<String, String>);

impl SpeakerLabelMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive labels from the distinct speaker IDs of one diarization result
    ///
    /// IDs are sorted lexicographically and assigned `SPEAKER_1..SPEAKER_N`
    /// in that order, so the same set of IDs always produces the same map.
    pub fn derive<'a, I>(speaker_ids: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let distinct: BTreeSet<&str> = speaker_ids.into_iter().collect();
        let map = distinct
            .into_iter()
            .enumerate()
            .map(|(i, id)| (id.to_string(), format!("SPEAKER_{}", i + 1)))
            .collect();
        Self(map)
    }

    /// Assign a label to a speaker ID, replacing any previous assignment
    pub fn insert(&mut self, speaker_id: impl Into<String>, label: impl Into<String>) {
        self.0.insert(speaker_id.into(), label.into());
    }

    /// Look up the label for a speaker ID
    pub fn label_for(&self, speaker_id: &str) -> Option<&str> {
        self.0.get(speaker_id).map(String::as_str)
    }

    /// Number of mapped speakers
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the map has no entries
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over (speaker ID, label) pairs in speaker-ID order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Audio file information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioInfo {
    /// File path
    pub path: String,
    /// Duration in seconds
    pub duration: f64,
    /// Sample rate
    pub sample_rate: u32,
    /// Channel count
    pub channels: u16,
    /// Bits per sample
    pub bits_per_sample: u16,
}
