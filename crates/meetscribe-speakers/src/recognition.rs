//! Embedding-based speaker recognition

use meetscribe_core::{SpeakerEmbedding, SpeakerLabelMap};
use tracing::{debug, info};

use crate::store::{SpeakerProfile, SpeakerStore};

/// Minimum cosine similarity for a profile match (higher = stricter)
pub const SIMILARITY_THRESHOLD: f32 = 0.75;

/// Match diarized speakers against saved profiles
///
/// Each per-run speaker is compared to every stored profile; the best match
/// at or above [`SIMILARITY_THRESHOLD`] lends its name to the label map and
/// absorbs the new sample. Speakers with no match are enrolled under a fresh
/// `UNKNOWN_<n>` name so a later `--rename-speaker` can claim them. The
/// caller is responsible for saving the store afterwards.
pub fn recognize_speakers(
    store: &mut SpeakerStore,
    speakers: &[SpeakerEmbedding],
) -> SpeakerLabelMap {
    let mut labels = SpeakerLabelMap::new();

    for speaker in speakers {
        let best_match = store
            .iter()
            .map(|(name, profile)| {
                (
                    name.to_string(),
                    cosine_similarity(&speaker.embedding, &profile.embedding),
                )
            })
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

        match best_match {
            Some((name, similarity)) if similarity >= SIMILARITY_THRESHOLD => {
                debug!(
                    "Matched {} to '{}' (similarity {:.3})",
                    speaker.speaker_id, name, similarity
                );
                // Reinforce the profile with this recording's voice sample.
                let _ = store.record_sample(&name, &speaker.embedding);
                labels.insert(speaker.speaker_id.clone(), name);
            }
            _ => {
                let name = store.next_unknown_name();
                info!(
                    "Enrolling unrecognized speaker {} as '{}'",
                    speaker.speaker_id, name
                );
                store.insert(
                    name.clone(),
                    SpeakerProfile {
                        embedding: speaker.embedding.clone(),
                        description: String::new(),
                        sample_count: 1,
                    },
                );
                labels.insert(speaker.speaker_id.clone(), name);
            }
        }
    }

    labels
}

/// Calculate cosine similarity between two embeddings
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn embedding(speaker_id: &str, embedding: Vec<f32>) -> SpeakerEmbedding {
        SpeakerEmbedding {
            speaker_id: speaker_id.to_string(),
            embedding,
            segment_count: 1,
        }
    }

    fn open_store() -> SpeakerStore {
        let dir = tempfile::tempdir().unwrap();
        // The store never touches disk in these tests; keep the tempdir alive
        // just long enough to build the path.
        SpeakerStore::open(dir.path().join("speakers.json"))
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_known_speaker_gets_profile_name() {
        let mut store = open_store();
        store.insert(
            "Alice",
            SpeakerProfile {
                embedding: vec![1.0, 0.0, 0.0],
                description: String::new(),
                sample_count: 3,
            },
        );

        let labels = recognize_speakers(
            &mut store,
            &[embedding("SPEAKER_00", vec![0.99, 0.01, 0.0])],
        );

        assert_eq!(labels.label_for("SPEAKER_00"), Some("Alice"));
        // The matching sample reinforces the profile.
        assert_eq!(store.get("Alice").unwrap().sample_count, 4);
    }

    #[test]
    fn test_unknown_speaker_is_enrolled() {
        let mut store = open_store();
        store.insert(
            "Alice",
            SpeakerProfile {
                embedding: vec![1.0, 0.0, 0.0],
                description: String::new(),
                sample_count: 1,
            },
        );

        let labels =
            recognize_speakers(&mut store, &[embedding("SPEAKER_00", vec![0.0, 1.0, 0.0])]);

        assert_eq!(labels.label_for("SPEAKER_00"), Some("UNKNOWN_1"));
        assert_eq!(store.len(), 2);
        assert_eq!(store.get("UNKNOWN_1").unwrap().sample_count, 1);
    }

    #[test]
    fn test_empty_store_enrolls_every_speaker() {
        let mut store = open_store();

        let labels = recognize_speakers(
            &mut store,
            &[
                embedding("SPEAKER_00", vec![1.0, 0.0]),
                embedding("SPEAKER_01", vec![0.0, 1.0]),
            ],
        );

        assert_eq!(labels.label_for("SPEAKER_00"), Some("UNKNOWN_1"));
        assert_eq!(labels.label_for("SPEAKER_01"), Some("UNKNOWN_2"));
        assert_eq!(store.len(), 2);
    }
}
