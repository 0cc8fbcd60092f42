//! Speaker diarization provider using pyannote-rs

use std::path::Path;

use meetscribe_core::SpeakerEmbedding;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::DiarizationError;

/// Speaker turn from diarization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeakerSegment {
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds
    pub end: f64,
    /// Opaque per-run speaker ID (e.g. "SPEAKER_00")
    pub speaker_id: String,
    /// Confidence score (0.0 - 1.0)
    pub confidence: f64,
}

impl SpeakerSegment {
    /// Get the duration of this segment
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Diarization result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiarizationResult {
    /// Speaker turns in time order
    pub segments: Vec<SpeakerSegment>,
    /// Number of distinct speakers detected
    pub num_speakers: usize,
    /// Total audio duration covered
    pub duration: f64,
    /// Mean embedding per speaker, for the recognition layer
    pub embeddings: Vec<SpeakerEmbedding>,
}

/// Diarization options
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiarizationOptions {
    /// Maximum number of speakers (None = unbounded)
    pub max_speakers: Option<u32>,
}

/// Diarization progress information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiarizationProgress {
    /// Progress fraction (0.0 - 1.0)
    pub fraction: f64,
    /// Current stage description
    pub stage: String,
}

/// Speaker diarization provider using pyannote-rs
///
/// Model lifecycle is explicit: nothing is loaded at construction, and
/// `diarize` fails until `load_models` has been called.
pub struct DiarizationProvider {
    /// Path to the segmentation model (ONNX)
    segmentation_model_path: Option<String>,
    /// Path to the speaker embedding model (ONNX)
    embedding_model_path: Option<String>,
    is_loaded: bool,
}

impl DiarizationProvider {
    /// Create a new DiarizationProvider
    pub fn new() -> Self {
        Self {
            segmentation_model_path: None,
            embedding_model_path: None,
            is_loaded: false,
        }
    }

    /// Check if models are loaded
    pub fn is_loaded(&self) -> bool {
        self.is_loaded
    }

    /// Load diarization models
    ///
    /// # Arguments
    /// * `segmentation_model_path` - Path to segmentation-3.0.onnx
    /// * `embedding_model_path` - Path to wespeaker-voxceleb-resnet34-LM.onnx
    pub fn load_models(
        &mut self,
        segmentation_model_path: &str,
        embedding_model_path: &str,
    ) -> Result<(), DiarizationError> {
        info!("Loading diarization models...");

        if !Path::new(segmentation_model_path).exists() {
            return Err(DiarizationError::FileNotFound(
                segmentation_model_path.to_string(),
            ));
        }

        if !Path::new(embedding_model_path).exists() {
            return Err(DiarizationError::FileNotFound(
                embedding_model_path.to_string(),
            ));
        }

        // ONNX sessions are created per diarization run; only the paths are held.
        self.segmentation_model_path = Some(segmentation_model_path.to_string());
        self.embedding_model_path = Some(embedding_model_path.to_string());
        self.is_loaded = true;

        info!("Diarization models loaded successfully");
        Ok(())
    }

    /// Unload models
    pub fn unload(&mut self) {
        self.segmentation_model_path = None;
        self.embedding_model_path = None;
        self.is_loaded = false;
        info!("Diarization models unloaded");
    }

    /// Perform speaker diarization on 16 kHz mono PCM samples
    pub async fn diarize<F>(
        &self,
        samples: Vec<i16>,
        sample_rate: u32,
        options: DiarizationOptions,
        progress_callback: F,
    ) -> Result<DiarizationResult, DiarizationError>
    where
        F: Fn(DiarizationProgress) + Send + Clone + 'static,
    {
        if !self.is_loaded {
            return Err(DiarizationError::ModelNotLoaded);
        }

        let segmentation_path = self
            .segmentation_model_path
            .clone()
            .ok_or(DiarizationError::ModelNotLoaded)?;
        let embedding_path = self
            .embedding_model_path
            .clone()
            .ok_or(DiarizationError::ModelNotLoaded)?;

        info!("Starting diarization ({} samples)", samples.len());
        debug!("Options: {:?}", options);

        let callback = progress_callback.clone();

        let result = tokio::task::spawn_blocking(move || {
            use pyannote_rs::{get_segments, EmbeddingExtractor};

            callback(DiarizationProgress {
                fraction: 0.1,
                stage: "Running voice activity detection...".to_string(),
            });

            let segments_iter = get_segments(&samples, sample_rate, &segmentation_path)
                .map_err(|e| {
                    DiarizationError::ModelLoadFailed(format!(
                        "Failed to load segmentation model: {}",
                        e
                    ))
                })?;

            let mut vad_segments = Vec::new();
            for segment_result in segments_iter {
                match segment_result {
                    Ok(segment) => vad_segments.push(segment),
                    Err(e) => debug!("Segment processing error: {}", e),
                }
            }

            callback(DiarizationProgress {
                fraction: 0.4,
                stage: "Extracting speaker embeddings...".to_string(),
            });

            let mut extractor = EmbeddingExtractor::new(&embedding_path).map_err(|e| {
                DiarizationError::ModelLoadFailed(format!("Failed to load embedding model: {}", e))
            })?;

            callback(DiarizationProgress {
                fraction: 0.6,
                stage: "Clustering speakers...".to_string(),
            });

            let mut speaker_segments = Vec::new();
            let mut clusters: Vec<SpeakerCluster> = Vec::new();
            let total_segments = vad_segments.len();

            for (idx, segment) in vad_segments.iter().enumerate() {
                let embedding: Vec<f32> = extractor
                    .compute(&segment.samples)
                    .map_err(|e| {
                        DiarizationError::DiarizationFailed(format!(
                            "Failed to compute embedding: {}",
                            e
                        ))
                    })?
                    .collect();

                let speaker_id =
                    assign_to_cluster(&embedding, &mut clusters, options.max_speakers);

                speaker_segments.push(SpeakerSegment {
                    start: segment.start,
                    end: segment.end,
                    speaker_id,
                    confidence: 0.9, // pyannote-rs doesn't provide confidence
                });

                if idx % 10 == 0 {
                    let progress = 0.6 + 0.3 * (idx as f64 / total_segments as f64);
                    callback(DiarizationProgress {
                        fraction: progress,
                        stage: format!("Processing segment {}/{}...", idx + 1, total_segments),
                    });
                }
            }

            let duration = speaker_segments
                .iter()
                .map(|s| s.end)
                .fold(0.0f64, |a, b| a.max(b));

            let embeddings = clusters
                .iter()
                .map(SpeakerCluster::mean_embedding)
                .collect();

            callback(DiarizationProgress {
                fraction: 1.0,
                stage: "Complete".to_string(),
            });

            Ok::<_, DiarizationError>(DiarizationResult {
                num_speakers: clusters.len(),
                segments: speaker_segments,
                duration,
                embeddings,
            })
        })
        .await
        .map_err(|e| DiarizationError::DiarizationFailed(e.to_string()))??;

        info!(
            "Diarization completed: {} speakers, {} segments",
            result.num_speakers,
            result.segments.len()
        );

        Ok(result)
    }
}

impl Default for DiarizationProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// Running embedding sum for one clustered speaker
struct SpeakerCluster {
    speaker_id: String,
    embedding_sum: Vec<f32>,
    segment_count: u32,
}

impl SpeakerCluster {
    fn new(speaker_id: String, embedding: &[f32]) -> Self {
        Self {
            speaker_id,
            embedding_sum: embedding.to_vec(),
            segment_count: 1,
        }
    }

    fn add(&mut self, embedding: &[f32]) {
        for (sum, value) in self.embedding_sum.iter_mut().zip(embedding) {
            *sum += value;
        }
        self.segment_count += 1;
    }

    fn mean(&self) -> Vec<f32> {
        let n = self.segment_count as f32;
        self.embedding_sum.iter().map(|v| v / n).collect()
    }

    fn mean_embedding(&self) -> SpeakerEmbedding {
        SpeakerEmbedding {
            speaker_id: self.speaker_id.clone(),
            embedding: self.mean(),
            segment_count: self.segment_count,
        }
    }
}

/// Assign an embedding to the closest existing cluster or open a new one
fn assign_to_cluster(
    embedding: &[f32],
    clusters: &mut Vec<SpeakerCluster>,
    max_speakers: Option<u32>,
) -> String {
    const SIMILARITY_THRESHOLD: f32 = 0.6;

    let mut best_match: Option<(usize, f32)> = None;

    for (idx, cluster) in clusters.iter().enumerate() {
        let similarity = cosine_similarity(embedding, &cluster.mean());
        if similarity > SIMILARITY_THRESHOLD
            && best_match.map_or(true, |(_, best)| similarity > best)
        {
            best_match = Some((idx, similarity));
        }
    }

    if let Some((idx, _)) = best_match {
        clusters[idx].add(embedding);
        return clusters[idx].speaker_id.clone();
    }

    // At the speaker cap, fall back to the closest cluster even below threshold.
    if let Some(max) = max_speakers {
        if clusters.len() >= max as usize {
            if let Some((idx, _)) = clusters
                .iter()
                .enumerate()
                .map(|(i, c)| (i, cosine_similarity(embedding, &c.mean())))
                .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            {
                clusters[idx].add(embedding);
                return clusters[idx].speaker_id.clone();
            }
        }
    }

    let speaker_id = format!("SPEAKER_{:02}", clusters.len());
    clusters.push(SpeakerCluster::new(speaker_id.clone(), embedding));
    speaker_id
}

/// Calculate cosine similarity between two vectors
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

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);

        let c = vec![0.0, 1.0, 0.0];
        assert!(cosine_similarity(&a, &c).abs() < 0.001);
    }

    #[test]
    fn test_speaker_segment_duration() {
        let segment = SpeakerSegment {
            start: 1.0,
            end: 3.5,
            speaker_id: "SPEAKER_00".to_string(),
            confidence: 0.9,
        };
        assert!((segment.duration() - 2.5).abs() < 0.001);
    }

    #[test]
    fn test_clustering_reuses_similar_embeddings() {
        let mut clusters = Vec::new();

        let first = assign_to_cluster(&[1.0, 0.0], &mut clusters, None);
        let same = assign_to_cluster(&[0.99, 0.01], &mut clusters, None);
        let other = assign_to_cluster(&[0.0, 1.0], &mut clusters, None);

        assert_eq!(first, "SPEAKER_00");
        assert_eq!(same, "SPEAKER_00");
        assert_eq!(other, "SPEAKER_01");
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].segment_count, 2);
    }

    #[test]
    fn test_clustering_respects_max_speakers() {
        let mut clusters = Vec::new();

        assign_to_cluster(&[1.0, 0.0], &mut clusters, Some(1));
        // Dissimilar, but the cap forces assignment to the closest cluster.
        let forced = assign_to_cluster(&[0.0, 1.0], &mut clusters, Some(1));

        assert_eq!(forced, "SPEAKER_00");
        assert_eq!(clusters.len(), 1);
    }

    #[test]
    fn test_cluster_mean_embedding() {
        let mut cluster = SpeakerCluster::new("SPEAKER_00".to_string(), &[1.0, 0.0]);
        cluster.add(&[0.0, 1.0]);

        let mean = cluster.mean_embedding();
        assert_eq!(mean.segment_count, 2);
        assert!((mean.embedding[0] - 0.5).abs() < 1e-6);
        assert!((mean.embedding[1] - 0.5).abs() < 1e-6);
    }
}
