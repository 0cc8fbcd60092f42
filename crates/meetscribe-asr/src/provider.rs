//! Whisper ASR provider using whisper-rs

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use meetscribe_core::{TranscriptResult, TranscriptSegment};

use crate::error::AsrError;
use crate::languages::Language;

/// Sample rate the model expects
pub const WHISPER_SAMPLE_RATE: u32 = 16000;

/// Transcription options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionOptions {
    /// Language code, or None to auto-detect
    pub language: Option<String>,
    /// Number of threads (0 = auto)
    pub threads: u32,
}

impl Default for TranscriptionOptions {
    fn default() -> Self {
        Self {
            language: None,
            threads: 0,
        }
    }
}

/// Transcription progress information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscribeProgress {
    /// Progress fraction (0.0 - 1.0)
    pub fraction: f64,
    /// Processed time in seconds
    pub processed_time: f64,
    /// Total audio duration in seconds
    pub total_time: f64,
}

/// Whisper ASR provider
///
/// Model lifecycle is explicit: construct empty, `load_model`, transcribe any
/// number of times, `unload`.
pub struct WhisperProvider {
    context: Option<Arc<Mutex<WhisperContext>>>,
    model_path: Option<String>,
}

impl WhisperProvider {
    /// Create a new WhisperProvider
    pub fn new() -> Self {
        Self {
            context: None,
            model_path: None,
        }
    }

    /// Check if a model is loaded
    pub fn is_loaded(&self) -> bool {
        self.context.is_some()
    }

    /// Get the loaded model path
    pub fn model_path(&self) -> Option<&str> {
        self.model_path.as_deref()
    }

    /// Load a Whisper model from file
    pub async fn load_model(&mut self, model_path: &str) -> Result<(), AsrError> {
        info!("Loading Whisper model from: {}", model_path);

        if !Path::new(model_path).exists() {
            return Err(AsrError::FileNotFound(model_path.to_string()));
        }

        let path = model_path.to_string();
        let context = tokio::task::spawn_blocking(move || {
            let params = WhisperContextParameters::default();
            WhisperContext::new_with_params(&path, params)
        })
        .await
        .map_err(|e| AsrError::ModelLoadFailed(e.to_string()))?
        .map_err(|e| AsrError::ModelLoadFailed(e.to_string()))?;

        self.context = Some(Arc::new(Mutex::new(context)));
        self.model_path = Some(model_path.to_string());

        info!("Whisper model loaded successfully");
        Ok(())
    }

    /// Unload the current model
    pub fn unload(&mut self) {
        self.context = None;
        self.model_path = None;
        info!("Whisper model unloaded");
    }

    /// Transcribe 16 kHz mono f32 samples
    ///
    /// Returns time-stamped segments and the detected language. With
    /// `options.language = None` the language is auto-detected and the
    /// detected code is reported in the result.
    pub async fn transcribe<F>(
        &self,
        samples: Vec<f32>,
        options: TranscriptionOptions,
        progress_callback: F,
    ) -> Result<TranscriptResult, AsrError>
    where
        F: Fn(TranscribeProgress) + Send + Clone + 'static,
    {
        let whisper_lang = match options.language.as_deref() {
            Some(code) => {
                if !Language::is_supported(code) {
                    return Err(AsrError::UnsupportedLanguage(code.to_string()));
                }
                Language::to_whisper_code(code)
            }
            None => "auto",
        };

        let context = self.context.as_ref().ok_or(AsrError::ModelNotLoaded)?;

        let total_duration = samples.len() as f64 / WHISPER_SAMPLE_RATE as f64;

        info!("Starting transcription ({:.1}s of audio)", total_duration);
        debug!("Options: {:?}", options);

        let context = context.clone();
        let callback = progress_callback.clone();

        let result = tokio::task::spawn_blocking(move || {
            let ctx = context.blocking_lock();

            let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
            params.set_language(Some(whisper_lang));
            params.set_print_progress(false);
            params.set_print_realtime(false);

            if options.threads > 0 {
                params.set_n_threads(options.threads as i32);
            }

            let mut state = ctx
                .create_state()
                .map_err(|e| AsrError::TranscriptionFailed(e.to_string()))?;

            state
                .full(params, &samples)
                .map_err(|e| AsrError::TranscriptionFailed(e.to_string()))?;

            let detected_language = match options.language {
                Some(code) => code,
                None => state
                    .full_lang_id_from_state()
                    .ok()
                    .and_then(|id| whisper_rs::get_lang_str(id))
                    .unwrap_or("auto")
                    .to_string(),
            };

            let num_segments = state
                .full_n_segments()
                .map_err(|e| AsrError::TranscriptionFailed(e.to_string()))?;

            let mut segments = Vec::new();

            for i in 0..num_segments {
                let text = state
                    .full_get_segment_text(i)
                    .map_err(|e| AsrError::TranscriptionFailed(e.to_string()))?;

                // Timestamps come back in centiseconds
                let start = state
                    .full_get_segment_t0(i)
                    .map_err(|e| AsrError::TranscriptionFailed(e.to_string()))?
                    as f64
                    / 100.0;

                let end = state
                    .full_get_segment_t1(i)
                    .map_err(|e| AsrError::TranscriptionFailed(e.to_string()))?
                    as f64
                    / 100.0;

                let clean_text = clean_whisper_text(&text);
                if !clean_text.is_empty() {
                    segments.push(TranscriptSegment {
                        start,
                        end,
                        text: clean_text,
                    });

                    let progress = (i as f64 + 1.0) / num_segments as f64;
                    callback(TranscribeProgress {
                        fraction: progress.min(0.99),
                        processed_time: end,
                        total_time: total_duration,
                    });
                }
            }

            Ok::<_, AsrError>(TranscriptResult {
                segments,
                language: detected_language,
                duration: total_duration,
            })
        })
        .await
        .map_err(|e| AsrError::TranscriptionFailed(e.to_string()))??;

        progress_callback(TranscribeProgress {
            fraction: 1.0,
            processed_time: total_duration,
            total_time: total_duration,
        });

        info!(
            "Transcription completed: {} segments, language '{}'",
            result.segments.len(),
            result.language
        );
        Ok(result)
    }
}

impl Default for WhisperProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// Clean Whisper output text by removing special tokens
fn clean_whisper_text(text: &str) -> String {
    let re = regex::Regex::new(r"<\|[^|]+\|>").unwrap();
    re.replace_all(text, "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_whisper_text() {
        assert_eq!(clean_whisper_text("<|startoftranscript|>Hello"), "Hello");
        assert_eq!(clean_whisper_text("Hello<|endoftext|>"), "Hello");
        assert_eq!(clean_whisper_text("  plain text  "), "plain text");
        assert_eq!(clean_whisper_text("<|en|><|notimestamps|>"), "");
    }

    #[test]
    fn test_language_mapping() {
        assert_eq!(Language::to_whisper_code("en"), "en");
        assert_eq!(Language::to_whisper_code("zh-TW"), "zh");
        assert_eq!(Language::to_whisper_code("yue"), "yue");
    }

    #[test]
    fn test_language_support() {
        assert!(Language::is_supported("ja"));
        assert!(!Language::is_supported("tlh"));
    }

    #[test]
    fn test_transcribe_without_model_fails() {
        let provider = WhisperProvider::new();
        assert!(!provider.is_loaded());

        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        let result = runtime.block_on(provider.transcribe(
            vec![0.0; 16000],
            TranscriptionOptions::default(),
            |_| {},
        ));
        assert!(matches!(result, Err(AsrError::ModelNotLoaded)));
    }

    #[test]
    fn test_unsupported_language_rejected() {
        let provider = WhisperProvider::new();
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        let result = runtime.block_on(provider.transcribe(
            vec![0.0; 16000],
            TranscriptionOptions {
                language: Some("tlh".to_string()),
                threads: 0,
            },
            |_| {},
        ));
        assert!(matches!(result, Err(AsrError::UnsupportedLanguage(_))));
    }
}
