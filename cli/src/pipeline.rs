//! Batch transcription pipeline
//!
//! Files are processed strictly one at a time; model inference never runs in
//! parallel. A failure on one file is logged and the batch moves on.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use meetscribe_asr::{TranscriptionOptions, WhisperProvider, WHISPER_SAMPLE_RATE};
use meetscribe_core::audio::{AudioError, AudioProcessor};
use meetscribe_core::{DocumentRenderer, TranscriptDocument};
use meetscribe_diarization::{align, DiarizationOptions, DiarizationProvider};
use meetscribe_models::{registry, DownloadProgress, ModelManager};
use meetscribe_speakers::{recognize_speakers, SpeakerStore};

use crate::config::Config;
use crate::discover;

/// Loaded providers plus run configuration
pub struct Pipeline {
    config: Config,
    asr: WhisperProvider,
    diarization: Option<DiarizationProvider>,
    store: Option<SpeakerStore>,
}

impl Pipeline {
    /// Fetch models and load providers
    ///
    /// The Whisper model is required; diarization setup failures downgrade to
    /// a warning and the pipeline runs without speaker labels.
    pub async fn prepare(config: Config) -> Result<Self> {
        let manager = ModelManager::new()?;

        let whisper_spec = registry::whisper_for_size(&config.model)
            .with_context(|| format!("Unknown model size '{}'", config.model))?;
        if !manager.is_cached(whisper_spec) {
            info!(
                "Downloading Whisper model '{}' ({})...",
                config.model,
                whisper_spec.size_string()
            );
        }
        let whisper_path = manager
            .ensure(whisper_spec, log_download)
            .await
            .context("Failed to fetch the Whisper model")?;

        let mut asr = WhisperProvider::new();
        asr.load_model(whisper_path.to_str().context("Non-UTF-8 model path")?)
            .await
            .context("Failed to load the Whisper model")?;

        let diarization = if config.diarization {
            match Self::prepare_diarization(&manager).await {
                Ok(provider) => Some(provider),
                Err(e) => {
                    warn!(
                        "Diarization unavailable, continuing without speaker labels: {:#}",
                        e
                    );
                    None
                }
            }
        } else {
            None
        };

        let store = if diarization.is_some() && config.recognition {
            Some(SpeakerStore::open(&config.speaker_db))
        } else {
            None
        };

        Ok(Self {
            config,
            asr,
            diarization,
            store,
        })
    }

    async fn prepare_diarization(manager: &ModelManager) -> Result<DiarizationProvider> {
        let segmentation = manager
            .ensure_by_id("pyannote-segmentation", log_download)
            .await?;
        let embedding = manager
            .ensure_by_id("wespeaker-embedding", log_download)
            .await?;

        let mut provider = DiarizationProvider::new();
        provider.load_models(
            segmentation.to_str().context("Non-UTF-8 model path")?,
            embedding.to_str().context("Non-UTF-8 model path")?,
        )?;
        Ok(provider)
    }

    /// Process each file in order; returns how many succeeded
    pub async fn run(&mut self, files: &[PathBuf]) -> usize {
        let mut succeeded = 0;

        for path in files {
            match self.process_file(path).await {
                Ok(output) => {
                    succeeded += 1;
                    info!("Transcript saved: {}", output.display());
                }
                Err(e) => warn!("Skipping {}: {:#}", path.display(), e),
            }
        }

        succeeded
    }

    /// Transcribe, diarize, align, and render one audio file
    async fn process_file(&mut self, path: &Path) -> Result<PathBuf> {
        let audio_path = path.to_path_buf();
        let (audio_info, audio) = tokio::task::spawn_blocking(move || {
            let processor = AudioProcessor::new(WHISPER_SAMPLE_RATE);
            let info = processor.get_info(&audio_path)?;
            let audio = processor.load(&audio_path)?;
            Ok::<_, AudioError>((info, audio))
        })
        .await??;

        info!(
            "Transcribing: {} ({:.1} minutes)",
            path.display(),
            audio_info.duration / 60.0
        );

        let pcm = self.diarization.is_some().then(|| audio.to_i16());
        let sample_rate = audio.sample_rate;

        let options = TranscriptionOptions {
            language: self.config.language.clone(),
            threads: 0,
        };
        let transcript = self
            .asr
            .transcribe(audio.samples, options, |p| {
                debug!("Transcription progress: {:.0}%", p.fraction * 100.0);
            })
            .await
            .context("Transcription failed")?;

        info!(
            "Transcribed {} segments, language '{}'",
            transcript.segments.len(),
            transcript.language
        );

        let diarization = match (&self.diarization, pcm) {
            (Some(provider), Some(pcm)) => {
                match provider
                    .diarize(pcm, sample_rate, DiarizationOptions::default(), |p| {
                        debug!("Diarization: {}", p.stage);
                    })
                    .await
                {
                    Ok(result) if result.segments.is_empty() => {
                        warn!("No speakers detected, continuing without speaker labels");
                        None
                    }
                    Ok(result) => Some(result),
                    Err(e) => {
                        warn!(
                            "Diarization unavailable, continuing without speaker labels: {}",
                            e
                        );
                        None
                    }
                }
            }
            _ => None,
        };

        let label_map = match (&diarization, self.store.as_mut()) {
            (Some(result), Some(store)) => {
                let labels = recognize_speakers(store, &result.embeddings);
                if let Err(e) = store.save() {
                    warn!("Failed to save speaker database: {}", e);
                }
                Some(labels)
            }
            _ => None,
        };

        let blocks = align(
            &transcript.segments,
            diarization.as_ref().map(|d| d.segments.as_slice()),
            label_map.as_ref(),
        );

        let mut document = TranscriptDocument::for_audio(path, blocks, &self.config.model);
        document.language = Some(transcript.language);
        document.duration = Some(if audio_info.duration > 0.0 {
            audio_info.duration
        } else {
            transcript.duration
        });
        document.diarized = diarization.is_some();

        let output = discover::transcript_path(path, self.config.output_dir.as_deref());
        DocumentRenderer::write(&document, &output).context("Failed to write transcript")?;
        Ok(output)
    }
}

fn log_download(progress: DownloadProgress) {
    debug!(
        "Downloading {}: {:.0}%",
        progress.model_id,
        progress.fraction * 100.0
    );
}
