//! Run configuration
//!
//! Settings are resolved CLI flag first, then environment variable
//! (`MEETSCRIBE_*`, with `.env` support), then built-in default.

use std::env;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use directories::ProjectDirs;

use crate::args::Cli;

const DEFAULT_MODEL: &str = "small";

/// Resolved settings for one invocation
#[derive(Debug, Clone)]
pub struct Config {
    /// Whisper model size name
    pub model: String,
    /// Language code, or None for auto-detection
    pub language: Option<String>,
    /// Transcript output directory; None writes next to the audio file
    pub output_dir: Option<PathBuf>,
    /// Speaker profile database path
    pub speaker_db: PathBuf,
    /// Whether to run speaker diarization
    pub diarization: bool,
    /// Whether to match speakers against the profile database
    pub recognition: bool,
}

impl Config {
    /// Resolve configuration from CLI arguments and the environment
    pub fn resolve(cli: &Cli) -> Result<Self> {
        let model = cli
            .model
            .clone()
            .or_else(|| env::var("MEETSCRIBE_MODEL").ok())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        if meetscribe_models::registry::whisper_for_size(&model).is_none() {
            bail!(
                "Unknown model size '{}' (expected one of: tiny, base, small, medium, large-v3, turbo)",
                model
            );
        }

        let language = cli
            .language
            .clone()
            .or_else(|| env::var("MEETSCRIBE_LANGUAGE").ok());

        let output_dir = cli
            .output_dir
            .clone()
            .or_else(|| env::var("MEETSCRIBE_OUTPUT_DIR").ok().map(PathBuf::from));

        let speaker_db = match cli
            .speaker_db
            .clone()
            .or_else(|| env::var("MEETSCRIBE_SPEAKER_DB").ok().map(PathBuf::from))
        {
            Some(path) => path,
            None => default_speaker_db()?,
        };

        Ok(Self {
            model,
            language,
            output_dir,
            speaker_db,
            diarization: !cli.no_diarization,
            recognition: !cli.no_recognition,
        })
    }
}

fn default_speaker_db() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("dev", "meetscribe", "meetscribe")
        .context("Could not determine data directory for the speaker database")?;
    Ok(dirs.data_dir().join("speaker_profiles.json"))
}
