//! Command-line arguments

use std::path::PathBuf;

use clap::Parser;

/// Transcribe audio files with optional speaker diarization
#[derive(Debug, Parser)]
#[command(name = "meetscribe", version, about)]
pub struct Cli {
    /// Audio file or directory to process
    pub input: Option<PathBuf>,

    /// Whisper model size: tiny, base, small, medium, large-v3, turbo
    #[arg(short, long)]
    pub model: Option<String>,

    /// Language code (e.g. en, ja, de); default: auto-detect
    #[arg(short, long)]
    pub language: Option<String>,

    /// Directory for generated transcripts (default: next to the audio)
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Speaker profile database file
    #[arg(long, value_name = "FILE")]
    pub speaker_db: Option<PathBuf>,

    /// Disable speaker diarization (faster)
    #[arg(long)]
    pub no_diarization: bool,

    /// Disable speaker recognition (speakers still get per-file labels)
    #[arg(long)]
    pub no_recognition: bool,

    /// List all speakers in the database
    #[arg(long)]
    pub list_speakers: bool,

    /// Rename a speaker in the database
    #[arg(long, num_args = 2, value_names = ["OLD", "NEW"])]
    pub rename_speaker: Option<Vec<String>>,

    /// Delete a speaker from the database
    #[arg(long, value_name = "NAME")]
    pub delete_speaker: Option<String>,
}
