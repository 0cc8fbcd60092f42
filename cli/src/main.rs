//! meetscribe - batch audio transcription with speaker attribution

mod args;
mod config;
mod discover;
mod pipeline;

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use meetscribe_speakers::SpeakerStore;

use crate::args::Cli;
use crate::config::Config;
use crate::pipeline::Pipeline;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::resolve(&cli)?;

    // Speaker database maintenance runs instead of transcription.
    if cli.list_speakers {
        return list_speakers(&config);
    }
    if let Some(pair) = &cli.rename_speaker {
        return rename_speaker(&config, &pair[0], &pair[1]);
    }
    if let Some(name) = &cli.delete_speaker {
        return delete_speaker(&config, name);
    }

    let Some(input) = cli.input.clone() else {
        bail!("No audio file or directory given (see --help)");
    };

    let files = collect_files(&input, &config)?;
    if files.is_empty() {
        info!(
            "No untranscribed audio files found in {} (files with existing .md transcripts are skipped)",
            input.display()
        );
        return Ok(());
    }

    info!(
        "Configuration: model={}, language={}, diarization={}",
        config.model,
        config.language.as_deref().unwrap_or("auto-detect"),
        if config.diarization { "enabled" } else { "disabled" }
    );

    let total = files.len();
    let mut pipeline = Pipeline::prepare(config).await?;
    let succeeded = pipeline.run(&files).await;

    info!("Completed: {}/{} files transcribed successfully", succeeded, total);
    Ok(())
}

/// Expand the input argument into the list of files to process
fn collect_files(input: &PathBuf, config: &Config) -> Result<Vec<PathBuf>> {
    if !input.exists() {
        bail!("Path not found: {}", input.display());
    }

    if input.is_file() {
        if !discover::is_audio_file(input) {
            bail!(
                "Not a supported audio file: {} (supported: {})",
                input.display(),
                discover::AUDIO_EXTENSIONS.join(", ")
            );
        }
        return Ok(vec![input.clone()]);
    }

    let files = discover::find_untranscribed(input, config.output_dir.as_deref())?;
    if !files.is_empty() {
        info!("Found {} untranscribed audio file(s):", files.len());
        for file in &files {
            info!("  - {}", file.display());
        }
    }
    Ok(files)
}

fn list_speakers(config: &Config) -> Result<()> {
    let store = SpeakerStore::open(&config.speaker_db);

    if store.is_empty() {
        println!("No speakers in database.");
        println!("Process audio files with diarization to build speaker profiles.");
        return Ok(());
    }

    println!("\nSpeaker database ({} profiles):", store.len());
    println!("{}", "-".repeat(60));

    let (named, unknown): (Vec<_>, Vec<_>) = store
        .iter()
        .partition(|(name, _)| !name.starts_with("UNKNOWN_"));

    for (name, profile) in named.iter().chain(unknown.iter()) {
        println!("  {}", name);
        println!(
            "    Samples: {}, Description: {}",
            profile.sample_count,
            profile.description.chars().take(50).collect::<String>()
        );
    }

    if !unknown.is_empty() {
        println!("\nTip: rename unknown speakers with: --rename-speaker OLD_NAME NEW_NAME");
    }
    Ok(())
}

fn rename_speaker(config: &Config, old_name: &str, new_name: &str) -> Result<()> {
    let mut store = SpeakerStore::open(&config.speaker_db);
    store.rename(old_name, new_name)?;
    store.save()?;
    println!("Renamed '{}' to '{}'", old_name, new_name);
    Ok(())
}

fn delete_speaker(config: &Config, name: &str) -> Result<()> {
    let mut store = SpeakerStore::open(&config.speaker_db);
    store.delete(name)?;
    store.save()?;
    println!("Deleted speaker '{}'", name);
    Ok(())
}
