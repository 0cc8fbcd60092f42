//! Markdown transcript document rendering

use std::fs;
use std::path::Path;

use chrono::Local;
use thiserror::Error;

use crate::types::AttributedBlock;

/// Document rendering errors
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Everything needed to render one transcript document
#[derive(Debug, Clone)]
pub struct TranscriptDocument {
    /// Audio file name, e.g. `2024-12-02-standup.m4a`
    pub audio_file: String,
    /// Audio file stem, used as the document title
    pub title: String,
    /// Speaker-attributed blocks in transcript order
    pub blocks: Vec<AttributedBlock>,
    /// Detected language code, if known
    pub language: Option<String>,
    /// Audio duration in seconds, if known
    pub duration: Option<f64>,
    /// Model size used for transcription
    pub model: String,
    /// Whether speaker diarization was applied
    pub diarized: bool,
}

impl TranscriptDocument {
    /// Build a document for the given audio path
    pub fn for_audio<P: AsRef<Path>>(path: P, blocks: Vec<AttributedBlock>, model: &str) -> Self {
        let path = path.as_ref();
        Self {
            audio_file: path
                .file_name()
                .and_then(|s| s.to_str())
                .unwrap_or("unknown")
                .to_string(),
            title: path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("unknown")
                .to_string(),
            blocks,
            language: None,
            duration: None,
            model: model.to_string(),
            diarized: false,
        }
    }
}

/// Renders transcript documents as markdown
pub struct DocumentRenderer;

impl DocumentRenderer {
    /// Render the full markdown document
    pub fn render(doc: &TranscriptDocument) -> String {
        let recording_date = Self::recording_date(&doc.title)
            .unwrap_or_else(|| "See filename".to_string());
        let duration_str = doc
            .duration
            .map(|d| format!("{:.1} minutes", d / 60.0))
            .unwrap_or_else(|| "Unknown".to_string());
        let participants = if doc.diarized {
            "See transcript"
        } else {
            "Speaker diarization not available"
        };

        let mut md = String::new();
        md.push_str(&format!("# Meeting Transcript: {}\n\n", doc.title));
        md.push_str(&format!("**Date**: {}\n", recording_date));
        md.push_str(&format!("**Duration**: {}\n", duration_str));
        md.push_str(&format!("**Participants**: {}\n", participants));
        md.push_str(&format!("**Audio file**: {}\n\n", doc.audio_file));
        md.push_str("---\n\n## Transcript\n\n");
        md.push_str(&Self::render_blocks(&doc.blocks, doc.diarized));
        md.push_str("\n\n---\n\n## Metadata\n\n");
        md.push_str(&format!(
            "- **Transcribed**: {}\n",
            Local::now().format("%Y-%m-%d %H:%M")
        ));
        md.push_str(&format!("- **Model**: Whisper {}\n", doc.model));
        md.push_str(&format!(
            "- **Language**: {}\n",
            doc.language.as_deref().unwrap_or("auto-detected")
        ));
        md.push_str(&format!(
            "- **Speaker diarization**: {}\n",
            if doc.diarized { "Yes" } else { "No" }
        ));
        md
    }

    /// Render the transcript body
    ///
    /// Each attributed block becomes one paragraph; blocks are separated by a
    /// blank line. Without diarization the speaker tag is omitted and each
    /// block renders as a plain time-stamped line.
    pub fn render_blocks(blocks: &[AttributedBlock], diarized: bool) -> String {
        let paragraphs: Vec<String> = blocks
            .iter()
            .map(|block| {
                let timestamp = Self::format_timestamp(block.start_time);
                if diarized {
                    format!("[{}] [{}]:\n{}", timestamp, block.speaker_label, block.text)
                } else {
                    format!("[{}] {}", timestamp, block.text)
                }
            })
            .collect();
        paragraphs.join("\n\n")
    }

    /// Render and write the document, creating parent directories as needed
    pub fn write<P: AsRef<Path>>(doc: &TranscriptDocument, path: P) -> Result<(), DocumentError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, Self::render(doc))?;
        Ok(())
    }

    /// Format seconds as HH:MM:SS
    pub fn format_timestamp(seconds: f64) -> String {
        let total = seconds as u64;
        let hours = total / 3600;
        let minutes = (total % 3600) / 60;
        let secs = total % 60;
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    }

    /// Extract a recording date from a `YYYY-MM-DD-*` file stem
    fn recording_date(stem: &str) -> Option<String> {
        let parts: Vec<&str> = stem.splitn(4, '-').collect();
        if parts.len() < 3 {
            return None;
        }
        if parts[..3].iter().all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit())) {
            Some(format!("{}-{}-{}", parts[0], parts[1], parts[2]))
        } else {
            None
        }
    }
}
