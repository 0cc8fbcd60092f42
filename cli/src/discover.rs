//! Audio file discovery

use std::io;
use std::path::{Path, PathBuf};

/// Supported audio file extensions
pub const AUDIO_EXTENSIONS: &[&str] = &["flac", "m4a", "mp3", "mp4", "ogg", "wav", "webm"];

/// Check whether a path looks like a supported audio file
pub fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .is_some_and(|e| AUDIO_EXTENSIONS.contains(&e.as_str()))
}

/// Where the transcript for an audio file is written
///
/// Defaults to a sibling `.md` file; with an output directory the transcript
/// keeps the audio stem but moves there.
pub fn transcript_path(audio: &Path, output_dir: Option<&Path>) -> PathBuf {
    match output_dir {
        Some(dir) => dir.join(audio.with_extension("md").file_name().unwrap_or_default()),
        None => audio.with_extension("md"),
    }
}

/// Find audio files in a directory that have no transcript yet, sorted
pub fn find_untranscribed(dir: &Path, output_dir: Option<&Path>) -> io::Result<Vec<PathBuf>> {
    let mut untranscribed = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() || !is_audio_file(&path) {
            continue;
        }
        if !transcript_path(&path, output_dir).exists() {
            untranscribed.push(path);
        }
    }

    untranscribed.sort();
    Ok(untranscribed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_is_audio_file() {
        assert!(is_audio_file(Path::new("meeting.m4a")));
        assert!(is_audio_file(Path::new("MEETING.WAV")));
        assert!(!is_audio_file(Path::new("notes.txt")));
        assert!(!is_audio_file(Path::new("no_extension")));
    }

    #[test]
    fn test_transcript_path() {
        assert_eq!(
            transcript_path(Path::new("/audio/standup.m4a"), None),
            PathBuf::from("/audio/standup.md")
        );
        assert_eq!(
            transcript_path(Path::new("/audio/standup.m4a"), Some(Path::new("/out"))),
            PathBuf::from("/out/standup.md")
        );
    }

    #[test]
    fn test_find_untranscribed_skips_done_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.wav"), b"").unwrap();
        fs::write(dir.path().join("a.mp3"), b"").unwrap();
        fs::write(dir.path().join("done.m4a"), b"").unwrap();
        fs::write(dir.path().join("done.md"), b"").unwrap();
        fs::write(dir.path().join("notes.txt"), b"").unwrap();

        let found = find_untranscribed(dir.path(), None).unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();

        assert_eq!(names, ["a.mp3", "b.wav"]);
    }

    #[test]
    fn test_find_untranscribed_with_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("one.wav"), b"").unwrap();
        fs::write(dir.path().join("two.wav"), b"").unwrap();
        fs::write(out.path().join("one.md"), b"").unwrap();

        let found = find_untranscribed(dir.path(), Some(out.path())).unwrap();
        assert_eq!(found.len(), 1);
        assert!(found[0].ends_with("two.wav"));
    }
}
