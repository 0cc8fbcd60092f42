//! Flat-file speaker profile repository

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::SpeakerStoreError;

/// One saved speaker profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeakerProfile {
    /// Voice embedding vector
    pub embedding: Vec<f32>,
    /// Free-form description
    #[serde(default)]
    pub description: String,
    /// Number of samples folded into the embedding
    #[serde(default = "default_sample_count")]
    pub sample_count: u32,
}

fn default_sample_count() -> u32 {
    1
}

/// JSON-backed repository of speaker profiles, keyed by display name
///
/// Mutations happen in memory; `save` persists the whole store atomically
/// (temp file then rename).
pub struct SpeakerStore {
    path: PathBuf,
    profiles: BTreeMap<String, SpeakerProfile>,
}

impl SpeakerStore {
    /// Open the store at `path`
    ///
    /// A missing file yields an empty store. An unreadable or corrupt file is
    /// reported as a warning and also yields an empty store, so one broken
    /// database never blocks transcription.
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();

        let profiles = if path.exists() {
            match fs::read_to_string(&path)
                .map_err(SpeakerStoreError::from)
                .and_then(|data| serde_json::from_str(&data).map_err(SpeakerStoreError::from))
            {
                Ok(profiles) => profiles,
                Err(e) => {
                    warn!("Failed to load speaker database {}: {}", path.display(), e);
                    BTreeMap::new()
                }
            }
        } else {
            BTreeMap::new()
        };

        Self { path, profiles }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist the store to disk
    pub fn save(&self) -> Result<(), SpeakerStoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(&self.profiles)?;
        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, json)?;
        fs::rename(&temp_path, &self.path)?;
        Ok(())
    }

    /// Number of profiles
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    /// Whether the store has no profiles
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Look up a profile by name
    pub fn get(&self, name: &str) -> Option<&SpeakerProfile> {
        self.profiles.get(name)
    }

    /// Iterate over (name, profile) pairs in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SpeakerProfile)> {
        self.profiles.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Insert or replace a profile
    pub fn insert(&mut self, name: impl Into<String>, profile: SpeakerProfile) {
        self.profiles.insert(name.into(), profile);
    }

    /// Rename a speaker, refusing to overwrite an existing name
    pub fn rename(&mut self, old_name: &str, new_name: &str) -> Result<(), SpeakerStoreError> {
        if self.profiles.contains_key(new_name) {
            return Err(SpeakerStoreError::AlreadyExists(new_name.to_string()));
        }
        let mut profile = self
            .profiles
            .remove(old_name)
            .ok_or_else(|| SpeakerStoreError::NotFound(old_name.to_string()))?;
        profile.description = format!("Renamed from {}", old_name);
        self.profiles.insert(new_name.to_string(), profile);
        info!("Renamed speaker '{}' to '{}'", old_name, new_name);
        Ok(())
    }

    /// Delete a speaker
    pub fn delete(&mut self, name: &str) -> Result<(), SpeakerStoreError> {
        self.profiles
            .remove(name)
            .ok_or_else(|| SpeakerStoreError::NotFound(name.to_string()))?;
        info!("Deleted speaker '{}'", name);
        Ok(())
    }

    /// Fold a new voice sample into an existing profile
    ///
    /// The stored embedding becomes the running mean over all samples.
    pub fn record_sample(&mut self, name: &str, embedding: &[f32]) -> Result<(), SpeakerStoreError> {
        let profile = self
            .profiles
            .get_mut(name)
            .ok_or_else(|| SpeakerStoreError::NotFound(name.to_string()))?;

        let n = profile.sample_count as f32;
        for (mean, value) in profile.embedding.iter_mut().zip(embedding) {
            *mean = (*mean * n + value) / (n + 1.0);
        }
        profile.sample_count += 1;
        Ok(())
    }

    /// Next free auto-generated name for an unrecognized speaker
    pub fn next_unknown_name(&self) -> String {
        let mut index = 1;
        loop {
            let candidate = format!("UNKNOWN_{}", index);
            if !self.profiles.contains_key(&candidate) {
                return candidate;
            }
            index += 1;
        }
    }
}
