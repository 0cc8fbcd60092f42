//! Model download and cache manager

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::ModelError;
use crate::registry::{self, ModelSpec};

/// Download progress information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadProgress {
    /// Model being downloaded
    pub model_id: String,
    /// Bytes downloaded so far
    pub bytes_downloaded: u64,
    /// Total bytes to download
    pub total_bytes: u64,
    /// Progress fraction (0.0 - 1.0)
    pub fraction: f64,
}

/// Downloads models on first use and keeps them in the user cache directory
pub struct ModelManager {
    cache_dir: PathBuf,
    client: reqwest::Client,
}

impl ModelManager {
    /// Create a manager rooted at the platform cache directory
    pub fn new() -> Result<Self, ModelError> {
        let dirs = ProjectDirs::from("dev", "meetscribe", "meetscribe").ok_or_else(|| {
            ModelError::CacheDirectoryError("Could not determine cache directory".to_string())
        })?;

        Self::with_cache_dir(dirs.cache_dir().join("models"))
    }

    /// Create a manager with a custom cache directory
    pub fn with_cache_dir(cache_dir: PathBuf) -> Result<Self, ModelError> {
        Ok(Self {
            cache_dir,
            client: reqwest::Client::builder()
                .user_agent("meetscribe/0.1.0")
                .build()
                .map_err(|e| ModelError::DownloadFailed(e.to_string()))?,
        })
    }

    /// Cache directory path
    pub fn cache_directory(&self) -> &Path {
        &self.cache_dir
    }

    /// Path where a model is (or would be) cached
    pub fn model_path(&self, model: &ModelSpec) -> PathBuf {
        self.cache_dir
            .join(model.kind.subdirectory())
            .join(model.filename)
    }

    /// Check whether a model is already cached
    pub fn is_cached(&self, model: &ModelSpec) -> bool {
        self.model_path(model).exists()
    }

    /// Return the cached path for a model, downloading it first if necessary
    pub async fn ensure<F>(
        &self,
        model: &ModelSpec,
        progress_callback: F,
    ) -> Result<PathBuf, ModelError>
    where
        F: Fn(DownloadProgress) + Send + 'static,
    {
        let dest_path = self.model_path(model);
        if dest_path.exists() {
            debug!("Model {} already cached", model.id);
            return Ok(dest_path);
        }

        self.download(model, progress_callback).await
    }

    /// Return the cached path for a registry ID, downloading if necessary
    pub async fn ensure_by_id<F>(
        &self,
        model_id: &str,
        progress_callback: F,
    ) -> Result<PathBuf, ModelError>
    where
        F: Fn(DownloadProgress) + Send + 'static,
    {
        let model = registry::find(model_id)
            .ok_or_else(|| ModelError::UnknownModel(model_id.to_string()))?;
        self.ensure(model, progress_callback).await
    }

    /// Download a model with progress reporting
    pub async fn download<F>(
        &self,
        model: &ModelSpec,
        progress_callback: F,
    ) -> Result<PathBuf, ModelError>
    where
        F: Fn(DownloadProgress) + Send + 'static,
    {
        let dest_path = self.model_path(model);

        info!("Downloading model: {} from {}", model.id, model.url);

        if let Some(parent) = dest_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let response = self
            .client
            .get(model.url)
            .send()
            .await
            .map_err(|e| ModelError::DownloadFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ModelError::DownloadFailed(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        let total_size = response.content_length().unwrap_or(model.size_bytes);

        // Download to a temp file, rename into place once complete.
        let temp_path = dest_path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).await?;

        let mut downloaded: u64 = 0;
        let mut stream = response.bytes_stream();

        while let Some(chunk_result) = stream.next().await {
            let chunk = chunk_result.map_err(|e| ModelError::DownloadFailed(e.to_string()))?;

            file.write_all(&chunk).await?;
            downloaded += chunk.len() as u64;

            progress_callback(DownloadProgress {
                model_id: model.id.to_string(),
                bytes_downloaded: downloaded,
                total_bytes: total_size,
                fraction: downloaded as f64 / total_size as f64,
            });
        }

        file.flush().await?;
        drop(file);

        if !model.sha256.is_empty() {
            debug!("Verifying model checksum...");
            let actual_hash = compute_sha256(&temp_path).await?;
            if actual_hash != model.sha256 {
                fs::remove_file(&temp_path).await?;
                return Err(ModelError::VerificationFailed {
                    expected: model.sha256.to_string(),
                    actual: actual_hash,
                });
            }
        }

        fs::rename(&temp_path, &dest_path).await?;

        info!("Model {} downloaded successfully", model.id);
        Ok(dest_path)
    }

    /// Delete a cached model
    pub async fn delete(&self, model: &ModelSpec) -> Result<(), ModelError> {
        let path = self.model_path(model);
        if path.exists() {
            fs::remove_file(&path).await?;
            info!("Model {} deleted", model.id);
        }
        Ok(())
    }

    /// Cached models from the registry
    pub fn list_cached(&self) -> Vec<&'static ModelSpec> {
        registry::CATALOG
            .iter()
            .filter(|m| self.is_cached(m))
            .collect()
    }

    /// Total size of all cached models in bytes
    pub async fn cache_size(&self) -> u64 {
        let mut total = 0u64;
        for model in registry::CATALOG {
            if let Ok(meta) = fs::metadata(self.model_path(model)).await {
                total += meta.len();
            }
        }
        total
    }

    /// Remove the entire model cache
    pub async fn clear_cache(&self) -> Result<(), ModelError> {
        if self.cache_dir.exists() {
            fs::remove_dir_all(&self.cache_dir).await?;
            info!("Model cache cleared");
        }
        Ok(())
    }
}

/// Compute the SHA256 hash of a file
async fn compute_sha256(path: &Path) -> Result<String, ModelError> {
    let data = fs::read(path).await?;
    let mut hasher = Sha256::new();
    hasher.update(&data);
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::find;

    #[test]
    fn test_model_path_layout() {
        let manager = ModelManager::with_cache_dir(PathBuf::from("/tmp/cache")).unwrap();

        let whisper = find("whisper-small").unwrap();
        assert_eq!(
            manager.model_path(whisper),
            PathBuf::from("/tmp/cache/whisper/ggml-small.bin")
        );

        let segmentation = find("pyannote-segmentation").unwrap();
        assert_eq!(
            manager.model_path(segmentation),
            PathBuf::from("/tmp/cache/pyannote/segmentation-3.0.onnx")
        );
    }

    #[test]
    fn test_is_cached_and_list() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ModelManager::with_cache_dir(dir.path().to_path_buf()).unwrap();

        let model = find("whisper-tiny").unwrap();
        assert!(!manager.is_cached(model));
        assert!(manager.list_cached().is_empty());

        let path = manager.model_path(model);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"stub").unwrap();

        assert!(manager.is_cached(model));
        assert_eq!(manager.list_cached().len(), 1);
    }

    #[tokio::test]
    async fn test_cache_size_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let cache_dir = dir.path().join("models");
        let manager = ModelManager::with_cache_dir(cache_dir.clone()).unwrap();

        let model = find("whisper-tiny").unwrap();
        let path = manager.model_path(model);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, vec![0u8; 128]).unwrap();

        assert_eq!(manager.cache_size().await, 128);

        manager.clear_cache().await.unwrap();
        assert!(!cache_dir.exists());
        assert_eq!(manager.cache_size().await, 0);
    }
}
