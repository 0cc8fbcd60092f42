//! Static registry of downloadable models

use serde::{Deserialize, Serialize};

/// Model kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// Whisper ASR model (ggml)
    Whisper,
    /// Pyannote segmentation model (ONNX)
    Segmentation,
    /// WeSpeaker embedding model (ONNX)
    SpeakerEmbedding,
}

impl ModelKind {
    /// Cache subdirectory for this model kind
    pub fn subdirectory(&self) -> &'static str {
        match self {
            ModelKind::Whisper => "whisper",
            ModelKind::Segmentation | ModelKind::SpeakerEmbedding => "pyannote",
        }
    }
}

/// One downloadable model
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ModelSpec {
    /// Registry identifier
    pub id: &'static str,
    /// Model kind
    pub kind: ModelKind,
    /// Cached file name
    pub filename: &'static str,
    /// Download URL
    pub url: &'static str,
    /// Approximate download size in bytes
    pub size_bytes: u64,
    /// SHA256 of the file (empty if unverified)
    pub sha256: &'static str,
    /// Short description for listings
    pub description: &'static str,
}

impl ModelSpec {
    /// Human-readable size string
    pub fn size_string(&self) -> String {
        const KB: u64 = 1024;
        const MB: u64 = KB * 1024;
        const GB: u64 = MB * 1024;

        if self.size_bytes >= GB {
            format!("{:.1} GB", self.size_bytes as f64 / GB as f64)
        } else if self.size_bytes >= MB {
            format!("{:.0} MB", self.size_bytes as f64 / MB as f64)
        } else {
            format!("{:.0} KB", self.size_bytes as f64 / KB as f64)
        }
    }
}

/// All known models
pub static CATALOG: &[ModelSpec] = &[
    ModelSpec {
        id: "whisper-tiny",
        kind: ModelKind::Whisper,
        filename: "ggml-tiny.bin",
        url: "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-tiny.bin",
        size_bytes: 75_000_000,
        sha256: "",
        description: "Fastest, lowest accuracy (~75MB)",
    },
    ModelSpec {
        id: "whisper-base",
        kind: ModelKind::Whisper,
        filename: "ggml-base.bin",
        url: "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-base.bin",
        size_bytes: 142_000_000,
        sha256: "",
        description: "Fast, good accuracy (~140MB)",
    },
    ModelSpec {
        id: "whisper-small",
        kind: ModelKind::Whisper,
        filename: "ggml-small.bin",
        url: "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-small.bin",
        size_bytes: 466_000_000,
        sha256: "",
        description: "Balanced speed/accuracy, good multilingual (~460MB)",
    },
    ModelSpec {
        id: "whisper-medium",
        kind: ModelKind::Whisper,
        filename: "ggml-medium.bin",
        url: "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-medium.bin",
        size_bytes: 1_500_000_000,
        sha256: "",
        description: "High accuracy (~1.5GB)",
    },
    ModelSpec {
        id: "whisper-large-v3",
        kind: ModelKind::Whisper,
        filename: "ggml-large-v3.bin",
        url: "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-large-v3.bin",
        size_bytes: 3_000_000_000,
        sha256: "",
        description: "Highest accuracy, slowest (~3GB)",
    },
    ModelSpec {
        id: "whisper-turbo",
        kind: ModelKind::Whisper,
        filename: "ggml-large-v3-turbo.bin",
        url: "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-large-v3-turbo.bin",
        size_bytes: 1_600_000_000,
        sha256: "",
        description: "Near large-v3 accuracy at much higher speed (~1.6GB)",
    },
    ModelSpec {
        id: "pyannote-segmentation",
        kind: ModelKind::Segmentation,
        filename: "segmentation-3.0.onnx",
        url: "https://huggingface.co/pyannote/segmentation-3.0/resolve/main/pytorch_model.onnx",
        size_bytes: 17_000_000,
        sha256: "",
        description: "Voice activity detection (~17MB)",
    },
    ModelSpec {
        id: "wespeaker-embedding",
        kind: ModelKind::SpeakerEmbedding,
        filename: "wespeaker-voxceleb-resnet34-LM.onnx",
        url: "https://huggingface.co/pyannote/wespeaker-voxceleb-resnet34-LM/resolve/main/pytorch_model.onnx",
        size_bytes: 90_000_000,
        sha256: "",
        description: "Speaker embedding extraction (~90MB)",
    },
];

/// Look up a model by registry ID
pub fn find(id: &str) -> Option<&'static ModelSpec> {
    CATALOG.iter().find(|m| m.id == id)
}

/// Map a Whisper size name ("tiny", "small", "turbo", ...) to its model
pub fn whisper_for_size(size: &str) -> Option<&'static ModelSpec> {
    let id = format!("whisper-{}", size);
    CATALOG
        .iter()
        .find(|m| m.kind == ModelKind::Whisper && m.id == id)
}

/// All models of one kind
pub fn by_kind(kind: ModelKind) -> impl Iterator<Item = &'static ModelSpec> {
    CATALOG.iter().filter(move |m| m.kind == kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_by_id() {
        assert!(find("whisper-small").is_some());
        assert!(find("whisper-imaginary").is_none());
    }

    #[test]
    fn test_whisper_for_size() {
        let model = whisper_for_size("small").unwrap();
        assert_eq!(model.filename, "ggml-small.bin");
        assert_eq!(whisper_for_size("large-v3").unwrap().id, "whisper-large-v3");
        assert!(whisper_for_size("segmentation").is_none());
    }

    #[test]
    fn test_catalog_has_diarization_models() {
        assert_eq!(by_kind(ModelKind::Segmentation).count(), 1);
        assert_eq!(by_kind(ModelKind::SpeakerEmbedding).count(), 1);
    }

    #[test]
    fn test_size_string() {
        let model = find("whisper-large-v3").unwrap();
        assert_eq!(model.size_string(), "2.8 GB");
    }
}
