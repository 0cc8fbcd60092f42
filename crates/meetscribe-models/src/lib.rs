//! Model download and cache management
//!
//! Downloads, caches, and verifies the Whisper and pyannote models the
//! providers run on. Models are fetched on first use and kept in the user
//! cache directory; nothing is loaded implicitly.

pub mod error;
pub mod manager;
pub mod registry;

pub use error::ModelError;
pub use manager::{DownloadProgress, ModelManager};
pub use registry::{ModelKind, ModelSpec, CATALOG};
