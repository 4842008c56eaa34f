//! ArtifactStore trait for abstracting where embedded objects end up.
//!
//! Images and formulas are not part of the tagged text itself; the converter
//! hands them to a store and writes the path it gets back as a placeholder.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};
use tagpress_idf::{Formula, Image, SharedData};
use thiserror::Error;

/// Error type for artifact storage operations.
#[derive(Error, Debug, Clone)]
pub enum ArtifactError {
    #[error("Cannot convert {from} to {to}")]
    Unsupported { from: String, to: String },

    #[error("Failed to store artifact '{path}': {message}")]
    StoreFailed { path: String, message: String },

    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for ArtifactError {
    fn from(err: std::io::Error) -> Self {
        ArtifactError::Io(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    Image,
    Formula,
}

impl ArtifactKind {
    /// The infix used in generated file names.
    pub fn infix(self) -> &'static str {
        match self {
            ArtifactKind::Image => "image",
            ArtifactKind::Formula => "formula",
        }
    }
}

/// An embedded object taken out of the document.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub kind: ArtifactKind,
    /// Suffix of `data` as found in the document, e.g. `.png`.
    pub suffix: String,
    pub data: SharedData,
}

impl Artifact {
    pub fn image(image: &Image) -> Self {
        Self {
            kind: ArtifactKind::Image,
            suffix: image.suffix.clone(),
            data: image.data.clone(),
        }
    }

    pub fn formula(formula: &Formula) -> Self {
        Self {
            kind: ArtifactKind::Formula,
            suffix: ".mathml".to_string(),
            data: SharedData::new(formula.mathml.clone().into_bytes()),
        }
    }

    /// Checks that the artifact can be stored as `target_suffix` without rendering.
    pub fn ensure_target(&self, target_suffix: &str) -> Result<(), ArtifactError> {
        if self.suffix.eq_ignore_ascii_case(target_suffix) {
            Ok(())
        } else {
            Err(ArtifactError::Unsupported {
                from: self.suffix.clone(),
                to: target_suffix.to_string(),
            })
        }
    }
}

/// A place to put artifacts.
///
/// # Implementations
///
/// - `FilesystemArtifactStore` (tagpress-resource): writes next to the output
/// - [`InMemoryArtifactStore`]: keeps everything in memory
pub trait ArtifactStore: Send + Sync + Debug {
    /// Stores `artifact` in the `target_suffix` format and returns the path
    /// under which the output document should reference it.
    fn convert_and_cache(
        &self,
        artifact: &Artifact,
        target_suffix: &str,
    ) -> Result<String, ArtifactError>;

    /// Returns a human-readable name for this store (for logging/debugging).
    fn name(&self) -> &'static str;
}

/// An in-memory artifact store.
///
/// Paths are generated as `<stem>-<infix>-NNN<suffix>`, numbered per store.
#[derive(Debug)]
pub struct InMemoryArtifactStore {
    stem: String,
    counter: AtomicUsize,
    artifacts: RwLock<HashMap<String, SharedData>>,
}

impl Default for InMemoryArtifactStore {
    fn default() -> Self {
        Self::new("document")
    }
}

impl InMemoryArtifactStore {
    pub fn new(stem: impl Into<String>) -> Self {
        Self {
            stem: stem.into(),
            counter: AtomicUsize::new(0),
            artifacts: RwLock::new(HashMap::new()),
        }
    }

    /// Returns a stored artifact's data.
    ///
    /// Returns `None` if the lock is poisoned or nothing is stored under `path`.
    pub fn get(&self, path: &str) -> Option<SharedData> {
        self.artifacts.read().ok()?.get(path).cloned()
    }

    /// Returns 0 if the lock is poisoned.
    pub fn len(&self) -> usize {
        self.artifacts.read().map(|a| a.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ArtifactStore for InMemoryArtifactStore {
    fn convert_and_cache(
        &self,
        artifact: &Artifact,
        target_suffix: &str,
    ) -> Result<String, ArtifactError> {
        artifact.ensure_target(target_suffix)?;
        let count = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        let path = format!(
            "{}-{}-{:03}{}",
            self.stem,
            artifact.kind.infix(),
            count,
            target_suffix
        );
        let mut artifacts = self
            .artifacts
            .write()
            .map_err(|_| ArtifactError::StoreFailed {
                path: path.clone(),
                message: "artifact store lock poisoned".to_string(),
            })?;
        artifacts.insert(path.clone(), artifact.data.clone());
        Ok(path)
    }

    fn name(&self) -> &'static str {
        "InMemoryArtifactStore"
    }
}
