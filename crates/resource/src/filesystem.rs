//! Filesystem-based artifact store for native platforms.
//!
//! Artifacts are written to a timestamped directory under the output
//! directory, `img-YYYYMMDD-HHMM/<stem>-<infix>-NNN<suffix>`, and referenced
//! from the tagged text by their path relative to the output directory.
//!
//! # Caching
//!
//! With an [`ArtifactCache`] configured, each stored artifact is also copied
//! into a content-addressed directory keyed by the SHA-256 of its bytes. A
//! later run storing the same bytes copies the cached file instead of
//! producing it again.

use chrono::Local;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tagpress_traits::{Artifact, ArtifactError, ArtifactStore};

/// A content-addressed directory of previously stored artifacts.
#[derive(Debug, Clone)]
pub struct ArtifactCache {
    dir: PathBuf,
}

impl ArtifactCache {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where an artifact with these bytes is cached.
    pub fn entry(&self, data: &[u8], suffix: &str) -> PathBuf {
        let digest = hex::encode(Sha256::digest(data));
        self.dir.join(format!("{}{}", digest, suffix))
    }

    /// Copies a cached entry to `target`. Returns false on a cache miss.
    fn fetch(&self, entry: &Path, target: &Path) -> Result<bool, ArtifactError> {
        if !entry.is_file() {
            return Ok(false);
        }
        log::debug!("Cached {} -> {}", file_name(entry), file_name(target));
        fs::copy(entry, target).map_err(|e| store_failed(target, e))?;
        Ok(true)
    }

    fn store(&self, source: &Path, entry: &Path) -> Result<(), ArtifactError> {
        log::debug!("Caching {} -> {}", file_name(source), file_name(entry));
        fs::create_dir_all(&self.dir).map_err(|e| store_failed(&self.dir, e))?;
        fs::copy(source, entry).map_err(|e| store_failed(entry, e))?;
        Ok(())
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn store_failed(path: &Path, err: std::io::Error) -> ArtifactError {
    ArtifactError::StoreFailed {
        path: path.display().to_string(),
        message: err.to_string(),
    }
}

/// An artifact store that writes artifacts beside the output document.
///
/// Artifacts are numbered in the order they are stored, starting at 1. The
/// numbering is shared by images and formulas.
#[derive(Debug)]
pub struct FilesystemArtifactStore {
    output_dir: PathBuf,
    stem: String,
    artifact_dir: PathBuf,
    cache: Option<ArtifactCache>,
    counter: AtomicUsize,
}

impl FilesystemArtifactStore {
    /// Creates a store for the output document `<output_dir>/<stem>.*`.
    ///
    /// The artifact directory name is fixed when the store is created.
    pub fn new<P: AsRef<Path>>(output_dir: P, stem: impl Into<String>) -> Self {
        let output_dir = output_dir.as_ref().to_path_buf();
        let artifact_dir = output_dir.join(Local::now().format("img-%Y%m%d-%H%M").to_string());
        Self {
            output_dir,
            stem: stem.into(),
            artifact_dir,
            cache: None,
            counter: AtomicUsize::new(0),
        }
    }

    pub fn with_cache(mut self, cache: Option<ArtifactCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn artifact_dir(&self) -> &Path {
        &self.artifact_dir
    }

    pub fn cache(&self) -> Option<&ArtifactCache> {
        self.cache.as_ref()
    }

    fn next_path(&self, artifact: &Artifact, suffix: &str) -> PathBuf {
        let count = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        self.artifact_dir.join(format!(
            "{}-{}-{:03}{}",
            self.stem,
            artifact.kind.infix(),
            count,
            suffix
        ))
    }

    /// The path as written into the tagged text.
    fn relative(&self, path: &Path) -> String {
        path.strip_prefix(&self.output_dir)
            .unwrap_or(path)
            .to_string_lossy()
            .into_owned()
    }
}

impl ArtifactStore for FilesystemArtifactStore {
    fn convert_and_cache(
        &self,
        artifact: &Artifact,
        target_suffix: &str,
    ) -> Result<String, ArtifactError> {
        artifact.ensure_target(target_suffix)?;

        let path = self.next_path(artifact, target_suffix);
        fs::create_dir_all(&self.artifact_dir).map_err(|e| store_failed(&self.artifact_dir, e))?;

        let entry = self
            .cache
            .as_ref()
            .map(|cache| (cache, cache.entry(&artifact.data, target_suffix)));
        let cached = match &entry {
            Some((cache, entry)) => cache.fetch(entry, &path)?,
            None => false,
        };
        if !cached {
            log::debug!("Writing {}", path.display());
            fs::write(&path, artifact.data.as_slice()).map_err(|e| store_failed(&path, e))?;
            if let Some((cache, entry)) = &entry {
                cache.store(&path, entry)?;
            }
        }

        Ok(self.relative(&path))
    }

    fn name(&self) -> &'static str {
        "FilesystemArtifactStore"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tagpress_idf::{Formula, Image};
    use tempfile::tempdir;

    fn png(bytes: &[u8]) -> Artifact {
        Artifact::image(&Image {
            suffix: ".png".to_string(),
            data: Arc::new(bytes.to_vec()),
        })
    }

    #[test]
    fn test_writes_numbered_artifacts() {
        let dir = tempdir().unwrap();
        let store = FilesystemArtifactStore::new(dir.path(), "book");

        let first = store.convert_and_cache(&png(b"one"), ".png").unwrap();
        let formula = Artifact::formula(&Formula {
            mathml: "<math/>".to_string(),
        });
        let second = store.convert_and_cache(&formula, ".mathml").unwrap();

        let dir_name = file_name(store.artifact_dir());
        assert!(dir_name.starts_with("img-"));
        assert_eq!(first, format!("{}/book-image-001.png", dir_name));
        assert_eq!(second, format!("{}/book-formula-002.mathml", dir_name));
        assert_eq!(fs::read(dir.path().join(&first)).unwrap(), b"one");
        assert_eq!(fs::read_to_string(dir.path().join(&second)).unwrap(), "<math/>");
    }

    #[test]
    fn test_unsupported_conversion() {
        let dir = tempdir().unwrap();
        let store = FilesystemArtifactStore::new(dir.path(), "book");

        let result = store.convert_and_cache(&png(b"x"), ".svg");
        assert!(matches!(result, Err(ArtifactError::Unsupported { .. })));
        assert!(!store.artifact_dir().exists());
    }

    #[test]
    fn test_cache_entry_is_content_addressed() {
        let cache = ArtifactCache::new("/cache");
        let a = cache.entry(b"same", ".png");
        assert_eq!(a, cache.entry(b"same", ".png"));
        assert_ne!(a, cache.entry(b"other", ".png"));
        assert_eq!(a.extension().unwrap(), "png");
        assert_eq!(file_name(&a).len(), 64 + ".png".len());
    }

    #[test]
    fn test_cache_is_filled_and_reused() {
        let dir = tempdir().unwrap();
        let cache_dir = dir.path().join("cache");

        let store = FilesystemArtifactStore::new(dir.path().join("out"), "book")
            .with_cache(Some(ArtifactCache::new(&cache_dir)));
        let artifact = png(b"pixels");
        store.convert_and_cache(&artifact, ".png").unwrap();

        let entry = store.cache().unwrap().entry(b"pixels", ".png");
        assert_eq!(fs::read(&entry).unwrap(), b"pixels");

        // A changed cache entry wins over the artifact bytes.
        fs::write(&entry, b"from cache").unwrap();
        let again = store.convert_and_cache(&artifact, ".png").unwrap();
        assert!(again.ends_with("book-image-002.png"));
        assert_eq!(fs::read(dir.path().join("out").join(again)).unwrap(), b"from cache");
    }
}
