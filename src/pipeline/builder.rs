// src/pipeline/builder.rs
use super::conversion::Conversion;
use crate::error::PipelineError;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tagpress_core::ConvertOptions;
use tagpress_resource::{ArtifactCache, FilesystemArtifactStore};
use tagpress_settings::SettingsStore;
use tagpress_source::ReaderOptions;

/// Name of the artifact cache directory created next to the output.
pub const DEFAULT_CACHE_DIR: &str = "cache";

/// A builder for creating a [`Conversion`].
#[derive(Debug, Clone)]
pub struct ConversionBuilder {
    inputs: Vec<PathBuf>,
    output: Option<PathBuf>,
    options: ConvertOptions,
    reader: ReaderOptions,
    fresh_start: bool,
    debug: bool,
    cache_dir: Option<PathBuf>,
    use_cache: bool,
}

impl ConversionBuilder {
    /// Starts a conversion of `input`. Further inputs can be appended with
    /// [`with_input`](Self::with_input).
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            inputs: vec![input.into()],
            output: None,
            options: ConvertOptions::default(),
            reader: ReaderOptions::default(),
            fresh_start: false,
            debug: false,
            cache_dir: None,
            use_cache: true,
        }
    }

    /// Appends another document; its content follows the previous ones.
    pub fn with_input(mut self, input: impl Into<PathBuf>) -> Self {
        self.inputs.push(input.into());
        self
    }

    /// Sets the output path. Defaults to the first input with a `.txt` extension.
    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = Some(output.into());
        self
    }

    pub fn with_options(mut self, options: ConvertOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_reader_options(mut self, reader: ReaderOptions) -> Self {
        self.reader = reader;
        self
    }

    /// Ignores existing settings; they are overwritten (after a backup) at the end.
    pub fn with_fresh_start(mut self, fresh_start: bool) -> Self {
        self.fresh_start = fresh_start;
        self
    }

    /// Enables debug features, such as the UTF-8 copy of the output.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Overrides the artifact cache location.
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    /// Turns the artifact cache on or off.
    pub fn with_cache(mut self, use_cache: bool) -> Self {
        self.use_cache = use_cache;
        self
    }

    /// Where the output goes, given the current configuration.
    pub fn output_path(&self) -> Result<PathBuf, PipelineError> {
        match (&self.output, self.inputs.first()) {
            (Some(output), _) => Ok(output.clone()),
            (None, Some(input)) => Ok(input.with_extension("txt")),
            (None, None) => Err(PipelineError::Config("No input documents given".to_string())),
        }
    }

    /// Reads the inputs and the settings, and prepares the artifact store.
    pub fn build(self) -> Result<Conversion, PipelineError> {
        let output = self.output_path()?;
        let stem = output
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| PipelineError::Config(format!("No file name in {}", output.display())))?
            .to_string();
        let output_dir = output
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        let paths: Vec<&Path> = self.inputs.iter().map(PathBuf::as_path).collect();
        let source = tagpress_source::open_all(&paths, &self.reader)?;

        let settings_path = output.with_extension("ini");
        let settings = if self.fresh_start {
            log::info!("Fresh start: ignoring {}", settings_path.display());
            SettingsStore::fresh(settings_path)
        } else {
            SettingsStore::load(settings_path)?
        };

        let cache = self.use_cache.then(|| {
            let dir = self
                .cache_dir
                .clone()
                .unwrap_or_else(|| output_dir.join(DEFAULT_CACHE_DIR));
            ArtifactCache::new(dir)
        });
        let artifacts = FilesystemArtifactStore::new(&output_dir, stem).with_cache(cache);

        Ok(Conversion::new(
            source,
            output,
            settings,
            self.options,
            Arc::new(artifacts),
            self.debug,
        ))
    }
}
