// src/pipeline/conversion.rs
use crate::error::PipelineError;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tagpress_core::{ConvertOptions, ConvertStats, Converter};
use tagpress_render_tagged::write_output;
use tagpress_settings::{FlushOutcome, SettingsStore};
use tagpress_traits::{ArtifactStore, DocumentSource};

/// What a finished run produced.
#[derive(Debug)]
pub struct ConversionReport {
    pub output: PathBuf,
    pub settings: FlushOutcome,
    pub stats: ConvertStats,
}

/// A configured conversion, ready to run. Built by
/// [`ConversionBuilder`](super::ConversionBuilder).
#[derive(Debug)]
pub struct Conversion {
    source: Box<dyn DocumentSource>,
    output: PathBuf,
    settings: SettingsStore,
    options: ConvertOptions,
    artifacts: Arc<dyn ArtifactStore>,
    debug: bool,
}

impl Conversion {
    pub(crate) fn new(
        source: Box<dyn DocumentSource>,
        output: PathBuf,
        settings: SettingsStore,
        options: ConvertOptions,
        artifacts: Arc<dyn ArtifactStore>,
        debug: bool,
    ) -> Self {
        Self {
            source,
            output,
            settings,
            options,
            artifacts,
            debug,
        }
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    pub fn output_path(&self) -> &Path {
        &self.output
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    /// Converts the document, writes the tagged text and saves the settings.
    pub fn run(self) -> Result<ConversionReport, PipelineError> {
        log::info!(
            "Converting {} with {}",
            self.source.name(),
            self.artifacts.name()
        );
        if let Some(dir) = self.output.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|source| PipelineError::OutputDir {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        let output = Converter::run(
            self.source.as_ref(),
            self.settings,
            self.options,
            self.artifacts,
        )?;

        write_output(&self.output, &output.text, self.debug)?;

        let mut settings = output.settings;
        let outcome = settings.flush()?;
        match &outcome {
            FlushOutcome::Unchanged => log::info!("Settings unchanged"),
            FlushOutcome::Written { backup: Some(backup) } => {
                log::info!("Settings updated; previous ones kept in {}", backup.display())
            }
            FlushOutcome::Written { backup: None } => log::info!("Settings created"),
        }

        Ok(ConversionReport {
            output: self.output,
            settings: outcome,
            stats: output.stats,
        })
    }
}
