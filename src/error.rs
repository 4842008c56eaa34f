// src/error.rs
use std::path::PathBuf;
use tagpress_core::ConvertError;
use tagpress_render_tagged::RenderError;
use tagpress_settings::SettingsError;
use tagpress_source::SourceError;
use thiserror::Error;

/// Everything that can stop a conversion run.
///
/// Anomalies inside a document are logged by the components and never show
/// up here.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Reading input failed: {0}")]
    Source(#[from] SourceError),

    #[error("Settings failed: {0}")]
    Settings(#[from] SettingsError),

    #[error("Conversion failed: {0}")]
    Convert(#[from] ConvertError),

    #[error("Writing output failed: {0}")]
    Render(#[from] RenderError),

    #[error("Cannot create output directory {}: {source}", path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),
}
