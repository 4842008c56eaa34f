//! Readers turning input files into [`DocumentSource`]s.
//!
//! ## Available Sources
//!
//! - [`MemorySource`]: built in code, or deserialized from JSON
//! - [`MarkdownSource`]: CommonMark with tables and footnotes
//! - [`SpreadsheetSource`]: a CSV file as a single table
//! - [`MultiSource`]: several sources, one after the other
//!
//! [`open`] picks a reader by file extension.

mod error;
pub mod markdown;
pub mod memory;
pub mod multi;
pub mod spreadsheet;

pub use error::SourceError;
pub use markdown::MarkdownSource;
pub use memory::MemorySource;
pub use multi::MultiSource;
pub use spreadsheet::{ColumnSelection, SpreadsheetSource};

use std::path::Path;
use tagpress_traits::DocumentSource;

/// Reader knobs that only some formats use.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReaderOptions {
    pub columns: ColumnSelection,
}

/// Opens `path` with the reader its extension calls for.
pub fn open(path: &Path, options: &ReaderOptions) -> Result<Box<dyn DocumentSource>, SourceError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    log::info!("Reading {}", path.display());
    match extension.as_str() {
        "md" | "markdown" => Ok(Box::new(MarkdownSource::open(path)?)),
        "csv" => Ok(Box::new(SpreadsheetSource::open(path, &options.columns)?)),
        "json" => Ok(Box::new(MemorySource::open_json(path)?)),
        _ => Err(SourceError::UnsupportedFormat(path.to_path_buf())),
    }
}

/// Opens every path and chains them; a single path is returned as is.
pub fn open_all(paths: &[&Path], options: &ReaderOptions) -> Result<Box<dyn DocumentSource>, SourceError> {
    match paths {
        [] => Err(SourceError::NoInputs),
        [single] => open(single, options),
        _ => {
            let parts = paths
                .iter()
                .map(|path| open(path, options))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Box::new(MultiSource::new(parts)))
        }
    }
}
