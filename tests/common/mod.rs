use std::fs;
use std::path::{Path, PathBuf};
use tagpress::{ConversionBuilder, ConversionReport, PipelineError};
use tempfile::TempDir;

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A scratch directory holding input documents and conversion results.
pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        init_logger();
        Self {
            dir: tempfile::tempdir().expect("create temp dir"),
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Writes an input document and returns its path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.path(name);
        fs::write(&path, contents).expect("write input");
        path
    }

    pub fn convert(&self, input: &Path) -> Result<ConversionReport, PipelineError> {
        self.convert_with(ConversionBuilder::new(input))
    }

    pub fn convert_with(&self, builder: ConversionBuilder) -> Result<ConversionReport, PipelineError> {
        builder.with_cache(false).build()?.run()
    }
}

/// Reads a tagged text file back from UTF-16LE.
pub fn read_tagged(path: &Path) -> String {
    let bytes = fs::read(path).expect("read output");
    assert_eq!(bytes.len() % 2, 0, "UTF-16LE output has an even length");
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16(&units).expect("valid UTF-16")
}

/// A style definition found in tagged text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Definition {
    /// `Para`, `Char` or `Table`.
    pub mnemonic: String,
    pub name: String,
    pub based_on: Option<String>,
}

const MNEMONICS: [&str; 3] = ["Para", "Char", "Table"];

/// Every style definition, in order of appearance.
pub fn definitions(text: &str) -> Vec<Definition> {
    let mut found = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find("<Define") {
        rest = &rest[start + "<Define".len()..];
        let Some(mnemonic) = MNEMONICS
            .iter()
            .find(|m| rest.starts_with(&format!("{}Style:", m)))
        else {
            continue;
        };
        let body = &rest[mnemonic.len() + "Style:".len()..];
        let name_end = body.find(['<', '>']).unwrap_or(body.len());
        let definition_end = body.find("<Define").unwrap_or(body.len());
        let definition = &body[..definition_end];
        let based_on = definition.find("<BasedOn:").map(|i| {
            let value = &definition[i + "<BasedOn:".len()..];
            value[..value.find('>').unwrap_or(value.len())].to_string()
        });
        found.push(Definition {
            mnemonic: mnemonic.to_string(),
            name: body[..name_end].to_string(),
            based_on,
        });
    }
    found
}
