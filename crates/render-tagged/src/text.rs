//! Text-level helpers: escaping, final transforms and the on-disk encoding.

use crate::error::RenderError;
use std::borrow::Cow;
use std::fs;
use std::path::Path;

const MAQAF: &str = "\u{05BE}";
const VAV_HOLAM: &str = "\u{05D5}\u{05B9}";
const VAV_HOLAM_LIGATURE: &str = "\u{FB4B}";

/// Backslash-escapes the characters that delimit tags.
pub fn escape(text: &str) -> Cow<'_, str> {
    if !text.contains(['<', '>']) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        if c == '<' || c == '>' {
            out.push('\\');
        }
        out.push(c);
    }
    Cow::Owned(out)
}

/// Reverses [`escape`]. A backslash not followed by a tag delimiter is kept.
pub fn unescape(text: &str) -> Cow<'_, str> {
    if !text.contains('\\') {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match chars.peek() {
            Some(&next) if c == '\\' && matches!(next, '<' | '>') => {
                out.push(next);
                chars.next();
            }
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Optional replacements applied to the finished text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextTransforms {
    /// `=` becomes a Hebrew maqaf.
    pub maqaf: bool,
    /// VAV followed by HOLAM becomes the precomposed ligature.
    pub vav: bool,
}

impl TextTransforms {
    pub fn apply<'a>(&self, text: &'a str) -> Cow<'a, str> {
        let mut text = Cow::Borrowed(text);
        if self.maqaf && text.contains('=') {
            text = Cow::Owned(text.replace('=', MAQAF));
        }
        if self.vav && text.contains(VAV_HOLAM) {
            text = Cow::Owned(text.replace(VAV_HOLAM, VAV_HOLAM_LIGATURE));
        }
        text
    }
}

/// UTF-16LE bytes, without a byte order mark.
pub fn encode_utf16le(text: &str) -> Vec<u8> {
    text.encode_utf16().flat_map(u16::to_le_bytes).collect()
}

/// Writes the tagged text to `path` as UTF-16LE, plus a UTF-8 `.utf8` copy
/// when `utf8_copy` is set.
pub fn write_output(path: &Path, text: &str, utf8_copy: bool) -> Result<(), RenderError> {
    log::info!("Writing {}", path.display());
    fs::write(path, encode_utf16le(text)).map_err(|source| RenderError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if utf8_copy {
        let copy = path.with_extension("utf8");
        log::debug!("Writing {}", copy.display());
        fs::write(&copy, text).map_err(|source| RenderError::Io { path: copy, source })?;
    }
    Ok(())
}
