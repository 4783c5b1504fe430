//! Text file attachments.
//!
//! A file is read once, checked against the extension whitelist and the size
//! limit, decoded, and appended to the next prompt as a fenced block.

use crate::{Error, ErrorContext, Result};
use std::path::{Path, PathBuf};

/// Extensions accepted for attachment (compared case-insensitively).
pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    "txt", "py", "js", "java", "cpp", "h", "c", "css", "html", "json", "yaml", "yml", "md", "rs",
    "go", "ts", "jsx", "tsx", "sql", "sh", "bash", "r", "php", "rb", "swift", "kt", "scala",
];

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub path: PathBuf,
    pub content: String,
}

impl Attachment {
    /// Load `path`, rejecting unsupported extensions and files over `max_bytes`.
    pub fn from_path(path: impl AsRef<Path>, max_bytes: u64) -> Result<Self> {
        let path = path.as_ref();
        let shown = path.display().to_string();

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        if !SUPPORTED_EXTENSIONS.contains(&ext.as_str()) {
            return Err(Error::validation_with_context(
                "unsupported file type",
                ErrorContext::new()
                    .with_field_path(shown.clone())
                    .with_details(format!("extension {ext:?} is not a supported text format")),
            ));
        }

        let size = std::fs::metadata(path)?.len();
        if size > max_bytes {
            return Err(Error::validation_with_context(
                "file too large",
                ErrorContext::new()
                    .with_field_path(shown.clone())
                    .with_details(format!("{size} bytes exceeds the {max_bytes} byte limit")),
            ));
        }

        let bytes = std::fs::read(path)?;
        tracing::debug!(path = %shown, size, "attached file");
        Ok(Self {
            path: path.to_path_buf(),
            content: decode_text(&bytes),
        })
    }

    /// Render `prompt` followed by this file's contents in a fenced block.
    pub fn attach_to(&self, prompt: &str) -> String {
        format!("{prompt}\n\nFile contents:\n```\n{}\n```", self.content)
    }
}

/// UTF-8 with the BOM stripped, otherwise Latin-1 (every byte maps to one char).
fn decode_text(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}
