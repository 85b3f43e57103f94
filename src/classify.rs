use crate::config::MAX_TEXT_BYTES;
use std::fs;
use std::path::Path;
use tracing::{debug, trace};

/// Extensions that are always treated as text, regardless of size.
pub const TEXT_EXTENSIONS: &[&str] = &[
    "txt", "md", "py", "js", "ts", "jsx", "tsx", "json", "yml", "yaml", "xml", "html", "css",
    "scss", "sass", "toml", "ini", "cfg", "csv", "tsv", "env", "sh", "bat", "ps1", "c", "h",
    "hpp", "hh", "cpp", "cc", "rs", "go", "java", "kt", "rb", "php", "sql", "swift", "m", "mm",
    "r", "lua", "pl", "tex", "rst",
];

/// Decides whether a file should be read as text.
///
/// A registered extension wins outright. Anything else is text only if it is
/// no larger than `max_text_bytes`. There is no content sniffing, so a large
/// text file with an unknown extension is skipped and a small binary file is
/// read as text.
#[derive(Debug, Clone, Copy)]
pub struct TextClassifier {
    max_text_bytes: u64,
}

impl Default for TextClassifier {
    fn default() -> Self {
        TextClassifier::new(MAX_TEXT_BYTES)
    }
}

impl TextClassifier {
    pub fn new(max_text_bytes: u64) -> Self {
        TextClassifier { max_text_bytes }
    }

    pub fn max_text_bytes(&self) -> u64 {
        self.max_text_bytes
    }

    pub fn classify(&self, path: &Path) -> bool {
        if has_text_extension(path) {
            trace!("Registered text extension: {:?}", path);
            return true;
        }
        match fs::metadata(path) {
            Ok(metadata) => metadata.len() <= self.max_text_bytes,
            Err(e) => {
                // Unknown size is treated as "not text".
                debug!("Could not read size of {:?}: {}", path, e);
                false
            }
        }
    }
}

pub fn has_text_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            TEXT_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}
