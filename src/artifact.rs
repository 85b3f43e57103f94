use crate::classify::TextClassifier;
use crate::collect::ResolvedFileList;
use crate::config::ArtifactConfig;
use crate::errors::{ItemError, ItemKind, StashError};
use crate::task::{Progress, Stage, TaskContext};
use crate::utils::{decode_text, read_file_bytes, read_file_prefix, truncate_chars};
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace, warn};

pub const CONTENTS_SEPARATOR: &str = "\n\n# -------- Combined File Contents --------\n";

/// ISO-8601 local time with second precision, as used in manifest headers.
pub fn iso_timestamp(timestamp: &DateTime<Local>) -> String {
    timestamp.format("%Y-%m-%dT%H:%M:%S").to_string()
}

pub fn manifest_header(count: usize, timestamp: &DateTime<Local>) -> String {
    format!(
        "# File manifest ({} files) generated {}",
        count,
        iso_timestamp(timestamp)
    )
}

/// What the combined artifact says about one resolved file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileEntry {
    Content { path: PathBuf, content: String },
    Skipped { path: PathBuf },
    Failed { path: PathBuf, message: String },
}

impl FileEntry {
    pub fn path(&self) -> &Path {
        match self {
            FileEntry::Content { path, .. }
            | FileEntry::Skipped { path }
            | FileEntry::Failed { path, .. } => path,
        }
    }

    pub fn render(&self) -> String {
        match self {
            FileEntry::Content { path, content } => format!(
                "\n# ===== BEGIN {path} =====\n{content}\n# ===== END {path} =====\n",
                path = path.display(),
                content = content
            ),
            FileEntry::Skipped { path } => {
                format!("\n# [SKIP: binary/large] {}\n", path.display())
            }
            FileEntry::Failed { path, message } => {
                format!("\n# [ERROR reading {}] {}\n", path.display(), message)
            }
        }
    }

    pub fn as_item_error(&self) -> Option<ItemError> {
        match self {
            FileEntry::Failed { path, message } => {
                Some(ItemError::new(ItemKind::Read, path, message.clone()))
            }
            _ => None,
        }
    }
}

/// Single-file preview for interactive display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preview {
    Text {
        path: PathBuf,
        content: String,
        truncated: bool,
    },
    NotText {
        path: PathBuf,
    },
    Error {
        path: PathBuf,
        message: String,
    },
}

#[derive(Debug, Clone, Default)]
pub struct ArtifactBuilder {
    classifier: TextClassifier,
    config: ArtifactConfig,
}

impl ArtifactBuilder {
    pub fn new(config: ArtifactConfig) -> Self {
        ArtifactBuilder {
            classifier: TextClassifier::new(config.max_text_bytes),
            config,
        }
    }

    pub fn classifier(&self) -> &TextClassifier {
        &self.classifier
    }

    /// Header line followed by one path per line, without a trailing newline.
    pub fn build_manifest(&self, files: &ResolvedFileList, timestamp: DateTime<Local>) -> String {
        let mut lines = Vec::with_capacity(files.len() + 1);
        lines.push(manifest_header(files.len(), &timestamp));
        lines.extend(files.iter().map(|path| path.display().to_string()));
        lines.join("\n")
    }

    pub async fn build_entries(
        &self,
        files: &ResolvedFileList,
        cap: Option<usize>,
    ) -> Vec<FileEntry> {
        let mut entries = Vec::with_capacity(files.len());
        for path in files {
            entries.push(self.read_entry(path, cap).await);
        }
        entries
    }

    pub async fn build_entries_with(
        &self,
        files: &ResolvedFileList,
        cap: Option<usize>,
        ctx: &TaskContext,
    ) -> Result<Vec<FileEntry>, StashError> {
        let total = files.len();
        let mut entries = Vec::with_capacity(total);
        for (index, path) in files.iter().enumerate() {
            ctx.checkpoint("building combined artifact")?;
            entries.push(self.read_entry(path, cap).await);
            ctx.report(Progress::Processed {
                stage: Stage::Read,
                index,
                total,
                path: path.clone(),
            });
        }
        Ok(entries)
    }

    /// The clipboard payload: manifest, separator, then one block per file.
    /// `cap` is only meant for previews; full artifacts pass `None`.
    pub async fn build_combined(
        &self,
        files: &ResolvedFileList,
        timestamp: DateTime<Local>,
        cap: Option<usize>,
    ) -> String {
        let entries = self.build_entries(files, cap).await;
        self.render_combined(files, timestamp, &entries)
    }

    pub fn render_combined(
        &self,
        files: &ResolvedFileList,
        timestamp: DateTime<Local>,
        entries: &[FileEntry],
    ) -> String {
        let mut pieces = Vec::with_capacity(entries.len() + 2);
        pieces.push(self.build_manifest(files, timestamp));
        pieces.push(CONTENTS_SEPARATOR.to_owned());
        pieces.extend(entries.iter().map(FileEntry::render));
        let combined = pieces.join("\n");
        info!(
            "Built combined artifact for {} files ({} bytes)",
            entries.len(),
            combined.len()
        );
        combined
    }

    pub async fn preview(&self, path: &Path) -> Preview {
        if !self.classifier.classify(path) {
            return Preview::NotText {
                path: path.to_path_buf(),
            };
        }
        // A UTF-8 character is at most 4 bytes.
        let limit = self.config.preview_chars.saturating_mul(4);
        match read_file_prefix(path, limit).await {
            Ok((bytes, more)) => {
                let mut content = decode_text(&bytes, self.config.decode_policy);
                let decoded_len = content.len();
                truncate_chars(&mut content, self.config.preview_chars);
                Preview::Text {
                    path: path.to_path_buf(),
                    truncated: more || content.len() < decoded_len,
                    content,
                }
            }
            Err(e) => Preview::Error {
                path: path.to_path_buf(),
                message: e.to_string(),
            },
        }
    }

    async fn read_entry(&self, path: &Path, cap: Option<usize>) -> FileEntry {
        debug!("Processing file: {:?}", path);
        if !self.classifier.classify(path) {
            debug!("Skipping non-text file: {:?}", path);
            return FileEntry::Skipped {
                path: path.to_path_buf(),
            };
        }

        match read_file_bytes(path).await {
            Ok(bytes) => {
                let mut content = decode_text(&bytes, self.config.decode_policy);
                if let Some(max_chars) = cap {
                    truncate_chars(&mut content, max_chars);
                }
                trace!("Read {} bytes from {:?}", bytes.len(), path);
                FileEntry::Content {
                    path: path.to_path_buf(),
                    content,
                }
            }
            Err(e) => {
                warn!("Failed to read file {:?}: {}", path, e);
                FileEntry::Failed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                }
            }
        }
    }
}
