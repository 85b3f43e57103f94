use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StashError {
    #[error("Clipboard initialization failed: {0}")]
    ClipboardInitError(String),

    #[error("Clipboard write failed: {0}")]
    ClipboardWriteError(String),

    #[error("IO Error: {0}")]
    IoError(String),

    #[error("Stash aborted while copying {path}: {reason}")]
    CopyAborted { path: PathBuf, reason: String },

    #[error("No free stash directory name for {0}")]
    NameExhausted(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Could not open folder {path}: {reason}")]
    OpenError { path: PathBuf, reason: String },

    #[error("Operation cancelled: {0}")]
    Cancelled(String),

    #[error("Worker task failed: {0}")]
    TaskError(String),
}

impl From<std::io::Error> for StashError {
    fn from(err: std::io::Error) -> Self {
        StashError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for StashError {
    fn from(err: serde_json::Error) -> Self {
        StashError::IoError(err.to_string())
    }
}

/// Which stage of the pipeline a per-item failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Enumeration,
    Read,
    Copy,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ItemKind::Enumeration => "enumeration",
            ItemKind::Read => "read",
            ItemKind::Copy => "copy",
        };
        f.write_str(name)
    }
}

/// A failure attached to a single path. These are reported back to the caller
/// as data and never abort the batch they occurred in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemError {
    pub kind: ItemKind,
    pub path: PathBuf,
    pub message: String,
}

impl ItemError {
    pub fn new(kind: ItemKind, path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        ItemError {
            kind,
            path: path.as_ref().to_path_buf(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ItemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.kind, self.path.display(), self.message)
    }
}
