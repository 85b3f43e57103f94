use std::path::{Path, PathBuf};

/// Files without a registered extension count as text up to this size.
pub const MAX_TEXT_BYTES: u64 = 5 * 1024 * 1024;
/// Name of the stash directory created under the base directory.
pub const STASH_DIR_NAME: &str = "_stash";
pub const PREVIEW_CHARS: usize = 50_000;
pub const MANIFEST_FILE: &str = "manifest.txt";
pub const COMBINED_FILE: &str = "combined.txt";

/// How bytes that are not valid UTF-8 are handled when reading a file as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodePolicy {
    /// Drop invalid sequences.
    #[default]
    Ignore,
    /// Substitute U+FFFD for each invalid sequence.
    Replace,
}

/// What a stash does when a single file cannot be copied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CopyFailurePolicy {
    /// Record the failure and keep copying the rest.
    #[default]
    Continue,
    /// Stop at the first failure, leaving a partial stash on disk.
    Abort,
}

#[derive(Debug, Clone)]
pub struct ArtifactConfig {
    pub max_text_bytes: u64,
    pub decode_policy: DecodePolicy,
    pub preview_chars: usize,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        ArtifactConfig {
            max_text_bytes: MAX_TEXT_BYTES,
            decode_policy: DecodePolicy::default(),
            preview_chars: PREVIEW_CHARS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CollectorConfig {
    pub base_dir: PathBuf,
    /// Directories whose contents are never collected.
    pub excluded_dirs: Vec<PathBuf>,
}

impl CollectorConfig {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        CollectorConfig {
            base_dir: base_dir.into(),
            excluded_dirs: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StashConfig {
    pub base_dir: PathBuf,
    pub stash_root: PathBuf,
    pub failure_policy: CopyFailurePolicy,
    pub artifact: ArtifactConfig,
}

impl StashConfig {
    /// Stash root defaults to `<base_dir>/_stash`.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        let base_dir = base_dir.into();
        let stash_root = default_stash_root(&base_dir);
        StashConfig {
            base_dir,
            stash_root,
            failure_policy: CopyFailurePolicy::default(),
            artifact: ArtifactConfig::default(),
        }
    }

    /// Collector settings matching this stash: same base, stash root excluded.
    pub fn collector_config(&self) -> CollectorConfig {
        CollectorConfig {
            base_dir: self.base_dir.clone(),
            excluded_dirs: vec![self.stash_root.clone()],
        }
    }
}

pub fn default_stash_root(base_dir: &Path) -> PathBuf {
    base_dir.join(STASH_DIR_NAME)
}
