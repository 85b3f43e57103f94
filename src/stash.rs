use crate::artifact::ArtifactBuilder;
use crate::collect::ResolvedFileList;
use crate::config::{CopyFailurePolicy, StashConfig, COMBINED_FILE, MANIFEST_FILE};
use crate::errors::{ItemError, ItemKind, StashError};
use crate::task::{Progress, Stage, TaskContext};
use crate::utils::absolute_dir;
use chrono::{DateTime, Local};
use filetime::FileTime;
use serde::Serialize;
use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tokio::fs as async_fs;
use tracing::{debug, info, warn};

/// Files outside the base directory are copied under this subdirectory.
pub const EXTERNAL_DIR: &str = "_external";
const MAX_NAME_ATTEMPTS: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StashOutcome {
    pub stash_dir: PathBuf,
    pub copied: usize,
    pub errors: Vec<ItemError>,
}

pub fn stash_dir_name(timestamp: &DateTime<Local>) -> String {
    timestamp.format("%Y-%m-%d_%H-%M-%S").to_string()
}

/// Where `file` lands inside a stash. Paths under `base_dir` keep their
/// relative layout; anything else goes under [`EXTERNAL_DIR`] with its
/// absolute components, so nothing can escape the stash directory.
pub fn stash_relative_path(base_dir: &Path, file: &Path) -> PathBuf {
    if let Ok(relative) = file.strip_prefix(base_dir) {
        if relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
        {
            return relative.to_path_buf();
        }
    }

    let mut external = PathBuf::from(EXTERNAL_DIR);
    for component in file.components() {
        match component {
            Component::Normal(part) => external.push(part),
            Component::Prefix(prefix) => {
                let drive: String = prefix
                    .as_os_str()
                    .to_string_lossy()
                    .chars()
                    .filter(|c| c.is_ascii_alphanumeric())
                    .collect();
                if !drive.is_empty() {
                    external.push(drive);
                }
            }
            Component::RootDir | Component::CurDir | Component::ParentDir => {}
        }
    }
    external
}

/// Writes snapshot directories of resolved files.
#[derive(Debug, Clone)]
pub struct StashWriter {
    config: StashConfig,
    builder: ArtifactBuilder,
}

impl StashWriter {
    pub fn new(mut config: StashConfig) -> Self {
        config.base_dir = absolute_dir(&config.base_dir);
        config.stash_root = absolute_dir(&config.stash_root);
        let builder = ArtifactBuilder::new(config.artifact.clone());
        StashWriter { config, builder }
    }

    pub fn stash_root(&self) -> &Path {
        &self.config.stash_root
    }

    pub async fn create_stash(
        &self,
        files: &ResolvedFileList,
    ) -> Result<StashOutcome, StashError> {
        self.create_stash_at(files, Local::now()).await
    }

    pub async fn create_stash_at(
        &self,
        files: &ResolvedFileList,
        timestamp: DateTime<Local>,
    ) -> Result<StashOutcome, StashError> {
        self.create_stash_with(files, timestamp, &TaskContext::detached())
            .await
    }

    pub async fn create_stash_with(
        &self,
        files: &ResolvedFileList,
        timestamp: DateTime<Local>,
        ctx: &TaskContext,
    ) -> Result<StashOutcome, StashError> {
        let total = files.len();
        ctx.report(Progress::Started { total });

        let stash_dir = self.create_stash_dir(&timestamp).await?;
        info!("Creating stash in {:?}", stash_dir);

        let mut copied = 0;
        let mut errors = Vec::new();
        let mut destinations: HashSet<PathBuf> = HashSet::new();
        for (index, source) in files.iter().enumerate() {
            ctx.checkpoint("creating stash")?;

            let result = match async_fs::metadata(source).await {
                Ok(metadata) if metadata.is_file() => {
                    self.copy_one(source, &stash_dir, &mut destinations)
                        .await
                        .map(Some)
                }
                _ => {
                    debug!("No longer a regular file, skipping: {:?}", source);
                    Ok(None)
                }
            };

            match result {
                Ok(Some(destination)) => {
                    debug!("Copied {:?} -> {:?}", source, destination);
                    copied += 1;
                }
                Ok(None) => {}
                Err(reason) => match self.config.failure_policy {
                    CopyFailurePolicy::Abort => {
                        return Err(StashError::CopyAborted {
                            path: source.clone(),
                            reason,
                        });
                    }
                    CopyFailurePolicy::Continue => {
                        warn!("Failed to copy {:?}: {}", source, reason);
                        errors.push(ItemError::new(ItemKind::Copy, source, reason));
                    }
                },
            }

            ctx.report(Progress::Processed {
                stage: Stage::Copy,
                index,
                total,
                path: source.clone(),
            });
        }

        let mut manifest = self.builder.build_manifest(files, timestamp);
        manifest.push('\n');
        async_fs::write(stash_dir.join(MANIFEST_FILE), manifest).await?;

        let entries = self.builder.build_entries_with(files, None, ctx).await?;
        let combined = self.builder.render_combined(files, timestamp, &entries);
        async_fs::write(stash_dir.join(COMBINED_FILE), combined).await?;

        ctx.report(Progress::Finished);
        info!(
            "Stash created: {:?} ({} files copied, {} errors)",
            stash_dir,
            copied,
            errors.len()
        );
        Ok(StashOutcome {
            stash_dir,
            copied,
            errors,
        })
    }

    /// Copies `source` to its place in the stash. A destination another
    /// file already took is refused, so no copy is ever overwritten.
    async fn copy_one(
        &self,
        source: &Path,
        stash_dir: &Path,
        destinations: &mut HashSet<PathBuf>,
    ) -> Result<PathBuf, String> {
        let relative = stash_relative_path(&self.config.base_dir, source);
        if is_reserved(&relative) {
            return Err(format!(
                "{} is reserved for the generated artifact",
                relative.display()
            ));
        }
        let destination = stash_dir.join(&relative);
        if !destinations.insert(destination.clone()) {
            return Err(format!(
                "{} is already taken by another file in this stash",
                relative.display()
            ));
        }
        copy_preserving(source, &destination)
            .await
            .map_err(|e| e.to_string())?;
        Ok(destination)
    }

    /// Creates a fresh directory named after `timestamp`. When that name is
    /// taken (two stashes in the same second) `_1`, `_2`, ... are appended.
    async fn create_stash_dir(&self, timestamp: &DateTime<Local>) -> Result<PathBuf, StashError> {
        async_fs::create_dir_all(&self.config.stash_root).await?;

        let name = stash_dir_name(timestamp);
        for attempt in 0..MAX_NAME_ATTEMPTS {
            let candidate = if attempt == 0 {
                self.config.stash_root.join(&name)
            } else {
                self.config.stash_root.join(format!("{}_{}", name, attempt))
            };
            match async_fs::create_dir(&candidate).await {
                Ok(()) => return Ok(candidate),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    debug!("Stash directory exists, trying next: {:?}", candidate);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(StashError::NameExhausted(name))
    }
}

/// `manifest.txt` and `combined.txt` at the stash root belong to the stash.
fn is_reserved(relative: &Path) -> bool {
    relative == Path::new(MANIFEST_FILE) || relative == Path::new(COMBINED_FILE)
}

/// Byte copy that keeps permissions and access/modification times.
async fn copy_preserving(source: &Path, destination: &Path) -> std::io::Result<()> {
    if let Some(parent) = destination.parent() {
        async_fs::create_dir_all(parent).await?;
    }
    async_fs::copy(source, destination).await?;

    let metadata = async_fs::metadata(source).await?;
    let atime = FileTime::from_last_access_time(&metadata);
    let mtime = FileTime::from_last_modification_time(&metadata);
    filetime::set_file_times(destination, atime, mtime)
}
