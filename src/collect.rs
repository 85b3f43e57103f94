use crate::config::CollectorConfig;
use crate::errors::{ItemError, ItemKind};
use crate::selection::SelectionSource;
use crate::utils::{absolute_dir, absolutize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::slice;
use tracing::{debug, info, trace, warn};
use walkdir::{DirEntry, WalkDir};

/// Absolute file paths, deduplicated and sorted by their path string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedFileList {
    files: Vec<PathBuf>,
}

impl ResolvedFileList {
    pub fn from_paths<I>(paths: I) -> Self
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let unique: HashSet<PathBuf> = paths.into_iter().collect();
        let mut files: Vec<PathBuf> = unique.into_iter().collect();
        files.sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));
        ResolvedFileList { files }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn iter(&self) -> slice::Iter<'_, PathBuf> {
        self.files.iter()
    }

    pub fn as_slice(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn into_vec(self) -> Vec<PathBuf> {
        self.files
    }
}

impl<'a> IntoIterator for &'a ResolvedFileList {
    type Item = &'a PathBuf;
    type IntoIter = slice::Iter<'a, PathBuf>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.iter()
    }
}

/// Result of resolving a selection: the files plus any directories that could
/// not be listed along the way.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub files: ResolvedFileList,
    pub errors: Vec<ItemError>,
}

/// Expands a selection of files and directories into a [`ResolvedFileList`].
///
/// Directories are walked recursively without following symlinked
/// subdirectories, so link cycles cannot trap the walk. Symlinks to regular
/// files are collected under their link path. A selected root that is itself a
/// symlink is followed, since the user picked it explicitly.
#[derive(Debug, Clone)]
pub struct FileCollector {
    config: CollectorConfig,
}

impl FileCollector {
    pub fn new(mut config: CollectorConfig) -> Self {
        config.base_dir = absolute_dir(&config.base_dir);
        let base_dir = config.base_dir.clone();
        for dir in &mut config.excluded_dirs {
            *dir = absolutize(&base_dir, dir);
        }
        FileCollector { config }
    }

    pub fn base_dir(&self) -> &Path {
        &self.config.base_dir
    }

    pub fn resolve_from(&self, source: &dyn SelectionSource) -> Resolution {
        self.resolve(source.selected_roots())
    }

    pub fn resolve<I>(&self, selection: I) -> Resolution
    where
        I: IntoIterator,
        I::Item: AsRef<Path>,
    {
        let mut found: HashSet<PathBuf> = HashSet::new();
        let mut errors = Vec::new();

        for root in selection {
            let root = absolutize(&self.config.base_dir, root.as_ref());
            debug!("Resolving selection root: {:?}", root);

            let metadata = match fs::metadata(&root) {
                Ok(metadata) => metadata,
                Err(e) => {
                    debug!("Skipping unavailable root {:?}: {}", root, e);
                    continue;
                }
            };

            if metadata.is_dir() {
                self.walk_dir(&root, &mut found, &mut errors);
            } else if metadata.is_file() {
                found.insert(root);
            } else {
                debug!("Skipping special file: {:?}", root);
            }
        }

        let files = ResolvedFileList::from_paths(found);
        info!(
            "Resolved {} files ({} enumeration errors)",
            files.len(),
            errors.len()
        );
        Resolution { files, errors }
    }

    fn walk_dir(&self, root: &Path, found: &mut HashSet<PathBuf>, errors: &mut Vec<ItemError>) {
        let walker = WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !self.is_excluded(entry.path()));

        for entry in walker {
            match entry {
                Ok(entry) => {
                    if let Some(path) = collectable(&entry) {
                        trace!("Found file: {:?}", path);
                        found.insert(path);
                    }
                }
                Err(e) => {
                    let path = e.path().unwrap_or(root).to_path_buf();
                    warn!("Failed to enumerate {:?}: {}", path, e);
                    errors.push(ItemError::new(ItemKind::Enumeration, path, e.to_string()));
                }
            }
        }
    }

    fn is_excluded(&self, path: &Path) -> bool {
        let excluded = self.config.excluded_dirs.iter().any(|dir| dir == path);
        if excluded {
            debug!("Excluding directory: {:?}", path);
        }
        excluded
    }
}

fn collectable(entry: &DirEntry) -> Option<PathBuf> {
    let file_type = entry.file_type();
    if file_type.is_file() {
        return Some(entry.path().to_path_buf());
    }
    if file_type.is_symlink() {
        // Links to files are kept, links to directories are not descended.
        return match fs::metadata(entry.path()) {
            Ok(target) if target.is_file() => Some(entry.path().to_path_buf()),
            Ok(_) => {
                trace!("Not following symlinked directory: {:?}", entry.path());
                None
            }
            Err(e) => {
                debug!("Skipping dangling symlink {:?}: {}", entry.path(), e);
                None
            }
        };
    }
    None
}
