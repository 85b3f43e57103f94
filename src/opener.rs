use crate::errors::StashError;
use std::path::Path;
use std::process::Command;
use tracing::debug;

/// Opens a folder in the platform's file manager.
pub trait FolderOpener {
    fn open(&self, path: &Path) -> Result<(), StashError>;
}

pub struct SystemFolderOpener;

impl SystemFolderOpener {
    fn command() -> &'static str {
        if cfg!(target_os = "windows") {
            "explorer"
        } else if cfg!(target_os = "macos") {
            "open"
        } else {
            "xdg-open"
        }
    }
}

impl FolderOpener for SystemFolderOpener {
    fn open(&self, path: &Path) -> Result<(), StashError> {
        let program = Self::command();
        debug!("Opening {:?} with {}", path, program);
        Command::new(program)
            .arg(path)
            .spawn()
            .map(|_| ())
            .map_err(|e| StashError::OpenError {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
    }
}

/// Creates `stash_root` if needed, then hands it to `opener`.
pub fn open_stash_root(opener: &dyn FolderOpener, stash_root: &Path) -> Result<(), StashError> {
    std::fs::create_dir_all(stash_root)?;
    opener.open(stash_root)
}
