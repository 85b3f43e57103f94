use crate::artifact::ArtifactBuilder;
use crate::collect::{FileCollector, Resolution, ResolvedFileList};
use crate::errors::{ItemError, StashError};
use crate::selection::SelectionSource;
use crate::task::{Progress, TaskContext};
use arboard::Clipboard;
use async_trait::async_trait;
use chrono::Local;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

#[async_trait]
pub trait ClipboardSink: Send + Sync {
    async fn set_text(&self, text: String) -> Result<(), StashError>;
}

/// The system clipboard.
pub struct SystemClipboard;

#[async_trait]
impl ClipboardSink for SystemClipboard {
    async fn set_text(&self, text: String) -> Result<(), StashError> {
        tokio::task::spawn_blocking(move || write_system_clipboard(text))
            .await
            .map_err(|e| StashError::TaskError(e.to_string()))?
    }
}

fn write_system_clipboard(text: String) -> Result<(), StashError> {
    debug!("Initializing clipboard");
    let mut clipboard =
        Clipboard::new().map_err(|e| StashError::ClipboardInitError(e.to_string()))?;
    set_and_keep(&mut clipboard, text)
        .map_err(|e| StashError::ClipboardWriteError(e.to_string()))
}

/// X11 and Wayland drop the selection together with its owner, so block until
/// another client has taken the contents over.
#[cfg(target_os = "linux")]
fn set_and_keep(clipboard: &mut Clipboard, text: String) -> Result<(), arboard::Error> {
    use arboard::SetExtLinux;
    info!("Keeping the clipboard contents until another application takes them over");
    clipboard.set().wait().text(text)
}

#[cfg(not(target_os = "linux"))]
fn set_and_keep(clipboard: &mut Clipboard, text: String) -> Result<(), arboard::Error> {
    clipboard.set_text(text)
}

/// Keeps the last payload in memory.
#[derive(Clone, Default)]
pub struct MemoryClipboard {
    contents: Arc<Mutex<Option<String>>>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        MemoryClipboard::default()
    }

    pub fn contents(&self) -> Option<String> {
        self.contents.lock().ok().and_then(|guard| guard.clone())
    }
}

#[async_trait]
impl ClipboardSink for MemoryClipboard {
    async fn set_text(&self, text: String) -> Result<(), StashError> {
        let mut guard = self
            .contents
            .lock()
            .map_err(|e| StashError::ClipboardWriteError(e.to_string()))?;
        *guard = Some(text);
        Ok(())
    }
}

/// What a clipboard copy did. `files` is empty when nothing was selected, in
/// which case the sink was not touched.
#[derive(Debug, Clone, Default)]
pub struct CopyReport {
    pub files: ResolvedFileList,
    pub bytes: usize,
    pub errors: Vec<ItemError>,
}

pub struct ClipboardCopier<S: ClipboardSink> {
    collector: FileCollector,
    builder: ArtifactBuilder,
    sink: S,
}

impl<S: ClipboardSink> ClipboardCopier<S> {
    pub fn new(collector: FileCollector, builder: ArtifactBuilder, sink: S) -> Self {
        ClipboardCopier {
            collector,
            builder,
            sink,
        }
    }

    pub fn collector(&self) -> &FileCollector {
        &self.collector
    }

    pub async fn copy_selection(
        &self,
        source: &dyn SelectionSource,
    ) -> Result<CopyReport, StashError> {
        debug!("Resolving selection");
        let resolution = self.collector.resolve_from(source);
        self.copy_resolution(resolution, &TaskContext::detached())
            .await
    }

    /// Builds the payload for an already resolved selection and hands it to
    /// the sink. Cancelling through `ctx` leaves the sink untouched.
    pub async fn copy_resolution(
        &self,
        resolution: Resolution,
        ctx: &TaskContext,
    ) -> Result<CopyReport, StashError> {
        let mut errors = resolution.errors;
        let files = resolution.files;
        if files.is_empty() {
            info!("Nothing selected, clipboard left unchanged");
            return Ok(CopyReport {
                files,
                bytes: 0,
                errors,
            });
        }

        ctx.report(Progress::Started { total: files.len() });
        let timestamp = Local::now();
        let entries = self.builder.build_entries_with(&files, None, ctx).await?;
        errors.extend(entries.iter().filter_map(|entry| entry.as_item_error()));
        let payload = self.builder.render_combined(&files, timestamp, &entries);
        let bytes = payload.len();

        ctx.checkpoint("writing clipboard")?;
        self.sink.set_text(payload).await?;
        ctx.report(Progress::Finished);
        info!("Copied {} files ({} bytes) to clipboard", files.len(), bytes);
        Ok(CopyReport {
            files,
            bytes,
            errors,
        })
    }
}
