use crate::clipboard::{ClipboardCopier, ClipboardSink, CopyReport};
use crate::collect::ResolvedFileList;
use crate::errors::StashError;
use crate::selection::SelectionSource;
use crate::stash::{StashOutcome, StashWriter};
use chrono::Local;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

/// Shared flag polled between per-file operations.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        CancelFlag::default()
    }

    pub fn cancel(&self) {
        debug!("Cancellation requested");
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Which pass over the resolved files a [`Progress::Processed`] event belongs to.
/// A stash runs `Copy` then `Read`; a clipboard copy only runs `Read`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Copy,
    Read,
}

/// Every stage reports exactly one `Processed` event per resolved file, with
/// `index` counting from 0 within that stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    Started {
        total: usize,
    },
    Processed {
        stage: Stage,
        index: usize,
        total: usize,
        path: PathBuf,
    },
    Finished,
}

/// Cancellation and progress plumbing handed to a single pipeline run.
#[derive(Debug, Clone, Default)]
pub struct TaskContext {
    cancel: CancelFlag,
    progress: Option<UnboundedSender<Progress>>,
}

impl TaskContext {
    /// A context nobody listens to and nobody cancels.
    pub fn detached() -> Self {
        TaskContext::default()
    }

    pub fn new(cancel: CancelFlag, progress: Option<UnboundedSender<Progress>>) -> Self {
        TaskContext { cancel, progress }
    }

    pub fn cancel_flag(&self) -> &CancelFlag {
        &self.cancel
    }

    pub fn checkpoint(&self, stage: &str) -> Result<(), StashError> {
        if self.cancel.is_cancelled() {
            return Err(StashError::Cancelled(stage.to_owned()));
        }
        Ok(())
    }

    pub fn report(&self, event: Progress) {
        if let Some(tx) = &self.progress {
            trace!("Progress: {:?}", event);
            // A dropped receiver only means nobody is watching anymore.
            let _ = tx.send(event);
        }
    }
}

/// A pipeline run on a worker task.
pub struct TaskHandle<T> {
    pub cancel: CancelFlag,
    pub progress: UnboundedReceiver<Progress>,
    join: JoinHandle<Result<T, StashError>>,
}

impl<T> TaskHandle<T> {
    pub async fn wait(self) -> Result<T, StashError> {
        self.join
            .await
            .map_err(|e| StashError::TaskError(e.to_string()))?
    }
}

fn channel() -> (TaskContext, CancelFlag, UnboundedReceiver<Progress>) {
    let cancel = CancelFlag::new();
    let (tx, rx) = mpsc::unbounded_channel();
    (TaskContext::new(cancel.clone(), Some(tx)), cancel, rx)
}

pub fn spawn_stash(writer: StashWriter, files: ResolvedFileList) -> TaskHandle<StashOutcome> {
    let (ctx, cancel, progress) = channel();
    let join = tokio::spawn(async move {
        writer
            .create_stash_with(&files, Local::now(), &ctx)
            .await
    });
    TaskHandle {
        cancel,
        progress,
        join,
    }
}

/// Resolves `selection` on the calling task, then builds the payload and
/// writes it to the sink on a worker task.
pub fn spawn_copy<S>(
    copier: ClipboardCopier<S>,
    selection: &dyn SelectionSource,
) -> TaskHandle<CopyReport>
where
    S: ClipboardSink + 'static,
{
    let resolution = copier.collector().resolve_from(selection);
    let (ctx, cancel, progress) = channel();
    let join = tokio::spawn(async move { copier.copy_resolution(resolution, &ctx).await });
    TaskHandle {
        cancel,
        progress,
        join,
    }
}
