use chrono::Local;
use clipstash::artifact::ArtifactBuilder;
use clipstash::clipboard::{ClipboardCopier, MemoryClipboard};
use clipstash::collect::FileCollector;
use clipstash::config::{ArtifactConfig, StashConfig};
use clipstash::errors::StashError;
use clipstash::opener::{open_stash_root, FolderOpener};
use clipstash::reporting::render_tree;
use clipstash::selection::StaticSelection;
use clipstash::stash::StashWriter;
use clipstash::task::{spawn_copy, spawn_stash, CancelFlag, Progress, Stage, TaskContext};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use tempfile::tempdir;
use tokio::fs;
use tracing::debug;

async fn write(path: &Path, content: &[u8]) {
    fs::create_dir_all(path.parent().unwrap()).await.unwrap();
    fs::write(path, content).await.unwrap();
}

fn copier(base: &Path, sink: MemoryClipboard) -> ClipboardCopier<MemoryClipboard> {
    let config = StashConfig::new(base);
    ClipboardCopier::new(
        FileCollector::new(config.collector_config()),
        ArtifactBuilder::new(ArtifactConfig::default()),
        sink,
    )
}

#[tokio::test]
async fn test_copy_selection_places_payload_in_sink() {
    let dir = tempdir().unwrap();
    let base = dir.path();
    write(&base.join("src/lib.rs"), b"pub fn hello() {}\n").await;
    write(&base.join("README.md"), b"# readme\n").await;

    let sink = MemoryClipboard::new();
    let report = copier(base, sink.clone())
        .copy_selection(&StaticSelection::new(["src", "README.md"]))
        .await
        .unwrap();

    assert_eq!(report.files.len(), 2);
    let payload = sink.contents().expect("clipboard should be set");
    assert_eq!(report.bytes, payload.len());
    assert!(payload.starts_with("# File manifest (2 files) generated "));
    assert!(payload.contains(&format!(
        "# ===== BEGIN {} =====\npub fn hello() {{}}\n\n# ===== END",
        base.join("src/lib.rs").display()
    )));

    debug!("Test passed for clipboard copy.");
}

#[tokio::test]
async fn test_empty_selection_leaves_clipboard_untouched() {
    let dir = tempdir().unwrap();
    let sink = MemoryClipboard::new();
    let report = copier(dir.path(), sink.clone())
        .copy_selection(&StaticSelection::default())
        .await
        .unwrap();

    assert!(report.files.is_empty());
    assert!(report.errors.is_empty());
    assert_eq!(sink.contents(), None);
}

#[tokio::test]
async fn test_cancelled_context_stops_stash() {
    let dir = tempdir().unwrap();
    let base = dir.path();
    write(&base.join("a.txt"), b"a").await;

    let config = StashConfig::new(base);
    let files = FileCollector::new(config.collector_config())
        .resolve(["a.txt"])
        .files;

    let cancel = CancelFlag::new();
    cancel.cancel();
    let ctx = TaskContext::new(cancel, None);
    let result = StashWriter::new(config)
        .create_stash_with(&files, Local::now(), &ctx)
        .await;
    assert!(matches!(result, Err(StashError::Cancelled(_))), "{:?}", result);
}

#[tokio::test]
async fn test_spawned_stash_reports_progress() {
    let dir = tempdir().unwrap();
    let base = dir.path();
    for name in ["one.txt", "two.txt", "three.txt"] {
        write(&base.join(name), name.as_bytes()).await;
    }

    let config = StashConfig::new(base);
    let files = FileCollector::new(config.collector_config())
        .resolve(["."])
        .files;
    assert_eq!(files.len(), 3);

    let mut handle = spawn_stash(StashWriter::new(config), files);
    let mut events = Vec::new();
    while let Some(event) = handle.progress.recv().await {
        events.push(event);
    }
    let outcome = handle.wait().await.unwrap();

    assert_eq!(outcome.copied, 3);
    assert_eq!(events.first(), Some(&Progress::Started { total: 3 }));
    assert_eq!(events.last(), Some(&Progress::Finished));
    for stage in [Stage::Copy, Stage::Read] {
        let indices: Vec<usize> = events
            .iter()
            .filter_map(|e| match e {
                Progress::Processed { stage: s, index, .. } if *s == stage => Some(*index),
                _ => None,
            })
            .collect();
        assert_eq!(indices, vec![0, 1, 2], "{:?} events", stage);
    }
}

#[tokio::test]
async fn test_vanished_file_still_counts_towards_progress() {
    let dir = tempdir().unwrap();
    let base = dir.path();
    write(&base.join("keep.txt"), b"keep").await;
    write(&base.join("lost.txt"), b"lost").await;

    let config = StashConfig::new(base);
    let files = FileCollector::new(config.collector_config())
        .resolve(["."])
        .files;
    fs::remove_file(base.join("lost.txt")).await.unwrap();

    let mut handle = spawn_stash(StashWriter::new(config), files);
    let mut copy_events = Vec::new();
    while let Some(event) = handle.progress.recv().await {
        if let Progress::Processed {
            stage: Stage::Copy,
            index,
            total,
            path,
        } = event
        {
            copy_events.push((index, total, path));
        }
    }
    let outcome = handle.wait().await.unwrap();

    assert_eq!(outcome.copied, 1);
    assert_eq!(
        copy_events,
        vec![
            (0, 2, base.join("keep.txt")),
            (1, 2, base.join("lost.txt")),
        ]
    );
}

#[tokio::test]
async fn test_spawned_copy_matches_direct_copy() {
    let dir = tempdir().unwrap();
    let base = dir.path();
    write(&base.join("x.md"), b"x").await;
    write(&base.join("y.md"), b"y").await;
    let selection = StaticSelection::new(["x.md", "y.md"]);

    let direct = MemoryClipboard::new();
    copier(base, direct.clone())
        .copy_selection(&selection)
        .await
        .unwrap();

    let spawned = MemoryClipboard::new();
    let mut handle = spawn_copy(copier(base, spawned.clone()), &selection);
    let mut events = Vec::new();
    while let Some(event) = handle.progress.recv().await {
        events.push(event);
    }
    let report = handle.wait().await.unwrap();

    assert_eq!(report.files.len(), 2);
    assert_eq!(events.first(), Some(&Progress::Started { total: 2 }));
    assert_eq!(events.last(), Some(&Progress::Finished));
    assert!(events.iter().all(|e| !matches!(
        e,
        Progress::Processed {
            stage: Stage::Copy,
            ..
        }
    )));
    // Only the timestamp in the header may differ.
    let body = |payload: Option<String>| {
        let payload = payload.unwrap();
        payload[payload.find('\n').unwrap()..].to_string()
    };
    assert_eq!(body(spawned.contents()), body(direct.contents()));
}

#[tokio::test]
async fn test_cancelled_copy_leaves_clipboard_untouched() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a.txt"), b"a").await;

    let sink = MemoryClipboard::new();
    let copier = copier(dir.path(), sink.clone());
    let resolution = copier.collector().resolve(["a.txt"]);
    let cancel = CancelFlag::new();
    cancel.cancel();
    let result = copier
        .copy_resolution(resolution, &TaskContext::new(cancel, None))
        .await;

    assert!(matches!(result, Err(StashError::Cancelled(_))), "{:?}", result);
    assert_eq!(sink.contents(), None);
}

struct RecordingOpener {
    opened: RefCell<Vec<PathBuf>>,
}

impl FolderOpener for RecordingOpener {
    fn open(&self, path: &Path) -> Result<(), StashError> {
        self.opened.borrow_mut().push(path.to_path_buf());
        Ok(())
    }
}

#[test]
fn test_open_stash_root_creates_folder_first() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("_stash");
    let opener = RecordingOpener {
        opened: RefCell::new(Vec::new()),
    };

    open_stash_root(&opener, &root).unwrap();
    assert!(root.is_dir());
    assert_eq!(opener.opened.borrow().as_slice(), &[root.clone()]);
}

#[tokio::test]
async fn test_tree_marks_skipped_files() {
    let dir = tempdir().unwrap();
    let base = dir.path();
    write(&base.join("src/main.rs"), b"fn main() {}").await;
    write(&base.join("assets/logo.png"), &vec![0u8; 2048]).await;

    let config = StashConfig::new(base);
    let files = FileCollector::new(config.collector_config())
        .resolve(["."])
        .files;
    let builder = ArtifactBuilder::new(ArtifactConfig {
        max_text_bytes: 1024,
        ..ArtifactConfig::default()
    });

    let tree = render_tree(&files, base, builder.classifier());
    assert!(tree.starts_with("Overall (2 files, 2 KB)"), "{}", tree);
    assert!(tree.contains("logo.png (2 KB) [skip]"), "{}", tree);
    assert!(tree.contains("main.rs (12 B)\n"), "{}", tree);
}
