pub mod artifact;
pub mod classify;
pub mod clipboard;
pub mod collect;
pub mod config;
pub mod errors;
pub mod logger;
pub mod opener;
pub mod reporting;
pub mod selection;
pub mod stash;
pub mod task;
pub mod trie;
pub mod utils;

pub use artifact::{ArtifactBuilder, FileEntry, Preview};
pub use classify::TextClassifier;
pub use clipboard::{ClipboardCopier, ClipboardSink, MemoryClipboard, SystemClipboard};
pub use collect::{FileCollector, Resolution, ResolvedFileList};
pub use errors::{ItemError, ItemKind, StashError};
pub use selection::{SelectionSource, StaticSelection};
pub use stash::{StashOutcome, StashWriter};
