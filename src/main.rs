use clap::{Parser, Subcommand};
use clipstash::artifact::Preview;
use clipstash::clipboard::{
    ClipboardCopier, ClipboardSink, CopyReport, MemoryClipboard, SystemClipboard,
};
use clipstash::config::{
    default_stash_root, ArtifactConfig, CopyFailurePolicy, DecodePolicy,
    StashConfig, MAX_TEXT_BYTES,
};
use clipstash::errors::{ItemError, StashError};
use clipstash::logger::initialize_logger;
use clipstash::opener::{open_stash_root, SystemFolderOpener};
use clipstash::reporting::render_tree;
use clipstash::task::{spawn_copy, spawn_stash, CancelFlag, Progress, TaskHandle};
use clipstash::utils::absolutize;
use clipstash::{ArtifactBuilder, FileCollector, StashWriter, StaticSelection};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::signal;
use tracing::{debug, error, info, warn};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct CliArgs {
    #[arg(
        long,
        env = "CLIPSTASH_BASE_DIR",
        global = true,
        help = "Directory selections are relative to (defaults to the current directory)"
    )]
    base_dir: Option<PathBuf>,
    #[arg(
        long,
        env = "CLIPSTASH_STASH_ROOT",
        global = true,
        help = "Where stashes are written (defaults to <base-dir>/_stash)"
    )]
    stash_root: Option<PathBuf>,
    #[arg(
        long,
        env = "CLIPSTASH_MAX_TEXT_BYTES",
        global = true,
        default_value_t = MAX_TEXT_BYTES
    )]
    max_text_bytes: u64,
    #[arg(
        long,
        global = true,
        help = "Replace undecodable bytes with U+FFFD instead of dropping them"
    )]
    replace_invalid: bool,
    #[command(subcommand)]
    cmd: SubCommands,
}

#[derive(Subcommand, Debug, Clone)]
enum SubCommands {
    /// Copy the manifest and file contents to the clipboard
    Copy(CopyArgs),
    /// Snapshot the selection into a timestamped stash directory
    Stash(StashArgs),
    /// Show what a selection resolves to
    List(ListArgs),
    /// Print the beginning of a single file
    Preview(PreviewArgs),
    /// Open the stash folder in the file manager
    Open,
}

#[derive(Parser, Debug, Clone)]
struct CopyArgs {
    paths: Vec<PathBuf>,
    #[arg(long, help = "Print the payload instead of touching the clipboard")]
    stdout: bool,
}

#[derive(Parser, Debug, Clone)]
struct StashArgs {
    paths: Vec<PathBuf>,
    #[arg(long, help = "Stop at the first file that fails to copy")]
    abort_on_error: bool,
    #[arg(long, help = "Print the outcome as JSON")]
    json: bool,
}

#[derive(Parser, Debug, Clone)]
struct ListArgs {
    paths: Vec<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
struct PreviewArgs {
    file: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli_args = CliArgs::parse();
    initialize_logger();

    match run(cli_args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli_args: CliArgs) -> Result<(), StashError> {
    // The base directory is captured once and passed down explicitly.
    let cwd = std::env::current_dir()?;
    let base_dir = match &cli_args.base_dir {
        Some(dir) => absolutize(&cwd, dir),
        None => cwd,
    };
    if !base_dir.is_dir() {
        return Err(StashError::ConfigError(format!(
            "base directory {:?} is not a directory",
            base_dir
        )));
    }

    let stash_root = match &cli_args.stash_root {
        Some(root) => absolutize(&base_dir, root),
        None => default_stash_root(&base_dir),
    };
    let artifact = ArtifactConfig {
        max_text_bytes: cli_args.max_text_bytes,
        decode_policy: if cli_args.replace_invalid {
            DecodePolicy::Replace
        } else {
            DecodePolicy::Ignore
        },
        ..ArtifactConfig::default()
    };
    let mut stash_config = StashConfig::new(base_dir.clone());
    stash_config.stash_root = stash_root;
    stash_config.artifact = artifact.clone();
    debug!("Base directory: {:?}, stash root: {:?}", base_dir, stash_config.stash_root);

    match cli_args.cmd {
        SubCommands::Copy(args) => {
            let collector = FileCollector::new(stash_config.collector_config());
            let builder = ArtifactBuilder::new(artifact);
            let selection = StaticSelection::new(args.paths);
            if args.stdout {
                let sink = MemoryClipboard::new();
                let report = copy_with(collector, builder, sink.clone(), &selection).await?;
                if let Some(payload) = sink.contents() {
                    println!("{}", payload);
                }
                report_copy(&report, "stdout");
            } else {
                let report = copy_with(collector, builder, SystemClipboard, &selection).await?;
                report_copy(&report, "clipboard");
            }
        }
        SubCommands::Stash(args) => {
            if args.abort_on_error {
                stash_config.failure_policy = CopyFailurePolicy::Abort;
            }
            let collector = FileCollector::new(stash_config.collector_config());
            let resolution = collector.resolve(&args.paths);
            report_errors(&resolution.errors);
            if resolution.files.is_empty() {
                println!("Nothing selected: select one or more files or folders first.");
                return Ok(());
            }

            let handle = spawn_stash(StashWriter::new(stash_config), resolution.files);
            let outcome = follow(handle).await?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                println!(
                    "Stash created: {} • {} files copied",
                    outcome.stash_dir.display(),
                    outcome.copied
                );
                report_errors(&outcome.errors);
            }
        }
        SubCommands::List(args) => {
            let collector = FileCollector::new(stash_config.collector_config());
            let resolution = collector.resolve(&args.paths);
            report_errors(&resolution.errors);
            if resolution.files.is_empty() {
                println!("Nothing selected: select one or more files or folders first.");
                return Ok(());
            }
            let builder = ArtifactBuilder::new(artifact);
            print!(
                "{}",
                render_tree(&resolution.files, &base_dir, builder.classifier())
            );
        }
        SubCommands::Preview(args) => {
            let builder = ArtifactBuilder::new(artifact);
            let path = absolutize(&base_dir, &args.file);
            match builder.preview(&path).await {
                Preview::Text {
                    content, truncated, ..
                } => {
                    println!("{}", content);
                    if truncated {
                        println!("… (preview truncated)");
                    }
                }
                Preview::NotText { path } => {
                    println!("{} (skipped: not treated as text)", path.display());
                }
                Preview::Error { path, message } => {
                    println!("Error reading {}: {}", path.display(), message);
                }
            }
        }
        SubCommands::Open => {
            open_stash_root(&SystemFolderOpener, &stash_config.stash_root)?;
            info!("Opened {:?}", stash_config.stash_root);
        }
    }
    Ok(())
}

async fn copy_with<S: ClipboardSink + 'static>(
    collector: FileCollector,
    builder: ArtifactBuilder,
    sink: S,
    selection: &StaticSelection,
) -> Result<CopyReport, StashError> {
    let copier = ClipboardCopier::new(collector, builder, sink);
    follow(spawn_copy(copier, selection)).await
}

/// Logs progress of a worker task and cancels it on Ctrl-C.
async fn follow<T>(mut handle: TaskHandle<T>) -> Result<T, StashError> {
    cancel_on_interrupt(handle.cancel.clone());
    while let Some(event) = handle.progress.recv().await {
        if let Progress::Processed {
            stage,
            index,
            total,
            path,
        } = event
        {
            debug!("{:?} [{}/{}] {:?}", stage, index + 1, total, path);
        }
    }
    handle.wait().await
}

/// The first Ctrl-C cancels between files; a second one exits right away,
/// e.g. while the clipboard is waiting to be taken over.
fn cancel_on_interrupt(cancel: CancelFlag) {
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling (press Ctrl-C again to quit)");
            cancel.cancel();
        }
        if signal::ctrl_c().await.is_ok() {
            std::process::exit(130);
        }
    });
}

fn report_copy(report: &CopyReport, destination: &str) {
    report_errors(&report.errors);
    if report.files.is_empty() {
        eprintln!("Nothing selected: select one or more files or folders first.");
    } else {
        eprintln!(
            "Copied {} files (text) to {}",
            report.files.len(),
            destination
        );
    }
}

fn report_errors(errors: &[ItemError]) {
    for item in errors {
        eprintln!("warning: {}", item);
    }
}
