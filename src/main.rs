use std::path::{Path, PathBuf};

use artboard::config::EditorConfig;
use artboard::doc::Document;
use artboard::editor::{Action, Editor};
use artboard::scene::MemoryScene;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("failed to write {path}: {source}")]
    Write { path: PathBuf, source: std::io::Error },
    #[error("invalid document JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("{0} region pair(s) overlap")]
    Overlapping(usize),
}

#[derive(Parser, Debug)]
#[command(name = "artboard", about = "Inspect and tidy artboard region layouts")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List regions in creation order.
    Inspect { file: PathBuf },
    /// Report overlapping region pairs; fails when any overlap.
    Overlaps { file: PathBuf },
    /// Push overlapping regions apart and write the result.
    Settle {
        file: PathBuf,
        /// Write here instead of stdout.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();
    let cli = Cli::parse();
    match cli.command {
        Command::Inspect { file } => run_inspect(&file),
        Command::Overlaps { file } => run_overlaps(&file),
        Command::Settle { file, output } => run_settle(&file, output.as_deref()),
    }
}

fn open(path: &Path) -> Result<Editor<MemoryScene>, CliError> {
    let input = std::fs::read_to_string(path).map_err(|source| CliError::Read { path: path.to_path_buf(), source })?;
    let doc = Document::from_json(&input)?;
    let mut editor = Editor::new(MemoryScene::new(), EditorConfig::from_env());
    for action in editor.load_document(doc, 0) {
        if let Action::Notify(message) = action {
            warn!(%message, "skipped region");
        }
    }
    Ok(editor)
}

fn run_inspect(path: &Path) -> Result<(), CliError> {
    let editor = open(path)?;
    for region in editor.regions() {
        let active = if region.is_active { "*" } else { " " };
        println!(
            "{active} {} {:<24} {:>8.1} {:>8.1} {:>8.1} x {:<8.1} {}",
            region.id, region.name, region.x, region.y, region.width, region.height, region.background_color
        );
    }
    Ok(())
}

fn run_overlaps(path: &Path) -> Result<(), CliError> {
    let editor = open(path)?;
    let pairs = editor.overlapping_pairs();
    for (a, b) in &pairs {
        let name = |id| editor.region(id).map_or("?", |r| r.name.as_str());
        println!("{a} ({}) overlaps {b} ({})", name(a), name(b));
    }
    if pairs.is_empty() {
        println!("no overlaps");
        return Ok(());
    }
    Err(CliError::Overlapping(pairs.len()))
}

fn run_settle(path: &Path, output: Option<&Path>) -> Result<(), CliError> {
    let mut editor = open(path)?;
    let before = editor.overlapping_pairs().len();
    let moved = editor.settle_regions(0).iter().filter(|a| matches!(a, Action::RegionCommitted(_))).count();
    let after = editor.overlapping_pairs().len();
    info!(moved, before, after, "settled layout");

    let rendered = editor.document().to_json()?;
    match output {
        Some(out) => std::fs::write(out, rendered).map_err(|source| CliError::Write { path: out.to_path_buf(), source })?,
        None => println!("{rendered}"),
    }
    if after > 0 {
        return Err(CliError::Overlapping(after));
    }
    Ok(())
}
