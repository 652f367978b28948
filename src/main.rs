//! fileshelf - Undoable file operations from the command line.
//!
//! Usage:
//!   fileshelf copy <SRC..> --to <DIR>     Copy items into a directory
//!   fileshelf move <SRC..> --to <DIR>     Move items into a directory
//!   fileshelf rename <PATH> <NAME>        Rename an item in place
//!   fileshelf duplicate <PATH>            Duplicate next to the original
//!   fileshelf new-file <DIR> <NAME>       Create an empty file
//!   fileshelf new-folder <DIR> <NAME>     Create a folder
//!   fileshelf delete <PATH..>             Move items to the trash
//!   fileshelf numbering <DIR> <BASE>      Show numbered siblings of a name
//!   fileshelf --help                      Show help

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result};
use tracing_subscriber::EnvFilter;

use fileshelf_core::EngineConfig;
use fileshelf_ops::{FileOperationsEngine, NumberingStyle, OperationEvent};

#[derive(Parser)]
#[command(
    name = "fileshelf",
    version,
    about = "Undoable file operations with conflict-safe numbering",
    long_about = "fileshelf copies, moves, renames, duplicates, creates and deletes files \
                  the way an editor's file panel does: clashing names are numbered \
                  instead of overwritten, and every step is recorded for undo."
)]
struct Cli {
    /// Config file (defaults to the user config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Event output format
    #[arg(short, long, global = true, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Copy items into a directory, numbering clashing names
    Copy {
        /// Items to copy
        #[arg(required = true)]
        sources: Vec<PathBuf>,

        /// Destination directory
        #[arg(short, long)]
        to: PathBuf,
    },

    /// Move items into a directory, numbering clashing names
    Move {
        /// Items to move
        #[arg(required = true)]
        sources: Vec<PathBuf>,

        /// Destination directory
        #[arg(short, long)]
        to: PathBuf,
    },

    /// Rename an item within its directory
    Rename {
        path: PathBuf,

        /// New file name (path separators are dropped)
        name: String,
    },

    /// Copy an item next to itself under the next free number
    Duplicate { path: PathBuf },

    /// Create an empty file
    NewFile { dir: PathBuf, name: String },

    /// Create a folder
    NewFolder { dir: PathBuf, name: String },

    /// Delete items, through the trash unless --permanent
    Delete {
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Skip the trash; the deletion cannot be undone
        #[arg(long)]
        permanent: bool,
    },

    /// Show which numbered variants of a name already exist
    Numbering {
        dir: PathBuf,

        /// Base name without number, e.g. "report.txt"
        base: String,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    let mut engine = FileOperationsEngine::new(config);
    let mut events = engine.subscribe();

    let result = run(&mut engine, cli.command);

    while let Ok(event) = events.try_recv() {
        print_event(&event, cli.format)?;
    }
    for record in engine.history().get_undo_history() {
        eprintln!(
            "recorded: {} (undo: {})",
            record.description(),
            record.undo_data().undo_description()
        );
    }

    result
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("fileshelf=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let config = match path {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => EngineConfig::load_or_default().context("Failed to load user config")?,
    };
    tracing::debug!(?config, "configuration loaded");
    Ok(config)
}

/// Execute one subcommand against the engine.
fn run(engine: &mut FileOperationsEngine, command: Command) -> Result<()> {
    match command {
        Command::Copy { sources, to } => {
            engine.copy_to_clipboard(sources)?;
            for path in engine.paste(&to)? {
                println!("{}", path.display());
            }
        }
        Command::Move { sources, to } => {
            for path in engine.move_items(sources, &to)? {
                println!("{}", path.display());
            }
        }
        Command::Rename { path, name } => {
            println!("{}", engine.rename_item(&path, &name)?.display());
        }
        Command::Duplicate { path } => {
            println!("{}", engine.duplicate_item(&path)?.display());
        }
        Command::NewFile { dir, name } => {
            println!("{}", engine.create_new_file(&dir, &name)?.display());
        }
        Command::NewFolder { dir, name } => {
            println!("{}", engine.create_new_folder(&dir, &name)?.display());
        }
        Command::Delete { paths, permanent } => {
            engine.delete_items(paths, permanent)?;
        }
        Command::Numbering { dir, base } => run_numbering(engine, &dir, &base)?,
    }

    Ok(())
}

/// Print existing numbers per style and the name the engine would pick.
fn run_numbering(engine: &FileOperationsEngine, dir: &Path, base: &str) -> Result<()> {
    let resolver = engine.resolver();
    let parts = resolver.extract_pattern(Path::new(base));
    let existing = resolver
        .detect_existing_numbering(dir, &parts.base)
        .with_context(|| format!("Failed to scan {}", dir.display()))?;

    for style in NumberingStyle::ALL {
        let numbers: Vec<String> = existing
            .for_style(style)
            .iter()
            .map(u32::to_string)
            .collect();
        let next = resolver.get_next_available_number(dir, &parts.base, style)?;
        println!(
            " {:<12} used: [{}]  next: {}",
            style.to_string(),
            numbers.join(", "),
            next
        );
    }

    let resolved = resolver.resolve(&dir.join(base));
    println!(" resolves to: {}", resolved.display());
    Ok(())
}

fn print_event(event: &OperationEvent, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => eprintln!("{}", event),
        OutputFormat::Json => println!("{}", serde_json::to_string(event)?),
    }
    Ok(())
}
