mod commands;
mod config;
mod diagnostics;
mod error;
mod extractor;
mod file_store;
mod indexed_store;
mod scanner;
mod store;
mod types;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use crate::store::StorageKind;

#[derive(Parser)]
#[command(name = "anchor", version, about = "Move tagged comment blocks out of source files and read them back by id")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite the indexed data file without removed or replaced content
    Compact,
    /// Track a source directory from the current directory
    Init {
        /// Root of the source tree to scan
        target_dir: PathBuf,
        /// Extension of files to scan
        #[arg(long, short, default_value = "java")]
        extension: String,
        /// Storage layout for extracted comments
        #[arg(long, value_enum, default_value_t = StorageKind::Files)]
        storage: StorageKind,
    },
    /// List stored anchor identifiers
    List {
        /// Emit JSON instead of one identifier per line
        #[arg(long)]
        json: bool,
    },
    /// Print the stored comment for an identifier (`Foo.Bar` or `[Anchor.Foo.Bar]`)
    Read {
        /// Anchor identifier
        id: String,
    },
    /// Extract anchor comments into the store and strip them from sources
    Save {
        /// Process only this file instead of the configured tree
        path: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let root = Path::new(".");

    let result = match cli.command {
        Commands::Compact => commands::compact(root),
        Commands::Init { target_dir, extension, storage } => {
            commands::init(root, &target_dir, &extension, storage)
        },
        Commands::List { json } => commands::list(root, json),
        Commands::Read { id } => commands::read(root, &id),
        Commands::Save { path } => commands::save(root, path.as_deref()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            diagnostics::print_error(&e);
            ExitCode::FAILURE
        },
    }
}
