//! Core CLI commands for anchor: init, save, read, list, compact.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::{Config, STORE_DIR};
use crate::diagnostics;
use crate::error::Error;
use crate::extractor::Extractor;
use crate::store::{self, StorageKind};
use crate::types::AnchorId;

/// JSON shape printed by `list --json`.
#[derive(Debug, Serialize)]
struct Listing<'a> {
    /// Stored identifiers, sorted.
    anchors: &'a [AnchorId],
    /// Backend the project uses.
    storage: &'static str,
}

/// Rewrite the data file keeping only content the index still references.
///
/// # Errors
///
/// Returns `Error::NotInitialized`, config errors, or storage errors.
pub fn compact(root: &Path) -> Result<(), Error> {
    let (store_root, config) = open_project(root)?;
    let mut store = store::open(config.storage, &store_root);

    match store.compact()? {
        None => eprintln!("Nothing to compact: `{}` storage deletes files directly", config.storage),
        Some(reclaimed) => eprintln!("Compacted data file, reclaimed {reclaimed} lines"),
    }
    return Ok(());
}

/// Create the `.anchor` store and its config record.
///
/// # Errors
///
/// Returns `Error::AlreadyInitialized` if the store exists,
/// `Error::PathNotFound` or `Error::NotADirectory` for a bad target,
/// or `Error::Io` if the store cannot be created.
pub fn init(root: &Path, target_dir: &Path, extension: &str, storage: StorageKind) -> Result<(), Error> {
    let store_root = root.join(STORE_DIR);
    if store_root.exists() {
        return Err(Error::AlreadyInitialized { path: store_root });
    }
    if !target_dir.exists() {
        return Err(Error::PathNotFound {
            path: target_dir.to_path_buf(),
        });
    }
    if !target_dir.is_dir() {
        return Err(Error::NotADirectory {
            path: target_dir.to_path_buf(),
        });
    }

    let target = std::fs::canonicalize(target_dir)?;
    let config = Config::new(target, extension, storage);
    std::fs::create_dir_all(&store_root)?;
    config.write(&store_root)?;

    eprintln!(
        "Initialized {STORE_DIR}: tracking *.{} under {} ({} storage)",
        config.target_extension,
        config.target_dir.display(),
        config.storage,
    );
    return Ok(());
}

/// Print every stored identifier, one per line or as JSON.
///
/// # Errors
///
/// Returns `Error::NotInitialized`, config errors, or storage errors.
pub fn list(root: &Path, json: bool) -> Result<(), Error> {
    let (store_root, config) = open_project(root)?;
    let store = store::open(config.storage, &store_root);
    let ids = store.ids()?;

    if json {
        let listing = Listing {
            anchors: &ids,
            storage: config.storage.as_str(),
        };
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    if ids.is_empty() {
        eprintln!("No anchors stored.");
        return Ok(());
    }
    for id in &ids {
        println!("{id}");
    }
    return Ok(());
}

/// Locate the store directory and load its config.
///
/// # Errors
///
/// Returns `Error::NotInitialized` if `.anchor` is missing, or config load errors.
fn open_project(root: &Path) -> Result<(PathBuf, Config), Error> {
    let store_root = root.join(STORE_DIR);
    if !store_root.is_dir() {
        return Err(Error::NotInitialized { path: store_root });
    }
    let config = Config::load(&store_root)?;
    return Ok((store_root, config));
}

/// Print the stored body for an identifier.
///
/// # Errors
///
/// Returns `Error::MalformedTag` for an unusable identifier,
/// `Error::NotFound` if nothing is stored, or storage errors.
pub fn read(root: &Path, reference: &str) -> Result<(), Error> {
    let id = AnchorId::parse_reference(reference)?;
    let (store_root, config) = open_project(root)?;
    let store = store::open(config.storage, &store_root);

    let body = store.read(&id)?;
    print!("{body}");
    return Ok(());
}

/// Extract anchors from the configured tree (or one explicit file), persist
/// them, then write the stripped sources back.
///
/// Storage is written before sources so a failed save never loses a comment
/// that was already removed from its file.
///
/// # Errors
///
/// Returns `Error::NotInitialized`, config errors, `Error::PathNotFound` for
/// missing sources, or storage and write-back I/O errors.
pub fn save(root: &Path, path: Option<&Path>) -> Result<(), Error> {
    let (store_root, config) = open_project(root)?;

    let files = match path {
        Some(p) if p.is_file() => vec![p.to_path_buf()],
        Some(p) => return Err(Error::PathNotFound { path: p.to_path_buf() }),
        None => config.target_files()?,
    };

    let extractor = Extractor::new();
    let outcome = extractor.scan_files(&files)?;
    for warning in &outcome.extraction.warnings {
        diagnostics::print_warning(warning);
    }
    if outcome.extraction.is_empty() && outcome.rewrites.is_empty() {
        eprintln!("No anchors found in {} files", outcome.files_scanned);
        return Ok(());
    }

    let mut store = store::open(config.storage, &store_root);
    let report = store::persist(store.as_mut(), &outcome.extraction)?;
    for skipped in &report.skipped {
        diagnostics::print_warning(skipped);
    }

    for (source, content) in &outcome.rewrites {
        std::fs::write(source, content)?;
    }

    eprintln!(
        "Saved {} anchors ({} appended, {} replaced, {} removed) from {} files",
        report.applied(),
        report.appended,
        report.replaced,
        report.removed,
        outcome.files_scanned,
    );
    return Ok(());
}
