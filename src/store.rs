//! Persistence engine: the `Store` seam, backend selection, and the
//! per-identifier append/update/remove policy applied on save.

use std::fmt;
use std::path::Path;

use crate::error::Error;
use crate::file_store::FileStore;
use crate::indexed_store::IndexedStore;
use crate::types::{AnchorId, AnchorOption, Extraction};

/// Which on-disk layout a project uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum StorageKind {
    /// One file per identifier under `.anchor/comments/`.
    #[default]
    Files,
    /// A shared data blob plus a line-range index.
    Indexed,
}

impl StorageKind {
    /// The config-file spelling.
    pub const fn as_str(self) -> &'static str {
        return match self {
            StorageKind::Files => "files",
            StorageKind::Indexed => "indexed",
        };
    }

    /// Parse the config-file spelling.
    pub fn parse(value: &str) -> Option<Self> {
        return match value {
            "files" => Some(StorageKind::Files),
            "indexed" => Some(StorageKind::Indexed),
            _ => None,
        };
    }
}

impl fmt::Display for StorageKind {
    /// Display the config-file spelling.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return f.write_str(self.as_str());
    }
}

/// Counts of what a save did, plus identifiers that were skipped.
#[derive(Debug, Default)]
pub struct PersistReport {
    /// Bodies appended to existing or new storage units.
    pub appended: usize,
    /// Storage units deleted without a replacement.
    pub removed: usize,
    /// Storage units deleted and rewritten with a new body.
    pub replaced: usize,
    /// Identifiers left unchanged because their flag was not recognised.
    pub skipped: Vec<Error>,
}

impl PersistReport {
    /// Number of identifiers whose storage was written or deleted.
    pub const fn applied(&self) -> usize {
        return self
            .appended
            .saturating_add(self.removed)
            .saturating_add(self.replaced);
    }
}

/// Storage backend addressed by identifier. Each call opens, uses, and closes
/// its files before returning.
pub trait Store {
    /// Append `body` to the unit for `id`, creating it if missing. Never truncates.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the unit cannot be written.
    fn append(&mut self, id: &AnchorId, body: &str) -> Result<(), Error>;

    /// Reclaim space left by deleted content. Returns the number of lines
    /// reclaimed, or `None` when the backend has nothing to compact.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` or `Error::StoreCorrupt` from reading or rewriting storage.
    fn compact(&mut self) -> Result<Option<usize>, Error> {
        return Ok(None);
    }

    /// Every stored identifier, sorted.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` or `Error::StoreCorrupt` if storage cannot be listed.
    fn ids(&self) -> Result<Vec<AnchorId>, Error>;

    /// The full stored text for `id`.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` when nothing is stored for `id`.
    fn read(&self, id: &AnchorId) -> Result<String, Error>;

    /// Delete the unit for `id`. Returns whether anything existed.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the unit exists but cannot be deleted.
    fn remove(&mut self, id: &AnchorId) -> Result<bool, Error>;
}

/// Open the backend of the given kind rooted at the `.anchor` directory.
pub fn open(kind: StorageKind, root: &Path) -> Box<dyn Store> {
    return match kind {
        StorageKind::Files => Box::new(FileStore::new(root)),
        StorageKind::Indexed => Box::new(IndexedStore::new(root)),
    };
}

/// Apply the merged extraction to storage, one identifier at a time in sorted order.
///
/// Policy per identifier: `-r` deletes and never writes; `-u` deletes then
/// writes the body if there is one; `-a` or no flag appends the body if there
/// is one. Unrecognised flags leave storage untouched and are reported in
/// `PersistReport::skipped`.
///
/// # Errors
///
/// Returns the first storage failure. Identifiers processed before it stay written.
pub fn persist(store: &mut dyn Store, extraction: &Extraction) -> Result<PersistReport, Error> {
    let mut report = PersistReport::default();

    for id in extraction.ids() {
        let body = extraction.bodies.get(id);
        match (extraction.options.get(id), body) {
            (Some(AnchorOption::Unknown(flag)), _) => {
                report.skipped.push(Error::InvalidOption {
                    flag: flag.clone(),
                    id: id.clone(),
                });
            },
            (Some(AnchorOption::Remove), _) | (Some(AnchorOption::Update), None) => {
                if store.remove(id)? {
                    report.removed = report.removed.saturating_add(1);
                }
            },
            (Some(AnchorOption::Update), Some(text)) => {
                store.remove(id)?;
                store.append(id, text)?;
                report.replaced = report.replaced.saturating_add(1);
            },
            (Some(AnchorOption::Append) | None, Some(text)) => {
                store.append(id, text)?;
                report.appended = report.appended.saturating_add(1);
            },
            (Some(AnchorOption::Append) | None, None) => {},
        }
    }

    return Ok(report);
}
