//! File-per-identifier storage: `.anchor/comments/<encoded-id>.txt`.

use std::borrow::Cow;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::store::Store;
use crate::types::AnchorId;

/// Extension of every storage unit.
const UNIT_EXTENSION: &str = "txt";

/// One plain-text file per identifier holding its accumulated body.
pub struct FileStore {
    /// Directory holding the unit files.
    dir: PathBuf,
}

impl FileStore {
    /// Store rooted at the given `.anchor` directory.
    pub fn new(root: &Path) -> Self {
        return Self {
            dir: root.join("comments"),
        };
    }

    /// Path of the unit file for `id`.
    fn unit_path(&self, id: &AnchorId) -> PathBuf {
        return self.dir.join(format!("{}.{UNIT_EXTENSION}", encode_file_stem(id.as_str())));
    }
}

impl Store for FileStore {
    fn append(&mut self, id: &AnchorId, body: &str) -> Result<(), Error> {
        std::fs::create_dir_all(&self.dir)?;
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.unit_path(id))?;
        file.write_all(body.as_bytes())?;
        return Ok(());
    }

    fn ids(&self) -> Result<Vec<AnchorId>, Error> {
        let entries = match std::fs::read_dir(&self.dir) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::Io(e)),
            Ok(entries) => entries,
        };

        let mut ids = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().is_none_or(|ext| return ext != UNIT_EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| return s.to_str()) else {
                continue;
            };
            if let Some(id) = decode_file_stem(stem).and_then(|p| return AnchorId::new(&p).ok()) {
                ids.push(id);
            }
        }
        ids.sort();
        return Ok(ids);
    }

    fn read(&self, id: &AnchorId) -> Result<String, Error> {
        return match std::fs::read_to_string(self.unit_path(id)) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(Error::NotFound { id: id.clone() }),
            Err(e) => Err(Error::Io(e)),
            Ok(text) => Ok(text),
        };
    }

    fn remove(&mut self, id: &AnchorId) -> Result<bool, Error> {
        return match std::fs::remove_file(self.unit_path(id)) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::Io(e)),
            Ok(()) => Ok(true),
        };
    }
}

/// Reverse `encode_file_stem`. Returns `None` for names that are not UTF-8 once decoded.
fn decode_file_stem(stem: &str) -> Option<String> {
    return urlencoding::decode(stem).ok().map(Cow::into_owned);
}

/// Percent-encode every byte outside `[A-Za-z0-9._~-]` so any identifier maps
/// to a distinct, portable file name.
fn encode_file_stem(path: &str) -> String {
    return urlencoding::encode(path).into_owned();
}
