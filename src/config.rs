use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::Error;
use crate::store::StorageKind;

/// Name of the config record inside the store directory.
pub const CONFIG_FILE: &str = "config";

/// Hidden per-project directory holding the config and all stored comments.
pub const STORE_DIR: &str = ".anchor";

/// Project configuration loaded from `.anchor/config`.
/// Each non-empty line is `key=value`; `targetDir` and `targetExtension` are required.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Storage backend; `files` unless the record says otherwise.
    pub storage: StorageKind,
    /// Root of the source tree to scan.
    pub target_dir: PathBuf,
    /// Extension of files to scan, without the leading dot.
    pub target_extension: String,
}

impl Config {
    /// Load the config record from the store directory.
    ///
    /// # Errors
    ///
    /// Returns `Error::PathNotFound` if the record is missing, `Error::Io` if
    /// it cannot be read, or `Error::ConfigParse` if it is malformed.
    pub fn load(store_root: &Path) -> Result<Self, Error> {
        let path = store_root.join(CONFIG_FILE);
        let content = match std::fs::read_to_string(&path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(Error::PathNotFound { path }),
            Err(e) => return Err(Error::Io(e)),
            Ok(c) => c,
        };
        return Self::parse(&content);
    }

    /// Build a config, normalising the extension to have no leading dot.
    pub fn new(target_dir: PathBuf, target_extension: &str, storage: StorageKind) -> Self {
        return Self {
            storage,
            target_dir,
            target_extension: target_extension.trim().trim_start_matches('.').to_string(),
        };
    }

    /// Parse `key=value` lines. Never falls back to defaults for required keys.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigParse` for a line that is not exactly two
    /// `=`-separated fields, an unknown key or storage kind, or a missing
    /// required key (reported at line 0).
    pub fn parse(content: &str) -> Result<Self, Error> {
        let mut target_dir: Option<PathBuf> = None;
        let mut target_extension: Option<String> = None;
        let mut storage = StorageKind::default();

        for (i, raw) in content.lines().enumerate() {
            let line_no = i.saturating_add(1);
            if raw.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = raw.split('=').collect();
            let [key, value] = fields.as_slice() else {
                return Err(Error::ConfigParse {
                    line: line_no,
                    reason: format!("expected `key=value`, found `{raw}`"),
                });
            };
            let value = value.trim();
            match key.trim() {
                "storage" => {
                    storage = StorageKind::parse(value).ok_or_else(|| {
                        return Error::ConfigParse {
                            line: line_no,
                            reason: format!("unknown storage `{value}`, expected `files` or `indexed`"),
                        };
                    })?;
                },
                "targetDir" => target_dir = Some(PathBuf::from(value)),
                "targetExtension" => target_extension = Some(value.to_string()),
                other => {
                    return Err(Error::ConfigParse {
                        line: line_no,
                        reason: format!("unknown key `{other}`"),
                    });
                },
            }
        }

        let Some(target_dir) = target_dir else {
            return Err(missing_key("targetDir"));
        };
        let Some(target_extension) = target_extension else {
            return Err(missing_key("targetExtension"));
        };
        return Ok(Self::new(target_dir, &target_extension, storage));
    }

    /// Serialise back to `key=value` lines.
    pub fn render(&self) -> String {
        return format!(
            "targetDir={}\ntargetExtension={}\nstorage={}\n",
            self.target_dir.display(),
            self.target_extension,
            self.storage,
        );
    }

    /// Whether a file path has the configured extension.
    pub fn should_scan(&self, path: &Path) -> bool {
        return path
            .extension()
            .and_then(|ext| return ext.to_str())
            .is_some_and(|ext| return ext == self.target_extension);
    }

    /// Every file under `target_dir` with the configured extension, sorted by
    /// path. Hidden `.anchor` directories are never descended into.
    ///
    /// # Errors
    ///
    /// Returns `Error::PathNotFound` if the target directory is gone, or
    /// `Error::Io` if the walk fails part-way.
    pub fn target_files(&self) -> Result<Vec<PathBuf>, Error> {
        if !self.target_dir.is_dir() {
            return Err(Error::PathNotFound {
                path: self.target_dir.clone(),
            });
        }

        let mut files = Vec::new();
        let walker = WalkDir::new(&self.target_dir)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| return e.file_name() != STORE_DIR);
        for entry in walker {
            let entry = entry.map_err(|e| return Error::Io(std::io::Error::other(e)))?;
            if entry.file_type().is_file() && self.should_scan(entry.path()) {
                files.push(entry.into_path());
            }
        }
        return Ok(files);
    }

    /// Write the record into the store directory, replacing any existing one.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the file cannot be written.
    pub fn write(&self, store_root: &Path) -> Result<(), Error> {
        std::fs::write(store_root.join(CONFIG_FILE), self.render())?;
        return Ok(());
    }
}

/// Error for a required key that never appeared.
fn missing_key(key: &str) -> Error {
    return Error::ConfigParse {
        line: 0,
        reason: format!("missing required key `{key}`"),
    };
}
