//! Single-blob storage with a line-range index.
//!
//! `data.txt` is a sequence of segments, each a `[Anchor.<id>]` header line
//! followed by the body lines. `metadata.txt` has one `[Anchor.<id>]:<start>-<end>`
//! line per segment, where `start` is the 1-based line of the header and `end`
//! is one past the last body line. Body lines are those strictly between the two.
//!
//! Appends add a segment; removal only drops index lines. The blob never
//! shrinks until `compact` rewrites it. `compact` stages both files as
//! `*.tmp` siblings and renames them into place, so a crash leaves either
//! the old pair or the new one, except in the short gap between the renames.

use std::io::Write as _;
use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::store::Store;
use crate::types::{AnchorId, TAG_PREFIX, TAG_SUFFIX};

/// One index line: where a segment for `id` lives in the blob.
#[derive(Debug, Clone, PartialEq, Eq)]
struct IndexEntry {
    /// Exclusive upper bound: one past the last body line.
    end: usize,
    /// Identifier the segment belongs to.
    id: AnchorId,
    /// 1-based line number of the segment header.
    start: usize,
}

impl IndexEntry {
    /// Render as a metadata line without the trailing newline.
    fn render(&self) -> String {
        return format!("{}:{}-{}", self.id.tag(), self.start, self.end);
    }
}

/// Data blob plus metadata index under the `.anchor` directory.
pub struct IndexedStore {
    /// Path to the data blob.
    data: PathBuf,
    /// Path to the metadata index.
    metadata: PathBuf,
}

impl IndexedStore {
    /// Body lines for one entry, each newline-terminated.
    ///
    /// # Errors
    ///
    /// Returns `Error::StoreCorrupt` if the range points past the blob.
    fn body_of(entry: &IndexEntry, lines: &[&str], out: &mut String) -> Result<(), Error> {
        let first = entry.start.saturating_add(1);
        for number in first..entry.end {
            let Some(line) = number.checked_sub(1).and_then(|i| return lines.get(i)) else {
                return Err(Error::StoreCorrupt {
                    reason: format!("{} points past the end of the data file", entry.render()),
                });
            };
            out.push_str(line);
            out.push('\n');
        }
        return Ok(());
    }

    /// Read the metadata index. A missing file is an empty index.
    ///
    /// # Errors
    ///
    /// Returns `Error::StoreCorrupt` for unparseable lines, or `Error::Io`.
    fn load_index(&self) -> Result<Vec<IndexEntry>, Error> {
        let content = read_or_empty(&self.metadata)?;
        let mut entries = Vec::new();
        for (i, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let entry = parse_index_line(line).ok_or_else(|| {
                return Error::StoreCorrupt {
                    reason: format!("metadata line {}: `{line}` is not `[Anchor.<id>]:<start>-<end>`", i.saturating_add(1)),
                };
            })?;
            entries.push(entry);
        }
        return Ok(entries);
    }

    /// Store rooted at the given `.anchor` directory.
    pub fn new(root: &Path) -> Self {
        return Self {
            data: root.join("data.txt"),
            metadata: root.join("metadata.txt"),
        };
    }

    /// Overwrite the metadata index with `entries`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the index cannot be written.
    fn write_index(&self, entries: &[IndexEntry]) -> Result<(), Error> {
        std::fs::write(&self.metadata, render_index(entries))?;
        return Ok(());
    }
}

impl Store for IndexedStore {
    fn append(&mut self, id: &AnchorId, body: &str) -> Result<(), Error> {
        if let Some(parent) = self.data.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let existing = read_or_empty(&self.data)?;

        let mut segment = String::new();
        if !existing.is_empty() && !existing.ends_with('\n') {
            segment.push('\n');
        }
        segment.push_str(&id.tag());
        segment.push('\n');
        segment.push_str(body);
        if !body.is_empty() && !body.ends_with('\n') {
            segment.push('\n');
        }

        let start = existing.lines().count().saturating_add(1);
        let body_lines = body.lines().count();
        let entry = IndexEntry {
            end: start.saturating_add(body_lines).saturating_add(1),
            id: id.clone(),
            start,
        };

        let mut data = std::fs::OpenOptions::new().create(true).append(true).open(&self.data)?;
        data.write_all(segment.as_bytes())?;

        let mut metadata = std::fs::OpenOptions::new().create(true).append(true).open(&self.metadata)?;
        writeln!(metadata, "{}", entry.render())?;
        return Ok(());
    }

    fn compact(&mut self) -> Result<Option<usize>, Error> {
        let entries = self.load_index()?;
        let existing = read_or_empty(&self.data)?;
        let lines: Vec<&str> = existing.lines().collect();

        let mut data = String::new();
        let mut rebuilt = Vec::with_capacity(entries.len());
        let mut next_line = 1_usize;
        for entry in &entries {
            let mut body = String::new();
            Self::body_of(entry, &lines, &mut body)?;
            let body_lines = body.lines().count();

            data.push_str(&entry.id.tag());
            data.push('\n');
            data.push_str(&body);
            rebuilt.push(IndexEntry {
                end: next_line.saturating_add(body_lines).saturating_add(1),
                id: entry.id.clone(),
                start: next_line,
            });
            next_line = next_line.saturating_add(body_lines).saturating_add(1);
        }

        let reclaimed = lines.len().saturating_sub(next_line.saturating_sub(1));
        let data_staged = staged_path(&self.data);
        let metadata_staged = staged_path(&self.metadata);
        std::fs::write(&data_staged, data)?;
        std::fs::write(&metadata_staged, render_index(&rebuilt))?;
        // Both files are complete on disk before either original is replaced.
        std::fs::rename(&data_staged, &self.data)?;
        std::fs::rename(&metadata_staged, &self.metadata)?;
        return Ok(Some(reclaimed));
    }

    fn ids(&self) -> Result<Vec<AnchorId>, Error> {
        let mut ids: Vec<AnchorId> = self.load_index()?.into_iter().map(|e| return e.id).collect();
        ids.sort();
        ids.dedup();
        return Ok(ids);
    }

    fn read(&self, id: &AnchorId) -> Result<String, Error> {
        let entries: Vec<IndexEntry> = self.load_index()?.into_iter().filter(|e| return e.id == *id).collect();
        if entries.is_empty() {
            return Err(Error::NotFound { id: id.clone() });
        }

        let existing = read_or_empty(&self.data)?;
        let lines: Vec<&str> = existing.lines().collect();
        let mut out = String::new();
        for entry in &entries {
            Self::body_of(entry, &lines, &mut out)?;
        }
        return Ok(out);
    }

    fn remove(&mut self, id: &AnchorId) -> Result<bool, Error> {
        let mut entries = self.load_index()?;
        let before = entries.len();
        entries.retain(|e| return e.id != *id);
        if entries.len() == before {
            return Ok(false);
        }
        self.write_index(&entries)?;
        return Ok(true);
    }
}

/// Parse `[Anchor.<id>]:<start>-<end>`. The id may itself contain `:`.
///
/// Older stores kept the tag line's option in the key, as in
/// `[Anchor.Foo] -u:1-3`; anything after the closing bracket is ignored.
fn parse_index_line(line: &str) -> Option<IndexEntry> {
    let (key, range) = line.trim().rsplit_once(':')?;
    if !key.starts_with(TAG_PREFIX) {
        return None;
    }
    let tag = key.find(TAG_SUFFIX).and_then(|i| return key.get(..=i))?;
    let id = AnchorId::parse_reference(tag).ok()?;
    let (start, end) = range.split_once('-')?;
    let start: usize = start.trim().parse().ok()?;
    let end: usize = end.trim().parse().ok()?;
    if start == 0 || end <= start {
        return None;
    }
    return Some(IndexEntry { end, id, start });
}

/// Read a file, treating a missing file as empty.
///
/// # Errors
///
/// Returns `Error::Io` for failures other than not-found.
fn read_or_empty(path: &Path) -> Result<String, Error> {
    return match std::fs::read_to_string(path) {
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(Error::Io(e)),
        Ok(c) => Ok(c),
    };
}

/// Metadata file content for `entries`, one line each.
fn render_index(entries: &[IndexEntry]) -> String {
    let mut content = String::new();
    for entry in entries {
        content.push_str(&entry.render());
        content.push('\n');
    }
    return content;
}

/// Sibling path a replacement is written to before it is renamed over `path`.
fn staged_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    return path.with_file_name(name);
}
