/// Crate-level error types for anchor diagnostics.
use std::path::PathBuf;

use crate::types::AnchorId;

/// All errors in anchor carry enough context to produce a useful diagnostic
/// without a debugger. Each variant names the file, identifier, or line at fault.
///
/// `BodyDiscarded`, `InvalidOption`, `MalformedTag`, and `UnterminatedComment`
/// are recovered locally and reported as warnings; the rest abort the current command.
#[allow(clippy::error_impl_error, reason = "crate-internal error type in binary")]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// `init` was run in a directory that already has a `.anchor` store.
    #[error("already initialized: {}", path.display())]
    AlreadyInitialized {
        /// Path to the existing store directory.
        path: PathBuf,
    },

    /// A flag-only `-r` dropped a body already taken out of its source file.
    #[error("comment extracted for {} is dropped by a later `-r` and will not be stored", id.tag())]
    BodyDiscarded {
        /// Identifier whose body was dropped.
        id: AnchorId,
    },

    /// The config record has a malformed line or lacks a required key.
    #[error("config parse error at line {line}: {reason}")]
    ConfigParse {
        /// One-based line number, or 0 when the problem is a missing key.
        line: usize,
        /// Description of what was wrong.
        reason: String,
    },

    /// A well-shaped option flag that is not `a`, `u`, or `r`.
    #[error("invalid option `-{flag}` for {}, stored content left unchanged", id.tag())]
    InvalidOption {
        /// The flag text after the leading dash.
        flag: String,
        /// Identifier the flag was attached to.
        id: AnchorId,
    },

    /// Underlying I/O error from the filesystem.
    #[error("io: {0}")]
    Io(
        /// The wrapped I/O error.
        #[from]
        std::io::Error,
    ),

    /// JSON serialization of command output failed.
    #[error("json: {0}")]
    Json(
        /// The wrapped serde_json error.
        #[from]
        serde_json::Error,
    ),

    /// A tag without a closing bracket, or option text of the wrong shape.
    #[error("{}:{line}: malformed anchor: {reason}", file.display())]
    MalformedTag {
        /// File containing the tag.
        file: PathBuf,
        /// One-based line number of the tag.
        line: usize,
        /// Description of the problem.
        reason: String,
    },

    /// The target path exists but is not a directory.
    #[error("not a directory: {}", path.display())]
    NotADirectory {
        /// Path that was expected to be a directory.
        path: PathBuf,
    },

    /// No stored content exists for the requested identifier.
    #[error("anchor not found: {}", id.tag())]
    NotFound {
        /// Identifier that was looked up.
        id: AnchorId,
    },

    /// A command that needs the `.anchor` store ran outside an initialized directory.
    #[error("not initialized: {} does not exist", path.display())]
    NotInitialized {
        /// Path where the store directory was expected.
        path: PathBuf,
    },

    /// A source file or directory does not exist on disk.
    #[error("path not found: {}", path.display())]
    PathNotFound {
        /// Path to the missing file or directory.
        path: PathBuf,
    },

    /// The indexed store's metadata cannot be parsed or points outside the data blob.
    #[error("store corrupt: {reason}")]
    StoreCorrupt {
        /// Description of the corruption.
        reason: String,
    },

    /// A comment block ran to the end of the file without a close marker.
    #[error("{}:{line}: comment for {} is never closed, kept what was read", file.display(), id.tag())]
    UnterminatedComment {
        /// File containing the block.
        file: PathBuf,
        /// Identifier the block belongs to.
        id: AnchorId,
        /// One-based line number of the tag.
        line: usize,
    },
}
