//! Comment block extraction: consumes the block comment under each anchor tag,
//! collects its body, and rebuilds the file without it.
//!
//! The input lines are an immutable snapshot. Output is built by copying the
//! lines that survive, so indices into the snapshot never shift mid-scan.

use std::path::{Path, PathBuf};

use regex::Regex;

use crate::error::Error;
use crate::scanner::{self, TagLine, TagScanner};
use crate::types::{AnchorOption, Extraction};

/// Block comment open marker.
const OPEN_MARKER: &str = "/*";

/// Block comment close marker.
const CLOSE_MARKER: &str = "*/";

/// What follows a tag line.
#[derive(Debug, PartialEq, Eq)]
enum Block {
    /// The next line does not open a block comment. Nothing is consumed.
    Absent,
    /// A complete block; `end` is the index of the first line after it.
    Closed {
        /// Trimmed interior lines, each newline-terminated.
        body: String,
        /// First line index after the close marker.
        end: usize,
    },
    /// The block ran to the end of the file without a close marker.
    Unterminated {
        /// Whatever was accumulated before the file ended.
        body: String,
    },
}

/// Result of extracting one file.
#[derive(Debug)]
pub struct FileExtraction {
    /// Rebuilt file content, ready to be written back.
    pub content: String,
    /// Anchors and warnings found in this file.
    pub extraction: Extraction,
    /// Whether `content` differs from what was read.
    pub touched: bool,
}

/// Extracted content for a whole save run.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// Merged anchors across all files, last-wins per identifier.
    pub extraction: Extraction,
    /// Number of files read.
    pub files_scanned: usize,
    /// Files whose content changed, with their new content.
    pub rewrites: Vec<(PathBuf, String)>,
}

/// Stateless extractor holding the compiled tag pattern so it is built once per run.
pub struct Extractor {
    /// Tag pattern from `scanner::tag_pattern`.
    pattern: Regex,
}

impl Default for Extractor {
    /// Same as `Extractor::new`.
    fn default() -> Self {
        return Self::new();
    }
}

impl Extractor {
    /// Extract anchors from one file's content.
    pub fn extract(&self, file: &Path, content: &str) -> FileExtraction {
        let lines: Vec<&str> = content.lines().collect();
        let mut output: Vec<String> = Vec::with_capacity(lines.len());
        let mut extraction = Extraction::default();
        let mut copied = 0_usize;
        let mut touched = false;

        let mut tags = TagScanner::new(file, &lines, &self.pattern);
        while let Some(item) = tags.next() {
            let tag = match item {
                Err(e) => {
                    extraction.warnings.push(e);
                    continue;
                },
                Ok(t) => t,
            };

            copy_lines(&lines, copied, tag.index, &mut output);
            let after_tag = tag.index.saturating_add(1);
            copied = after_tag;

            let option = match scanner::parse_option(tag.option_text) {
                Err(reason) => {
                    // Body stays in the file so nothing is lost.
                    extraction.warnings.push(Error::MalformedTag {
                        file: file.to_path_buf(),
                        line: tag.line_number(),
                        reason,
                    });
                    // Without a dash flag or a block this is a code line that mentions a tag.
                    if tag.option_text.starts_with('-') || read_block(&lines, after_tag) != Block::Absent {
                        push_bare(&tag, &lines, &mut output, &mut touched);
                    } else {
                        push_verbatim(&tag, &lines, &mut output);
                    }
                    continue;
                },
                Ok(Some(AnchorOption::Unknown(flag))) => {
                    extraction.warnings.push(Error::MalformedTag {
                        file: file.to_path_buf(),
                        line: tag.line_number(),
                        reason: format!("unknown option `-{flag}`, expected `-a`, `-u`, or `-r`; comment left in place"),
                    });
                    push_bare(&tag, &lines, &mut output, &mut touched);
                    continue;
                },
                Ok(o) => o,
            };

            match read_block(&lines, after_tag) {
                Block::Absent => {
                    let Some(flag) = option else {
                        push_verbatim(&tag, &lines, &mut output);
                        continue;
                    };
                    // Strip the flag so it applies once, not on every save.
                    push_bare(&tag, &lines, &mut output, &mut touched);
                    extraction.record(tag.id, None, Some(flag));
                },
                Block::Closed { body, end } => {
                    push_bare(&tag, &lines, &mut output, &mut touched);
                    touched = true;
                    copied = end;
                    tags.resume_at(end);
                    extraction.record(tag.id, Some(body), option);
                },
                Block::Unterminated { body } => {
                    push_bare(&tag, &lines, &mut output, &mut touched);
                    touched = true;
                    copied = lines.len();
                    tags.resume_at(lines.len());
                    extraction.warnings.push(Error::UnterminatedComment {
                        file: file.to_path_buf(),
                        id: tag.id.clone(),
                        line: tag.line_number(),
                    });
                    extraction.record(tag.id, Some(body), option);
                },
            }
        }
        copy_lines(&lines, copied, lines.len(), &mut output);

        if !touched {
            return FileExtraction {
                content: content.to_string(),
                extraction,
                touched,
            };
        }

        return FileExtraction {
            content: join_lines(content, &output),
            extraction,
            touched,
        };
    }

    /// Build an extractor with a freshly compiled tag pattern.
    pub fn new() -> Self {
        return Self {
            pattern: scanner::tag_pattern(),
        };
    }

    /// Read and extract every file in order, merging results last-wins.
    /// Nothing is written; changed contents are returned in `rewrites`.
    ///
    /// # Errors
    ///
    /// Returns `Error::PathNotFound` if a file does not exist,
    /// or `Error::Io` if it cannot be read.
    pub fn scan_files(&self, paths: &[PathBuf]) -> Result<ScanOutcome, Error> {
        let mut outcome = ScanOutcome::default();

        for path in paths {
            let content = match std::fs::read_to_string(path) {
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    return Err(Error::PathNotFound { path: path.clone() });
                },
                Err(e) => return Err(Error::Io(e)),
                Ok(c) => c,
            };

            let file = self.extract(path, &content);
            outcome.files_scanned = outcome.files_scanned.saturating_add(1);
            outcome.extraction.merge(file.extraction);
            if file.touched {
                outcome.rewrites.push((path.clone(), file.content));
            }
        }

        return Ok(outcome);
    }
}

/// Append `lines[from..to]` to `output` unchanged.
fn copy_lines(lines: &[&str], from: usize, to: usize, output: &mut Vec<String>) {
    let Some(slice) = lines.get(from..to) else { return };
    output.extend(slice.iter().map(|l| return (*l).to_string()));
    return;
}

/// Rejoin rebuilt lines with the file's original terminator and trailing newline.
fn join_lines(original: &str, lines: &[String]) -> String {
    let ending = if original.contains("\r\n") { "\r\n" } else { "\n" };
    let mut out = lines.join(ending);
    if original.ends_with('\n') && !lines.is_empty() {
        out.push_str(ending);
    }
    return out;
}

/// Push the tag line stripped of its option flag.
fn push_bare(tag: &TagLine<'_>, lines: &[&str], output: &mut Vec<String>, touched: &mut bool) {
    let bare = tag.bare();
    if lines.get(tag.index).is_some_and(|l| return *l != bare) {
        *touched = true;
    }
    output.push(bare);
    return;
}

/// Push the tag line exactly as it was read.
fn push_verbatim(tag: &TagLine<'_>, lines: &[&str], output: &mut Vec<String>) {
    output.push(lines.get(tag.index).copied().unwrap_or_default().to_string());
    return;
}

/// Consume the block comment starting at `start`, if there is one.
///
/// Text sharing a line with the open or close marker is kept. Lines inside the
/// block that carry a stray open marker are dropped.
fn read_block(lines: &[&str], start: usize) -> Block {
    let Some(open_line) = lines.get(start) else {
        return Block::Absent;
    };
    let Some((_, after_open)) = open_line.split_once(OPEN_MARKER) else {
        return Block::Absent;
    };

    let mut body = String::new();
    if let Some((inner, _)) = after_open.split_once(CLOSE_MARKER) {
        push_fragment(&mut body, inner);
        return Block::Closed {
            body,
            end: start.saturating_add(1),
        };
    }
    push_fragment(&mut body, after_open);

    let mut index = start.saturating_add(1);
    while let Some(line) = lines.get(index) {
        index = index.saturating_add(1);
        if let Some((before_close, _)) = line.split_once(CLOSE_MARKER) {
            push_fragment(&mut body, before_close);
            return Block::Closed { body, end: index };
        }
        if line.contains(OPEN_MARKER) {
            continue;
        }
        body.push_str(line.trim());
        body.push('\n');
    }

    return Block::Unterminated { body };
}

/// Add text found beside a marker, ignoring decoration-only remainders.
fn push_fragment(body: &mut String, fragment: &str) {
    let text = fragment.trim().trim_matches('*').trim();
    if text.is_empty() {
        return;
    }
    body.push_str(text);
    body.push('\n');
    return;
}
