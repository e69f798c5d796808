//! Line scanner: locates anchor tags in a snapshot of file lines and parses
//! the option flag that may follow them.

use std::path::Path;

use regex::Regex;

use crate::error::Error;
use crate::types::{AnchorId, AnchorOption, TAG_PREFIX};

/// A line carrying an anchor tag.
#[derive(Debug)]
pub struct TagLine<'a> {
    /// Identifier parsed from the tag.
    pub id: AnchorId,
    /// Zero-based index of the line in the snapshot.
    pub index: usize,
    /// Text after the closing bracket, trimmed. Empty when no option was written.
    pub option_text: &'a str,
    /// Everything before the tag marker, typically indentation and `// `.
    pub prefix: &'a str,
}

impl TagLine<'_> {
    /// The tag line with the option flag and anything else after `]` removed.
    pub fn bare(&self) -> String {
        return format!("{}{}", self.prefix, self.id.tag());
    }

    /// One-based line number for diagnostics.
    pub const fn line_number(&self) -> usize {
        return self.index.saturating_add(1);
    }
}

/// Lazy, restartable scan over an immutable line snapshot. Yields one item per
/// line that contains the `[Anchor.` marker: the parsed tag, or a
/// `MalformedTag` error when the tag cannot be read.
pub struct TagScanner<'a> {
    /// File the lines came from, for diagnostics.
    file: &'a Path,
    /// The snapshot being scanned. Never mutated.
    lines: &'a [&'a str],
    /// Index of the next line to examine.
    next: usize,
    /// Compiled tag pattern, anchored at the marker.
    pattern: &'a Regex,
}

impl<'a> TagScanner<'a> {
    /// Start a scan at the first line of `lines`.
    pub const fn new(file: &'a Path, lines: &'a [&'a str], pattern: &'a Regex) -> Self {
        return Self {
            file,
            lines,
            next: 0,
            pattern,
        };
    }

    /// Continue the scan from `index`, skipping lines a consumer has taken.
    /// Never moves backwards.
    pub fn resume_at(&mut self, index: usize) {
        self.next = self.next.max(index);
        return;
    }
}

impl<'a> Iterator for TagScanner<'a> {
    type Item = Result<TagLine<'a>, Error>;

    /// Advance to the next line containing the tag marker.
    fn next(&mut self) -> Option<Self::Item> {
        while let Some(line) = self.lines.get(self.next).copied() {
            let index = self.next;
            self.next = self.next.saturating_add(1);
            if let Some(start) = line.find(TAG_PREFIX) {
                return Some(parse_tag_line(self.file, line, index, start, self.pattern));
            }
        }
        return None;
    }
}

/// Compile the tag pattern. Matches a tag at the start of the haystack and
/// captures the dotted path.
///
/// # Panics
///
/// Panics if the hardcoded tag regex is invalid (compile-time invariant).
pub fn tag_pattern() -> Regex {
    return Regex::new(r"^\[Anchor\.([^\]]*)\]").expect("valid regex");
}

/// Parse the trimmed text following a tag's closing bracket.
///
/// Empty text means no option. Text starting with `-` and at most two
/// characters long is a flag. Anything else is rejected with a reason.
///
/// # Errors
///
/// Returns a description of the shape violation.
pub fn parse_option(text: &str) -> Result<Option<AnchorOption>, String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let Some(flag) = trimmed.strip_prefix('-') else {
        return Err(format!("expected `-a`, `-u`, or `-r` after the tag, found `{trimmed}`"));
    };
    if trimmed.chars().count() > 2 {
        return Err(format!("option `{trimmed}` is longer than one character"));
    }
    return Ok(Some(AnchorOption::from_flag(flag)));
}

/// Read the tag that begins at byte `start` of `line`.
///
/// # Errors
///
/// Returns `Error::MalformedTag` if the tag has no closing bracket or an empty path.
fn parse_tag_line<'a>(
    file: &Path,
    line: &'a str,
    index: usize,
    start: usize,
    pattern: &Regex,
) -> Result<TagLine<'a>, Error> {
    let malformed = |reason: &str| {
        return Error::MalformedTag {
            file: file.to_path_buf(),
            line: index.saturating_add(1),
            reason: reason.to_string(),
        };
    };

    let (Some(prefix), Some(rest)) = (line.get(..start), line.get(start..)) else {
        return Err(malformed("tag marker is not on a character boundary"));
    };
    let Some(caps) = pattern.captures(rest) else {
        return Err(malformed("tag has no closing `]`"));
    };
    let (Some(whole), Some(path)) = (caps.get(0), caps.get(1)) else {
        return Err(malformed("tag has no closing `]`"));
    };
    if path.as_str().is_empty() {
        return Err(malformed("tag has an empty anchor path"));
    }
    let id = AnchorId::new(path.as_str()).map_err(|_err| return malformed("tag path is invalid"))?;
    let option_text = rest.get(whole.end()..).unwrap_or("").trim();

    return Ok(TagLine {
        id,
        index,
        option_text,
        prefix,
    });
}
