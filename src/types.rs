/// Core domain types for anchors, their options, and extraction results.
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::error::Error;

/// Opening marker every anchor tag starts with.
pub const TAG_PREFIX: &str = "[Anchor.";

/// Closing character of an anchor tag.
pub const TAG_SUFFIX: char = ']';

/// The dotted path inside an anchor tag: `Foo.Bar` for `[Anchor.Foo.Bar]`.
/// Never empty. Newtype prevents mixing with raw tag text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
#[serde(transparent)]
pub struct AnchorId(
    /// The dotted path without the `[Anchor.` prefix and `]` suffix.
    String,
);

impl AnchorId {
    /// The dotted path as a string slice.
    pub fn as_str(&self) -> &str {
        return &self.0;
    }

    /// Build an id from its dotted path.
    ///
    /// # Errors
    ///
    /// Returns `Error::MalformedTag` if the path is empty or contains the
    /// closing bracket.
    pub fn new(path: &str) -> Result<Self, Error> {
        if path.is_empty() || path.contains(TAG_SUFFIX) {
            return Err(Error::MalformedTag {
                file: std::path::PathBuf::new(),
                line: 0,
                reason: format!("`{path}` is not a valid anchor path"),
            });
        }
        return Ok(Self(path.to_string()));
    }

    /// Parse user input from the command line. Accepts both `Foo.Bar` and the
    /// full `[Anchor.Foo.Bar]` form.
    ///
    /// # Errors
    ///
    /// Returns `Error::MalformedTag` if the input is empty or half-bracketed.
    pub fn parse_reference(input: &str) -> Result<Self, Error> {
        let trimmed = input.trim();
        let path = match trimmed.strip_prefix(TAG_PREFIX) {
            Some(rest) => rest.strip_suffix(TAG_SUFFIX).unwrap_or(rest),
            None => trimmed,
        };
        return Self::new(path);
    }

    /// The full bracketed tag, e.g. `[Anchor.Foo.Bar]`.
    pub fn tag(&self) -> String {
        return format!("{TAG_PREFIX}{}{TAG_SUFFIX}", self.0);
    }
}

impl fmt::Display for AnchorId {
    /// Display the dotted path.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return f.write_str(&self.0);
    }
}

/// Policy flag written after a tag as `-a`, `-u`, or `-r`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnchorOption {
    /// `-a`: append the new body to whatever is stored.
    Append,
    /// `-r`: delete stored content, never write the new body.
    Remove,
    /// Well-shaped but unrecognised flag such as `-x`.
    Unknown(String),
    /// `-u`: delete stored content, then write the new body fresh.
    Update,
}

impl AnchorOption {
    /// Map the text after the leading `-` to an option.
    pub fn from_flag(flag: &str) -> Self {
        return match flag {
            "a" => Self::Append,
            "r" => Self::Remove,
            "u" => Self::Update,
            other => Self::Unknown(other.to_string()),
        };
    }
}

/// Everything extracted from one or more files. A later record with a body
/// replaces earlier ones for the same identifier; see `Extraction::record`.
#[derive(Debug, Default)]
pub struct Extraction {
    /// Identifier to extracted comment body.
    pub bodies: BTreeMap<AnchorId, String>,
    /// Identifier to its policy flag; absent means default accumulation.
    pub options: BTreeMap<AnchorId, AnchorOption>,
    /// Locally recovered problems, reported but never fatal.
    pub warnings: Vec<Error>,
}

impl Extraction {
    /// Every identifier present in either map, in sorted order.
    pub fn ids(&self) -> BTreeSet<&AnchorId> {
        return self.bodies.keys().chain(self.options.keys()).collect();
    }

    /// True when no anchor was recorded.
    pub fn is_empty(&self) -> bool {
        return self.bodies.is_empty() && self.options.is_empty();
    }

    /// Fold another extraction into this one, applying its records in order
    /// as if they had been found after everything already here.
    pub fn merge(&mut self, other: Self) {
        let Self {
            mut bodies,
            mut options,
            warnings,
        } = other;
        let ids: BTreeSet<AnchorId> = bodies.keys().chain(options.keys()).cloned().collect();
        for id in ids {
            let body = bodies.remove(&id);
            let option = options.remove(&id);
            self.record(id, body, option);
        }
        self.warnings.extend(warnings);
        return;
    }

    /// Record one anchor occurrence.
    ///
    /// An occurrence with a body replaces any earlier record for `id`. A
    /// flag-only occurrence changes just the option, so an earlier body is
    /// still appended or used as the replacement. A flag-only `-r` drops the
    /// earlier body and records a `BodyDiscarded` warning.
    pub fn record(&mut self, id: AnchorId, body: Option<String>, option: Option<AnchorOption>) {
        if let Some(text) = body {
            self.bodies.insert(id.clone(), text);
            match option {
                Some(o) => self.options.insert(id, o),
                None => self.options.remove(&id),
            };
            return;
        }

        let Some(flag) = option else { return };
        if flag == AnchorOption::Remove && self.bodies.remove(&id).is_some() {
            self.warnings.push(Error::BodyDiscarded { id: id.clone() });
        }
        self.options.insert(id, flag);
        return;
    }
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc, reason = "tests")]
mod tests {
    use super::*;

    fn id(path: &str) -> AnchorId {
        return AnchorId::new(path).unwrap();
    }

    #[test]
    fn parses_bare_and_bracketed_references() {
        assert_eq!(AnchorId::parse_reference("Foo.Bar").unwrap(), id("Foo.Bar"));
        assert_eq!(AnchorId::parse_reference(" [Anchor.Foo.Bar] ").unwrap(), id("Foo.Bar"));
        assert!(AnchorId::parse_reference("").is_err());
        assert!(AnchorId::parse_reference("[Anchor.]").is_err());
    }

    #[test]
    fn tag_round_trips_through_display() {
        let anchor = id("Net.Retry");
        assert_eq!(anchor.tag(), "[Anchor.Net.Retry]");
        assert_eq!(anchor.to_string(), "Net.Retry");
    }

    #[test]
    fn merge_is_last_wins_per_identifier() {
        let mut first = Extraction::default();
        first.record(id("A"), Some("one\n".to_string()), Some(AnchorOption::Update));
        first.record(id("B"), Some("keep\n".to_string()), None);

        let mut second = Extraction::default();
        second.record(id("A"), Some("two\n".to_string()), None);

        first.merge(second);
        assert_eq!(first.bodies.get(&id("A")).map(String::as_str), Some("two\n"));
        assert!(!first.options.contains_key(&id("A")), "stale option survived merge");
        assert_eq!(first.bodies.get(&id("B")).map(String::as_str), Some("keep\n"));
    }

    #[test]
    fn flag_only_occurrence_keeps_earlier_body() {
        let mut extraction = Extraction::default();
        extraction.record(id("X"), Some("precious\n".to_string()), None);
        extraction.record(id("X"), None, Some(AnchorOption::Append));
        assert_eq!(extraction.bodies.get(&id("X")).map(String::as_str), Some("precious\n"));
        assert_eq!(extraction.options.get(&id("X")), Some(&AnchorOption::Append));
        assert!(extraction.warnings.is_empty());

        extraction.record(id("X"), None, Some(AnchorOption::Update));
        assert_eq!(extraction.bodies.get(&id("X")).map(String::as_str), Some("precious\n"));
    }

    #[test]
    fn flag_only_remove_drops_body_with_warning() {
        let mut earlier = Extraction::default();
        earlier.record(id("X"), Some("gone\n".to_string()), None);

        let mut later = Extraction::default();
        later.record(id("X"), None, Some(AnchorOption::Remove));

        earlier.merge(later);
        assert!(!earlier.bodies.contains_key(&id("X")));
        assert_eq!(earlier.options.get(&id("X")), Some(&AnchorOption::Remove));
        assert!(matches!(earlier.warnings.first(), Some(Error::BodyDiscarded { .. })));
    }

    #[test]
    fn merge_keeps_body_when_later_file_has_only_a_flag() {
        let mut first = Extraction::default();
        first.record(id("X"), Some("v2\n".to_string()), None);

        let mut second = Extraction::default();
        second.record(id("X"), None, Some(AnchorOption::Update));

        first.merge(second);
        assert_eq!(first.bodies.get(&id("X")).map(String::as_str), Some("v2\n"));
        assert_eq!(first.options.get(&id("X")), Some(&AnchorOption::Update));
    }

    #[test]
    fn unknown_flags_are_preserved() {
        assert_eq!(AnchorOption::from_flag("x"), AnchorOption::Unknown("x".to_string()));
        assert_eq!(AnchorOption::from_flag(""), AnchorOption::Unknown(String::new()));
    }
}
