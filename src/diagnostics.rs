use crate::error::Error;

const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Render an error as valid markdown with bold headings and print to stderr.
pub fn print_error(e: &Error) {
    let md = render_error(e);
    for line in md.lines() {
        if line.starts_with('#') {
            eprintln!("{BOLD}{line}{RESET}");
        } else {
            eprintln!("{line}");
        }
    }
}

/// Print a recovered problem as a single warning line on stderr.
pub fn print_warning(e: &Error) {
    eprintln!("warning: {e}");
}

/// Render a fatal error as a structured markdown diagnostic:
/// what happened, and the command that fixes it when there is one.
pub fn render_error(e: &Error) -> String {
    match e {
        Error::AlreadyInitialized { path } => format!("\
# Error: Already Initialized

`{}` already exists. This directory is tracked.
", path.display()),

        Error::NotInitialized { .. } => "\
# Error: Not Initialized

This directory has no `.anchor` store.

## Fix

    anchor init <TARGET_DIR>
"
        .to_string(),

        Error::NotFound { id } => format!("\
# Error: Anchor Not Found

Nothing is stored for `{}`.

## Fix

List what is stored:

    anchor list
", id.tag()),

        Error::ConfigParse { line, reason } => render_config_parse(*line, reason),

        Error::StoreCorrupt { reason } => format!("\
# Error: Store Corrupt

{reason}

## Fix

Rebuild the data file from the index:

    anchor compact
"),

        Error::PathNotFound { path } => format!("\
# Error: Path Not Found

`{}` does not exist.
", path.display()),

        Error::NotADirectory { path } => format!("\
# Error: Not A Directory

`{}` is not a directory.
", path.display()),

        Error::Io(err) => format!("\
# Error: I/O

{err}
"),

        _ => format!("\
# Error

{e}
"),
    }
}

fn render_config_parse(line: usize, reason: &str) -> String {
    let location = if line == 0 {
        String::new()
    } else {
        format!(" (line {line})")
    };
    format!(
        "\
# Error: Invalid Config

`.anchor/config`{location}: {reason}

## Expected format

    targetDir=/absolute/path/to/source
    targetExtension=java
    storage=files
"
    )
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc, reason = "tests")]
mod tests {
    use super::*;
    use crate::types::AnchorId;

    #[test]
    fn not_found_suggests_listing() {
        let md = render_error(&Error::NotFound {
            id: AnchorId::new("Foo.Bar").unwrap(),
        });
        assert!(md.starts_with("# Error: Anchor Not Found"));
        assert!(md.contains("`[Anchor.Foo.Bar]`"));
        assert!(md.contains("anchor list"));
    }

    #[test]
    fn missing_key_omits_line_number() {
        let md = render_error(&Error::ConfigParse {
            line: 0,
            reason: "missing required key `targetDir`".to_string(),
        });
        assert!(md.contains("`.anchor/config`: missing required key"));
    }
}
