use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

fn anchor(root: &Path, args: &[&str]) -> Output {
    return Command::new(env!("CARGO_BIN_EXE_anchor"))
        .current_dir(root)
        .args(args)
        .output()
        .unwrap();
}

fn assert_ok(output: &Output, what: &str) {
    assert!(
        output.status.success(),
        "{what} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

fn stdout(output: &Output) -> String {
    return String::from_utf8_lossy(&output.stdout).into_owned();
}

/// A temp project with `src/` as the tracked tree, already initialized.
fn project(storage: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    std::fs::create_dir_all(&src).unwrap();
    let init = anchor(dir.path(), &["init", "src", "--storage", storage]);
    assert_ok(&init, "init");
    return (dir, src);
}

#[test]
fn save_then_read_round_trip() {
    let (dir, src) = project("files");
    let file = src.join("Transaction.java");
    std::fs::write(&file, "// [Anchor.Foo.Bar] -u\n/* hello\nworld */\nclass Transaction {}\n").unwrap();

    assert_ok(&anchor(dir.path(), &["save"]), "save");
    assert_eq!(
        std::fs::read_to_string(&file).unwrap(),
        "// [Anchor.Foo.Bar]\nclass Transaction {}\n"
    );

    let read = anchor(dir.path(), &["read", "Foo.Bar"]);
    assert_ok(&read, "read");
    assert_eq!(stdout(&read), "hello\nworld\n");

    let bracketed = anchor(dir.path(), &["read", "[Anchor.Foo.Bar]"]);
    assert_eq!(stdout(&bracketed), "hello\nworld\n");
}

#[test]
fn second_update_replaces_and_append_accumulates() {
    for storage in ["files", "indexed"] {
        let (dir, src) = project(storage);
        let file = src.join("A.java");

        std::fs::write(&file, "// [Anchor.Note] -u\n/*\nfirst\n*/\n").unwrap();
        assert_ok(&anchor(dir.path(), &["save"]), "first save");
        std::fs::write(&file, "// [Anchor.Note] -u\n/*\nsecond\n*/\n").unwrap();
        assert_ok(&anchor(dir.path(), &["save"]), "second save");
        assert_eq!(stdout(&anchor(dir.path(), &["read", "Note"])), "second\n", "{storage}");

        std::fs::write(&file, "// [Anchor.Note] -a\n/*\nthird\n*/\n").unwrap();
        assert_ok(&anchor(dir.path(), &["save"]), "third save");
        assert_eq!(stdout(&anchor(dir.path(), &["read", "Note"])), "second\nthird\n", "{storage}");
    }
}

#[test]
fn remove_flag_deletes_stored_comment() {
    let (dir, src) = project("files");
    let file = src.join("A.java");
    std::fs::write(&file, "// [Anchor.Gone]\n/* bye */\n").unwrap();
    assert_ok(&anchor(dir.path(), &["save"]), "save");

    std::fs::write(&file, "// [Anchor.Gone] -r\nint x;\n").unwrap();
    assert_ok(&anchor(dir.path(), &["save"]), "remove save");
    assert_eq!(std::fs::read_to_string(&file).unwrap(), "// [Anchor.Gone]\nint x;\n");

    let read = anchor(dir.path(), &["read", "Gone"]);
    assert!(!read.status.success(), "read of removed anchor should fail");
}

#[test]
fn invalid_option_keeps_body_in_source() {
    let (dir, src) = project("files");
    let file = src.join("A.java");
    std::fs::write(&file, "// [Anchor.Bad] -xyz\n/*\nstays\n*/\n").unwrap();

    let save = anchor(dir.path(), &["save"]);
    assert_ok(&save, "save");
    assert!(String::from_utf8_lossy(&save.stderr).contains("warning:"));
    assert_eq!(std::fs::read_to_string(&file).unwrap(), "// [Anchor.Bad]\n/*\nstays\n*/\n");
    assert!(!anchor(dir.path(), &["read", "Bad"]).status.success());
}

#[test]
fn unknown_flag_leaves_comment_in_source() {
    let (dir, src) = project("files");
    let file = src.join("A.java");
    std::fs::write(&file, "// [Anchor.Lost] -x\n/*\nprecious\n*/\nint x;\n").unwrap();

    let save = anchor(dir.path(), &["save"]);
    assert_ok(&save, "save");
    assert!(String::from_utf8_lossy(&save.stderr).contains("warning:"));
    assert_eq!(
        std::fs::read_to_string(&file).unwrap(),
        "// [Anchor.Lost]\n/*\nprecious\n*/\nint x;\n"
    );
    assert!(!anchor(dir.path(), &["read", "Lost"]).status.success());
}

#[test]
fn later_flag_only_tag_keeps_extracted_body() {
    for storage in ["files", "indexed"] {
        let (dir, src) = project(storage);
        let file = src.join("A.java");
        std::fs::write(&file, "// [Anchor.X]\n/*\nprecious\n*/\nint x;\n// [Anchor.X] -a\nint y;\n").unwrap();

        assert_ok(&anchor(dir.path(), &["save"]), "save");
        assert_eq!(
            std::fs::read_to_string(&file).unwrap(),
            "// [Anchor.X]\nint x;\n// [Anchor.X]\nint y;\n"
        );
        assert_eq!(stdout(&anchor(dir.path(), &["read", "X"])), "precious\n", "{storage}");
    }
}

#[test]
fn code_that_mentions_a_tag_is_not_rewritten() {
    let (dir, src) = project("files");
    let file = src.join("A.java");
    let content = "log(\"[Anchor.X] missing\");\nint y;\n";
    std::fs::write(&file, content).unwrap();

    assert_ok(&anchor(dir.path(), &["save"]), "save");
    assert_eq!(std::fs::read_to_string(&file).unwrap(), content);
}

#[test]
fn bare_update_flag_applies_only_once() {
    let (dir, src) = project("files");
    let a = src.join("A.java");
    let b = src.join("B.java");
    std::fs::write(&a, "// [Anchor.X] -u\nint a;\n").unwrap();
    std::fs::write(&b, "// [Anchor.X]\n/*\nv2\n*/\n").unwrap();

    assert_ok(&anchor(dir.path(), &["save"]), "first save");
    assert_eq!(std::fs::read_to_string(&a).unwrap(), "// [Anchor.X]\nint a;\n");
    assert_eq!(stdout(&anchor(dir.path(), &["read", "X"])), "v2\n");

    assert_ok(&anchor(dir.path(), &["save"]), "second save");
    assert_eq!(stdout(&anchor(dir.path(), &["read", "X"])), "v2\n");
}

#[test]
fn save_single_explicit_file_ignores_extension_filter() {
    let (dir, src) = project("files");
    let notes = src.join("notes.txt");
    let other = src.join("Other.java");
    std::fs::write(&notes, "// [Anchor.Txt]\n/* from txt */\n").unwrap();
    std::fs::write(&other, "// [Anchor.Java]\n/* untouched */\n").unwrap();

    assert_ok(&anchor(dir.path(), &["save", "src/notes.txt"]), "save");
    assert_eq!(stdout(&anchor(dir.path(), &["read", "Txt"])), "from txt\n");
    assert_eq!(std::fs::read_to_string(&other).unwrap(), "// [Anchor.Java]\n/* untouched */\n");
}

#[test]
fn list_json_reports_storage_and_ids() {
    let (dir, src) = project("indexed");
    std::fs::write(src.join("A.java"), "// [Anchor.B]\n/* b */\n// [Anchor.A]\n/* a */\n").unwrap();
    assert_ok(&anchor(dir.path(), &["save"]), "save");

    let list = anchor(dir.path(), &["list", "--json"]);
    assert_ok(&list, "list");
    let value: serde_json::Value = serde_json::from_str(&stdout(&list)).unwrap();
    assert_eq!(value["storage"], "indexed");
    assert_eq!(value["anchors"], serde_json::json!(["A", "B"]));
}

#[test]
fn compact_reclaims_removed_segments() {
    let (dir, src) = project("indexed");
    let file = src.join("A.java");
    std::fs::write(&file, "// [Anchor.K]\n/*\nv1\n*/\n").unwrap();
    assert_ok(&anchor(dir.path(), &["save"]), "save");
    std::fs::write(&file, "// [Anchor.K] -u\n/*\nv2\n*/\n").unwrap();
    assert_ok(&anchor(dir.path(), &["save"]), "update");

    assert_ok(&anchor(dir.path(), &["compact"]), "compact");
    let data = std::fs::read_to_string(dir.path().join(".anchor/data.txt")).unwrap();
    assert_eq!(data, "[Anchor.K]\nv2\n");
    assert_eq!(stdout(&anchor(dir.path(), &["read", "K"])), "v2\n");
}

#[test]
fn reinit_and_uninitialized_commands_fail() {
    let (dir, _src) = project("files");
    assert!(!anchor(dir.path(), &["init", "src"]).status.success());

    let bare = tempfile::tempdir().unwrap();
    let save = anchor(bare.path(), &["save"]);
    assert!(!save.status.success());
    assert!(String::from_utf8_lossy(&save.stderr).contains("Not Initialized"));
}
