//! CLI tests for `saga check-path`.
//!
//! Spawns the saga binary and verifies exit codes match the hook protocol:
//! 0 for allowed operations, 2 for scope violations.

use std::fs;
use std::path::Path;
use std::process::Command;

use saga::exit_codes;
use saga::test_support::{write_epic, write_story};

fn check_path(root: &Path, file: &str, op: &str) -> i32 {
    let status = Command::new(env!("CARGO_BIN_EXE_saga"))
        .current_dir(root)
        .args([
            "check-path",
            file,
            "--epic",
            "billing",
            "--story",
            "add-invoice",
            "--op",
            op,
        ])
        .status()
        .expect("saga check-path");
    status.code().expect("exit code")
}

fn fixture() -> tempfile::TempDir {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path();
    write_epic(root, "billing", "Billing");
    write_story(root, "billing", "add-invoice", "Add invoice");
    write_story(root, "billing", "other-story", "Other");
    fs::create_dir_all(root.join(".saga/worktrees/billing/add-invoice/src")).expect("mkdir");
    temp
}

#[test]
fn write_inside_worktree_is_allowed() {
    let temp = fixture();
    assert_eq!(
        check_path(
            temp.path(),
            ".saga/worktrees/billing/add-invoice/src/main.rs",
            "write"
        ),
        exit_codes::OK
    );
}

#[test]
fn foreign_story_write_exits_blocked() {
    let temp = fixture();
    assert_eq!(
        check_path(
            temp.path(),
            ".saga/stories/billing/other-story/notes.md",
            "write"
        ),
        exit_codes::BLOCKED
    );
}

#[test]
fn read_of_shared_context_is_allowed() {
    let temp = fixture();
    fs::write(temp.path().join("README.md"), "shared\n").expect("write");
    assert_eq!(check_path(temp.path(), "README.md", "read"), exit_codes::OK);
}

#[test]
fn missing_worktree_is_invalid_not_blocked() {
    let temp = tempfile::tempdir().expect("tempdir");
    write_epic(temp.path(), "billing", "Billing");
    write_story(temp.path(), "billing", "add-invoice", "Add invoice");
    assert_eq!(
        check_path(temp.path(), "README.md", "read"),
        exit_codes::INVALID
    );
}
