//! Workspace provisioning lifecycle against a real git repository.
//!
//! Covers idempotent creation, recovery from an interrupted prior
//! provisioning, conflict detection, and tolerant teardown.

use std::fs;
use std::time::Duration;

use saga::io::config::SagaConfig;
use saga::io::git::Git;
use saga::io::paths::SagaPaths;
use saga::test_support::{TestRepo, write_epic, write_story};
use saga::workspace::{ProvisionError, branch_name, create_worktree, remove_worktree};

fn git(repo: &TestRepo) -> Git {
    Git::new(repo.root(), Duration::from_secs(30), 100_000)
}

fn fixture() -> TestRepo {
    let repo = TestRepo::new().expect("repo");
    write_epic(repo.root(), "billing", "Billing");
    write_story(repo.root(), "billing", "add-invoice", "Add invoice");
    repo
}

#[test]
fn create_provisions_branch_and_worktree() {
    let repo = fixture();
    let config = SagaConfig::default();

    let outcome =
        create_worktree(repo.root(), "billing", "add-invoice", &config).expect("create");
    assert!(outcome.created);
    assert_eq!(outcome.workspace.branch, "story-add-invoice-epic-billing");
    assert!(outcome.workspace.worktree_path.is_dir());
    assert!(
        git(&repo)
            .branch_exists("story-add-invoice-epic-billing")
            .expect("branch check")
    );
    // The worktree is a checkout of the repo, so committed files appear in it.
    assert!(outcome.workspace.worktree_path.join("README.md").is_file());
}

#[test]
fn create_twice_is_idempotent() {
    let repo = fixture();
    let config = SagaConfig::default();

    let first = create_worktree(repo.root(), "billing", "add-invoice", &config).expect("create");
    let second =
        create_worktree(repo.root(), "billing", "add-invoice", &config).expect("re-create");

    assert!(first.created);
    assert!(!second.created);
    assert_eq!(first.workspace, second.workspace);
    // The second call performed no destructive action: files survive.
    assert!(second.workspace.worktree_path.join("README.md").is_file());
}

#[test]
fn create_recovers_when_branch_exists_without_worktree() {
    let repo = fixture();
    let config = SagaConfig::default();
    let branch = branch_name("billing", "add-invoice");

    // Simulate an interrupted prior provisioning: branch created, no worktree.
    git(&repo).create_branch(&branch, "HEAD").expect("branch");

    let outcome =
        create_worktree(repo.root(), "billing", "add-invoice", &config).expect("recover");
    assert!(outcome.created);
    assert!(outcome.workspace.worktree_path.is_dir());
}

#[test]
fn create_conflicts_on_unregistered_directory() {
    let repo = fixture();
    let config = SagaConfig::default();
    let paths = SagaPaths::new(repo.root());
    fs::create_dir_all(paths.worktree_dir("billing", "add-invoice")).expect("mkdir");

    let err = create_worktree(repo.root(), "billing", "add-invoice", &config)
        .expect_err("should conflict");
    assert!(matches!(err, ProvisionError::Conflict { .. }));
    // The conflicting directory is left untouched.
    assert!(paths.worktree_dir("billing", "add-invoice").is_dir());
}

#[test]
fn remove_tears_down_branch_and_worktree() {
    let repo = fixture();
    let config = SagaConfig::default();
    let branch = branch_name("billing", "add-invoice");

    let outcome = create_worktree(repo.root(), "billing", "add-invoice", &config).expect("create");
    remove_worktree(repo.root(), "billing", "add-invoice", &config).expect("remove");

    assert!(!outcome.workspace.worktree_path.exists());
    assert!(!git(&repo).branch_exists(&branch).expect("branch check"));
}

#[test]
fn remove_is_a_noop_on_an_already_removed_workspace() {
    let repo = fixture();
    let config = SagaConfig::default();

    create_worktree(repo.root(), "billing", "add-invoice", &config).expect("create");
    remove_worktree(repo.root(), "billing", "add-invoice", &config).expect("remove");
    remove_worktree(repo.root(), "billing", "add-invoice", &config).expect("second remove");
}

#[test]
fn remove_never_ran_is_also_a_noop() {
    let repo = fixture();
    let config = SagaConfig::default();
    remove_worktree(repo.root(), "billing", "add-invoice", &config).expect("remove");
}
