//! Workspace provisioning: the branch + worktree pair backing a story.
//!
//! Provisioning is idempotent and recovers from interrupted prior runs. Branch
//! and worktree are created by a single `git worktree add -b`, so there is no
//! observable half-state on the create path; the one recoverable half-state
//! (branch exists, directory gone) is re-attached rather than failed.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::io::config::SagaConfig;
use crate::io::git::{Git, GitError};
use crate::io::paths::SagaPaths;
use crate::model::Workspace;

/// Deterministic branch name for a story's workspace.
pub fn branch_name(epic_slug: &str, story_slug: &str) -> String {
    format!("story-{story_slug}-epic-{epic_slug}")
}

/// Provisioning failures, as structured results (never uncaught faults: the
/// provisioner is consulted inline by an automated control loop).
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// The target exists in an inconsistent state; requires operator
    /// intervention rather than a silent overwrite.
    #[error("workspace conflict: {message}")]
    Conflict { message: String },
    /// An external git command hung past the configured bound. Callers may
    /// retry once before surfacing.
    #[error("git {command} timed out")]
    Timeout { command: String },
    /// A git command failed; its stderr is surfaced as text.
    #[error("git {command} failed: {error}")]
    Git { command: String, error: String },
    #[error("{message}")]
    Io { message: String },
}

impl From<GitError> for ProvisionError {
    fn from(err: GitError) -> Self {
        match err {
            GitError::Timeout { command, .. } => ProvisionError::Timeout { command },
            GitError::Command { command, stderr } => ProvisionError::Git {
                command,
                error: stderr,
            },
            GitError::Spawn { command, message } => ProvisionError::Git {
                command,
                error: message,
            },
        }
    }
}

/// Successful provisioning result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceOutcome {
    pub workspace: Workspace,
    /// False when the workspace already existed and was reused as-is.
    pub created: bool,
}

/// Create (or reuse) the workspace for a story.
#[instrument(skip_all, fields(epic = epic_slug, story = story_slug))]
pub fn create_worktree(
    root: &Path,
    epic_slug: &str,
    story_slug: &str,
    config: &SagaConfig,
) -> Result<WorkspaceOutcome, ProvisionError> {
    // Work from the canonical root so derived paths compare equal to the
    // canonical paths git reports for registered worktrees.
    let root = canonical_or_raw(root);
    let paths = SagaPaths::new(&root);
    if !paths.saga_dir.is_dir() {
        return Err(ProvisionError::Io {
            message: format!("no .saga directory under {}", root.display()),
        });
    }

    let branch = branch_name(epic_slug, story_slug);
    let worktree_path = paths.worktree_dir(epic_slug, story_slug);
    let git = Git::new(root, config.git_timeout(), config.git_output_limit_bytes);

    let branch_exists = git.branch_exists(&branch)?;
    let registered = git.worktree_list()?;
    let at_path = registered.iter().find(|e| same_path(&e.path, &worktree_path));

    if worktree_path.exists() {
        return match at_path {
            Some(entry) if entry.branch.as_deref() == Some(branch.as_str()) => {
                debug!(branch = %branch, "workspace already provisioned");
                Ok(WorkspaceOutcome {
                    workspace: Workspace {
                        branch,
                        worktree_path,
                    },
                    created: false,
                })
            }
            Some(entry) => Err(ProvisionError::Conflict {
                message: format!(
                    "worktree at {} is checked out to {}, expected {branch}",
                    worktree_path.display(),
                    entry.branch.as_deref().unwrap_or("a detached HEAD"),
                ),
            }),
            None => Err(ProvisionError::Conflict {
                message: format!(
                    "{} exists but is not a registered worktree for {branch}",
                    worktree_path.display()
                ),
            }),
        };
    }

    // The directory is gone; a registration pointing at it is stale.
    if at_path.is_some() {
        git.worktree_prune()?;
    }
    if let Some(elsewhere) = registered
        .iter()
        .find(|e| e.branch.as_deref() == Some(branch.as_str()))
        && !same_path(&elsewhere.path, &worktree_path)
    {
        return Err(ProvisionError::Conflict {
            message: format!(
                "branch {branch} is already checked out at {}",
                elsewhere.path.display()
            ),
        });
    }

    create_parent(&worktree_path)?;
    if branch_exists {
        // Interrupted prior provisioning: attach the surviving branch.
        info!(branch = %branch, "recovering branch without worktree");
        git.worktree_add(&worktree_path, &branch)?;
    } else {
        let base = git.default_base()?;
        info!(branch = %branch, base = %base, "provisioning new workspace");
        git.worktree_add_new_branch(&worktree_path, &branch, &base)?;
    }

    Ok(WorkspaceOutcome {
        workspace: Workspace {
            branch,
            worktree_path,
        },
        created: true,
    })
}

/// Tear down a story's workspace. Safe to call when it is already gone.
#[instrument(skip_all, fields(epic = epic_slug, story = story_slug))]
pub fn remove_worktree(
    root: &Path,
    epic_slug: &str,
    story_slug: &str,
    config: &SagaConfig,
) -> Result<(), ProvisionError> {
    let root = canonical_or_raw(root);
    let paths = SagaPaths::new(&root);
    let branch = branch_name(epic_slug, story_slug);
    let worktree_path = paths.worktree_dir(epic_slug, story_slug);
    let git = Git::new(root, config.git_timeout(), config.git_output_limit_bytes);

    let registered = git.worktree_list()?;
    let registration = registered
        .iter()
        .find(|e| same_path(&e.path, &worktree_path));

    match registration {
        Some(entry) => {
            git.worktree_remove(&entry.path)?;
        }
        None if worktree_path.exists() => {
            return Err(ProvisionError::Conflict {
                message: format!(
                    "{} exists but is not a registered worktree; refusing to delete it",
                    worktree_path.display()
                ),
            });
        }
        None => debug!("worktree already removed"),
    }

    git.worktree_prune()?;
    if git.branch_exists(&branch)? {
        git.delete_branch(&branch)?;
    }
    Ok(())
}

fn create_parent(worktree_path: &Path) -> Result<(), ProvisionError> {
    let Some(parent) = worktree_path.parent() else {
        return Ok(());
    };
    fs::create_dir_all(parent).map_err(|err| ProvisionError::Io {
        message: format!("create {}: {err}", parent.display()),
    })
}

/// Compare paths after symlink resolution where possible; registered worktree
/// paths come back canonical from git while ours are derived literally.
fn same_path(a: &Path, b: &Path) -> bool {
    canonical_or_raw(a) == canonical_or_raw(b)
}

fn canonical_or_raw(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn branch_name_is_deterministic() {
        assert_eq!(
            branch_name("billing", "add-invoice"),
            "story-add-invoice-epic-billing"
        );
    }

    #[test]
    fn git_timeouts_map_to_provision_timeouts() {
        let err = ProvisionError::from(GitError::Timeout {
            command: "worktree add".to_string(),
            timeout_secs: 60,
        });
        assert!(matches!(err, ProvisionError::Timeout { .. }));
    }
}
