//! Git adapter for workspace provisioning.
//!
//! The provisioner shells out for branch and worktree manipulation, so we keep
//! a small, explicit wrapper around `git` subprocess calls. Every invocation
//! runs under a bounded timeout; a hung command is surfaced as an error, never
//! left to block the coordinating process.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::io::process::{CommandOutput, run_with_timeout};

/// Failures of a single git invocation, as structured results.
#[derive(Debug, Error)]
pub enum GitError {
    #[error("git {command} timed out after {timeout_secs}s")]
    Timeout { command: String, timeout_secs: u64 },
    #[error("git {command} failed: {stderr}")]
    Command { command: String, stderr: String },
    #[error("git {command}: {message}")]
    Spawn { command: String, message: String },
}

/// One entry of `git worktree list --porcelain`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorktreeEntry {
    pub path: PathBuf,
    /// Branch name without the `refs/heads/` prefix; `None` when detached.
    pub branch: Option<String>,
}

/// Wrapper for executing git commands in a working directory.
#[derive(Debug, Clone)]
pub struct Git {
    workdir: PathBuf,
    timeout: Duration,
    output_limit_bytes: usize,
}

impl Git {
    pub fn new(workdir: impl Into<PathBuf>, timeout: Duration, output_limit_bytes: usize) -> Self {
        Self {
            workdir: workdir.into(),
            timeout,
            output_limit_bytes,
        }
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Check whether a local branch exists.
    pub fn branch_exists(&self, branch: &str) -> Result<bool, GitError> {
        let out = self.run(&[
            "show-ref",
            "--verify",
            "--quiet",
            &format!("refs/heads/{branch}"),
        ])?;
        Ok(out.status.success())
    }

    /// Create a branch at `base` without checking it out.
    #[instrument(skip_all, fields(branch, base))]
    pub fn create_branch(&self, branch: &str, base: &str) -> Result<(), GitError> {
        debug!(branch, base, "creating branch");
        self.run_checked(&["branch", branch, base])?;
        Ok(())
    }

    /// Delete a local branch, including unmerged ones.
    #[instrument(skip_all, fields(branch))]
    pub fn delete_branch(&self, branch: &str) -> Result<(), GitError> {
        debug!(branch, "deleting branch");
        self.run_checked(&["branch", "-D", branch])?;
        Ok(())
    }

    /// Ref to base new story branches on: the remote default branch when one
    /// is known, else the current `HEAD`.
    pub fn default_base(&self) -> Result<String, GitError> {
        let out = self.run(&["symbolic-ref", "refs/remotes/origin/HEAD"])?;
        if out.status.success() {
            let full = out.stdout_text().trim().to_string();
            if let Some(name) = full.strip_prefix("refs/remotes/") {
                return Ok(name.to_string());
            }
        }
        Ok("HEAD".to_string())
    }

    /// Attach an existing branch to a new worktree at `path`.
    #[instrument(skip_all, fields(branch, path = %path.display()))]
    pub fn worktree_add(&self, path: &Path, branch: &str) -> Result<(), GitError> {
        debug!("attaching branch to new worktree");
        self.run_checked(&["worktree", "add", &path.to_string_lossy(), branch])?;
        Ok(())
    }

    /// Create branch and worktree in one command (no half-state on failure).
    #[instrument(skip_all, fields(branch, base, path = %path.display()))]
    pub fn worktree_add_new_branch(
        &self,
        path: &Path,
        branch: &str,
        base: &str,
    ) -> Result<(), GitError> {
        debug!("creating branch and worktree");
        self.run_checked(&[
            "worktree",
            "add",
            "-b",
            branch,
            &path.to_string_lossy(),
            base,
        ])?;
        Ok(())
    }

    /// Remove a worktree checkout and its registration.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn worktree_remove(&self, path: &Path) -> Result<(), GitError> {
        debug!("removing worktree");
        self.run_checked(&["worktree", "remove", "--force", &path.to_string_lossy()])?;
        Ok(())
    }

    /// Drop stale worktree registrations whose directories are gone.
    pub fn worktree_prune(&self) -> Result<(), GitError> {
        self.run_checked(&["worktree", "prune"])?;
        Ok(())
    }

    /// List registered worktrees with their checked-out branches.
    pub fn worktree_list(&self) -> Result<Vec<WorktreeEntry>, GitError> {
        let out = self.run_capture(&["worktree", "list", "--porcelain"])?;
        Ok(parse_worktree_list(&out))
    }

    fn run_capture(&self, args: &[&str]) -> Result<String, GitError> {
        let out = self.run_checked(args)?;
        Ok(out.stdout_text())
    }

    fn run_checked(&self, args: &[&str]) -> Result<CommandOutput, GitError> {
        let out = self.run(args)?;
        if !out.status.success() {
            let stderr = out.stderr_text().trim().to_string();
            warn!(command = %args.join(" "), %stderr, "git command failed");
            return Err(GitError::Command {
                command: args.join(" "),
                stderr,
            });
        }
        Ok(out)
    }

    fn run(&self, args: &[&str]) -> Result<CommandOutput, GitError> {
        let command = args.join(" ");
        let mut cmd = Command::new("git");
        cmd.args(args).current_dir(&self.workdir);
        let out = run_with_timeout(cmd, self.timeout, self.output_limit_bytes).map_err(
            |err| GitError::Spawn {
                command: command.clone(),
                message: format!("{err:#}"),
            },
        )?;
        if out.timed_out {
            return Err(GitError::Timeout {
                command,
                timeout_secs: self.timeout.as_secs(),
            });
        }
        Ok(out)
    }
}

fn parse_worktree_list(porcelain: &str) -> Vec<WorktreeEntry> {
    let mut entries = Vec::new();
    let mut path: Option<PathBuf> = None;
    let mut branch: Option<String> = None;

    for line in porcelain.lines().chain(std::iter::once("")) {
        if line.is_empty() {
            if let Some(path) = path.take() {
                entries.push(WorktreeEntry {
                    path,
                    branch: branch.take(),
                });
            }
            branch = None;
            continue;
        }
        if let Some(p) = line.strip_prefix("worktree ") {
            path = Some(PathBuf::from(p));
        } else if let Some(b) = line.strip_prefix("branch ") {
            branch = Some(
                b.strip_prefix("refs/heads/")
                    .unwrap_or(b)
                    .to_string(),
            );
        }
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_worktree_list_porcelain() {
        let porcelain = "worktree /proj\nHEAD 1234abcd\nbranch refs/heads/main\n\nworktree /proj/.saga/worktrees/billing/add-invoice\nHEAD 5678ef00\nbranch refs/heads/story-add-invoice-epic-billing\n\nworktree /proj/detached-wt\nHEAD 9999aaaa\ndetached\n";
        let entries = parse_worktree_list(porcelain);
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].branch.as_deref(), Some("main"));
        assert_eq!(
            entries[1],
            WorktreeEntry {
                path: PathBuf::from("/proj/.saga/worktrees/billing/add-invoice"),
                branch: Some("story-add-invoice-epic-billing".to_string()),
            }
        );
        assert_eq!(entries[2].branch, None);
    }

    #[test]
    fn parses_empty_porcelain() {
        assert!(parse_worktree_list("").is_empty());
    }
}
