//! Scope containment rules over canonical paths.
//!
//! The rules are pure: callers canonicalize the requested path first (symlink
//! resolution lives in the orchestration layer), so every comparison here is a
//! component-wise prefix test between absolute paths.

use std::path::{Path, PathBuf};

use crate::core::types::{Access, DenyReason, FileOperation};

/// The filesystem scope assigned to one story's agent session.
///
/// Runtime-only: reconstructed per session from the story and its workspace,
/// never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeBoundary {
    pub epic_slug: String,
    pub story_slug: String,
    /// Canonical project root (the directory holding `.saga/`).
    pub project_root: PathBuf,
    /// Canonical root of the worktree assigned to the story.
    pub workspace_root: PathBuf,
    /// Canonical archive roots: the main tree's and the worktree checkout's.
    pub archive_roots: Vec<PathBuf>,
    /// Canonical story directories belonging to every *other* story.
    pub foreign_story_dirs: Vec<PathBuf>,
}

impl ScopeBoundary {
    /// `.saga/` inside the worktree checkout is read-only metadata during
    /// execution, with one exception: the bound story's own journal.
    pub fn metadata_root(&self) -> PathBuf {
        self.workspace_root.join(".saga")
    }

    pub fn journal_exception(&self) -> PathBuf {
        self.metadata_root()
            .join("stories")
            .join(&self.epic_slug)
            .join(&self.story_slug)
            .join("journal.md")
    }
}

/// Decide whether `canonical` may be touched under `boundary`.
///
/// Forbidden prefixes are checked before containment so that a cross-story or
/// archive touch reports its specific reason rather than `outside-worktree`.
pub fn evaluate(boundary: &ScopeBoundary, canonical: &Path, operation: FileOperation) -> Access {
    if boundary
        .archive_roots
        .iter()
        .any(|root| canonical.starts_with(root))
    {
        return denied(DenyReason::ArchiveAccessDenied);
    }
    if boundary
        .foreign_story_dirs
        .iter()
        .any(|dir| canonical.starts_with(dir))
    {
        return denied(DenyReason::ForeignStoryAccessDenied);
    }

    match operation {
        // Reads range over the whole project root: isolation protects against
        // cross-story write interference, not against consulting shared
        // reference material.
        FileOperation::Read => {
            if canonical.starts_with(&boundary.project_root) {
                Access::Allowed
            } else {
                denied(DenyReason::OutsideWorktree)
            }
        }
        FileOperation::Write => {
            if !canonical.starts_with(&boundary.workspace_root) {
                return denied(DenyReason::OutsideWorktree);
            }
            if canonical.starts_with(boundary.metadata_root())
                && canonical != boundary.journal_exception()
            {
                return denied(DenyReason::ProtectedMetadata);
            }
            Access::Allowed
        }
    }
}

fn denied(reason: DenyReason) -> Access {
    Access::Denied { reason }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boundary() -> ScopeBoundary {
        ScopeBoundary {
            epic_slug: "billing".to_string(),
            story_slug: "add-invoice".to_string(),
            project_root: PathBuf::from("/proj"),
            workspace_root: PathBuf::from("/proj/.saga/worktrees/billing/add-invoice"),
            archive_roots: vec![
                PathBuf::from("/proj/.saga/archive"),
                PathBuf::from("/proj/.saga/worktrees/billing/add-invoice/.saga/archive"),
            ],
            foreign_story_dirs: vec![
                PathBuf::from("/proj/.saga/stories/billing/other-story"),
                PathBuf::from(
                    "/proj/.saga/worktrees/billing/add-invoice/.saga/stories/billing/other-story",
                ),
            ],
        }
    }

    fn reason_of(access: Access) -> DenyReason {
        match access {
            Access::Denied { reason } => reason,
            Access::Allowed => panic!("expected denial"),
        }
    }

    #[test]
    fn write_inside_worktree_is_allowed() {
        let path = PathBuf::from("/proj/.saga/worktrees/billing/add-invoice/src/main.rs");
        assert_eq!(
            evaluate(&boundary(), &path, FileOperation::Write),
            Access::Allowed
        );
    }

    #[test]
    fn write_outside_worktree_is_denied() {
        let path = PathBuf::from("/proj/src/main.rs");
        assert_eq!(
            reason_of(evaluate(&boundary(), &path, FileOperation::Write)),
            DenyReason::OutsideWorktree
        );
    }

    #[test]
    fn read_outside_worktree_inside_project_is_allowed() {
        let path = PathBuf::from("/proj/README.md");
        assert_eq!(
            evaluate(&boundary(), &path, FileOperation::Read),
            Access::Allowed
        );
    }

    #[test]
    fn read_outside_project_root_is_denied() {
        let path = PathBuf::from("/etc/passwd");
        assert_eq!(
            reason_of(evaluate(&boundary(), &path, FileOperation::Read)),
            DenyReason::OutsideWorktree
        );
    }

    #[test]
    fn foreign_story_write_is_denied_with_specific_reason() {
        let path = PathBuf::from("/proj/.saga/stories/billing/other-story/notes.md");
        assert_eq!(
            reason_of(evaluate(&boundary(), &path, FileOperation::Write)),
            DenyReason::ForeignStoryAccessDenied
        );
    }

    #[test]
    fn archive_access_is_denied_for_reads_too() {
        let path = PathBuf::from("/proj/.saga/archive/billing/old-story/story.md");
        assert_eq!(
            reason_of(evaluate(&boundary(), &path, FileOperation::Read)),
            DenyReason::ArchiveAccessDenied
        );
    }

    #[test]
    fn metadata_write_is_denied_inside_worktree() {
        let path = PathBuf::from(
            "/proj/.saga/worktrees/billing/add-invoice/.saga/epics/billing/epic.md",
        );
        assert_eq!(
            reason_of(evaluate(&boundary(), &path, FileOperation::Write)),
            DenyReason::ProtectedMetadata
        );
    }

    #[test]
    fn own_journal_write_is_allowed() {
        let path = PathBuf::from(
            "/proj/.saga/worktrees/billing/add-invoice/.saga/stories/billing/add-invoice/journal.md",
        );
        assert_eq!(
            evaluate(&boundary(), &path, FileOperation::Write),
            Access::Allowed
        );
    }

    /// `starts_with` compares whole components: a sibling directory sharing a
    /// name prefix with the worktree is still outside it.
    #[test]
    fn similar_path_prefix_is_not_containment() {
        let path = PathBuf::from("/proj/.saga/worktrees/billing/add-invoice-two/file.rs");
        assert_eq!(
            reason_of(evaluate(&boundary(), &path, FileOperation::Write)),
            DenyReason::OutsideWorktree
        );
    }
}
