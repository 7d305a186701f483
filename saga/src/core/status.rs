//! Story status derivation.
//!
//! Status is never stored authoritatively; it is recomputed from parsed fields
//! plus filesystem signals (worktree presence, archive location) on every scan.

use crate::core::types::{StoryStatus, TaskStatus};
use crate::model::Task;

/// Derive a story's status from its observable state.
///
/// Policy, in priority order:
/// 1. archived stories are `completed` regardless of task state;
/// 2. a live worktree means `inProgress`, even over an explicit `pending`
///    override (worktree presence is the authoritative signal);
/// 3. an explicit `pending` frontmatter override is honored;
/// 4. all tasks completed, with at least one task, means `completed`;
/// 5. otherwise `pending` (covers the zero-task, no-worktree case).
pub fn derive_story_status(
    explicit_pending: bool,
    tasks: &[Task],
    has_worktree: bool,
    is_archived: bool,
) -> StoryStatus {
    if is_archived {
        return StoryStatus::Completed;
    }
    if has_worktree {
        return StoryStatus::InProgress;
    }
    if explicit_pending {
        return StoryStatus::Pending;
    }
    if !tasks.is_empty() && tasks.iter().all(|t| t.status == TaskStatus::Completed) {
        return StoryStatus::Completed;
    }
    StoryStatus::Pending
}
