//! Entity records assembled by the directory scanner.
//!
//! Statuses on these records are derived values: nothing here is authoritative
//! beyond what the `.saga/` tree contains at scan time.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::types::{JournalKind, StoryStatus, TaskStatus};

/// Frontmatter keys this core does not recognize, preserved in file order so
/// future fields survive a read/display cycle untouched.
pub type ExtraKeys = Vec<(String, String)>;

/// Per-status story tally for an epic (archived stories count as completed).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryCounts {
    pub total: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
}

impl StoryCounts {
    pub fn tally(statuses: impl IntoIterator<Item = StoryStatus>) -> Self {
        let mut counts = StoryCounts::default();
        for status in statuses {
            counts.total += 1;
            match status {
                StoryStatus::Pending => counts.pending += 1,
                StoryStatus::InProgress => counts.in_progress += 1,
                StoryStatus::Completed => counts.completed += 1,
            }
        }
        counts
    }
}

/// Top-level unit of work. Slug is the directory name under the epics root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Epic {
    pub slug: String,
    pub title: String,
    /// Body text after frontmatter, verbatim.
    pub body: String,
    pub extra: ExtraKeys,
    /// Slugs of the epic's active stories, lexicographic.
    pub stories: Vec<String>,
    pub story_counts: StoryCounts,
    pub path: PathBuf,
}

/// A unit of autonomous agent work. Full identity is (epic slug, story slug);
/// the slug alone is only unique within its epic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    pub slug: String,
    pub epic_slug: String,
    pub title: String,
    /// Derived on scan, never stored back.
    pub status: StoryStatus,
    pub tasks: Vec<Task>,
    pub journal: Vec<JournalEntry>,
    pub archived: bool,
    pub body: String,
    pub extra: ExtraKeys,
    pub story_path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worktree_path: Option<PathBuf>,
}

/// A checklist line in tasks.md. Owned by its story; identified by 1-based
/// position in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub ordinal: usize,
    pub description: String,
    pub status: TaskStatus,
}

/// One `##` section of journal.md, in file order (append-only, never
/// re-sorted).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    pub timestamp: String,
    pub kind: JournalKind,
    pub body: String,
}

/// The branch + worktree pair backing a story's isolated workspace.
///
/// Existence is re-derived from disk on each scan; this record is never cached
/// authoritatively across invocations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    pub branch: String,
    pub worktree_path: PathBuf,
}
