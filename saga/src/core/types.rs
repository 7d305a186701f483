//! Shared deterministic types for saga core logic.
//!
//! These types define stable contracts between core components. They should not
//! depend on external state or I/O and must remain deterministic across scans.

use serde::{Deserialize, Serialize};

/// Runtime status of a story, recomputed from disk on every scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StoryStatus {
    Pending,
    InProgress,
    Completed,
}

impl StoryStatus {
    pub fn label(self) -> &'static str {
        match self {
            StoryStatus::Pending => "pending",
            StoryStatus::InProgress => "inProgress",
            StoryStatus::Completed => "completed",
        }
    }
}

/// Completion state of a single task line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskStatus {
    Pending,
    Completed,
}

/// Fixed enumeration of journal entry kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JournalKind {
    Progress,
    Blocker,
    Decision,
}

impl JournalKind {
    /// Parse a journal section header kind (case-insensitive).
    pub fn from_header(kind: &str) -> Option<Self> {
        match kind.trim().to_ascii_lowercase().as_str() {
            "progress" => Some(JournalKind::Progress),
            "blocker" => Some(JournalKind::Blocker),
            "decision" => Some(JournalKind::Decision),
            _ => None,
        }
    }
}

/// Class of a requested file operation, as seen by the scope validator.
///
/// Only writes are confined to the worktree; reads may range over the whole
/// project root so agents can consult shared context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileOperation {
    Read,
    Write,
}

/// Scope decision for one requested path.
///
/// Denials are expected, frequent results consumed by the tool-execution hook,
/// not errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "access", rename_all = "lowercase")]
pub enum Access {
    Allowed,
    Denied { reason: DenyReason },
}

/// Closed set of scope denial reasons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DenyReason {
    OutsideWorktree,
    ArchiveAccessDenied,
    ForeignStoryAccessDenied,
    ProtectedMetadata,
}

impl DenyReason {
    /// Stable reason code, as emitted to the hook layer.
    pub fn code(self) -> &'static str {
        match self {
            DenyReason::OutsideWorktree => "outside-worktree",
            DenyReason::ArchiveAccessDenied => "archive-access-denied",
            DenyReason::ForeignStoryAccessDenied => "foreign-story-access-denied",
            DenyReason::ProtectedMetadata => "protected-metadata",
        }
    }

    /// Explanatory message relayed back to the agent on a denial.
    pub fn message(self) -> &'static str {
        match self {
            DenyReason::OutsideWorktree => {
                "writes are restricted to the assigned worktree directory"
            }
            DenyReason::ArchiveAccessDenied => {
                "the archive holds completed stories and is read-only during execution"
            }
            DenyReason::ForeignStoryAccessDenied => {
                "another story's files are off limits to this session"
            }
            DenyReason::ProtectedMetadata => {
                "only the assigned story's journal.md is writable inside .saga"
            }
        }
    }
}
