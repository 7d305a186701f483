//! Typed parsing of the entity files under `.saga/`.
//!
//! One parser per file kind: `epic.md`, `story.md`, `tasks.md`, `journal.md`.
//! A `ParseError` is scoped to the single entity it came from; the scanner
//! decides whether to skip or surface it.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::types::{JournalKind, TaskStatus};
use crate::io::frontmatter::{Document, parse_document};
use crate::model::{ExtraKeys, JournalEntry, Task};

/// A malformed or unreadable entity file.
#[derive(Debug, Error)]
#[error("{}: {}", .path.display(), .reason)]
pub struct ParseError {
    pub path: PathBuf,
    pub reason: String,
}

impl ParseError {
    fn new(path: &Path, reason: impl Into<String>) -> Self {
        Self {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }
}

const EPIC_KEYS: [&str; 1] = ["title"];
const STORY_KEYS: [&str; 2] = ["title", "status"];

/// Typed contents of an `epic.md` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpicDoc {
    pub title: String,
    pub extra: ExtraKeys,
    pub body: String,
}

/// Typed contents of a `story.md` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryDoc {
    pub title: String,
    /// Raw `status` frontmatter value; only `pending` acts as an override.
    pub explicit_status: Option<String>,
    pub extra: ExtraKeys,
    pub body: String,
}

impl StoryDoc {
    pub fn explicit_pending(&self) -> bool {
        self.explicit_status.as_deref() == Some("pending")
    }
}

/// Parse `epic.md`. Title falls back to the first `# ` heading, then the slug.
pub fn parse_epic_file(path: &Path, slug: &str) -> Result<EpicDoc, ParseError> {
    let doc = read_document(path)?;
    let title = doc
        .frontmatter
        .get("title")
        .map(str::to_string)
        .or_else(|| first_heading(&doc.body))
        .unwrap_or_else(|| slug.to_string());
    Ok(EpicDoc {
        title,
        extra: doc.frontmatter.extra(&EPIC_KEYS),
        body: doc.body,
    })
}

/// Parse `story.md`. Title falls back to the slug.
pub fn parse_story_file(path: &Path, slug: &str) -> Result<StoryDoc, ParseError> {
    let doc = read_document(path)?;
    let title = doc
        .frontmatter
        .get("title")
        .map(str::to_string)
        .unwrap_or_else(|| slug.to_string());
    Ok(StoryDoc {
        title,
        explicit_status: doc.frontmatter.get("status").map(str::to_string),
        extra: doc.frontmatter.extra(&STORY_KEYS),
        body: doc.body,
    })
}

/// Parse `tasks.md` as a markdown checklist. A missing file is zero tasks;
/// only a read failure on an existing file is an error.
pub fn parse_tasks_file(path: &Path) -> Result<Vec<Task>, ParseError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let contents =
        fs::read_to_string(path).map_err(|err| ParseError::new(path, err.to_string()))?;
    Ok(parse_tasks(&contents))
}

/// Parse checklist lines; anything else (headings, prose, blanks) is ignored.
pub fn parse_tasks(contents: &str) -> Vec<Task> {
    let mut tasks = Vec::new();
    for line in contents.lines() {
        let trimmed = line.trim_start();
        let (status, rest) = if let Some(rest) = trimmed.strip_prefix("- [ ]") {
            (TaskStatus::Pending, rest)
        } else if let Some(rest) = trimmed
            .strip_prefix("- [x]")
            .or_else(|| trimmed.strip_prefix("- [X]"))
        {
            (TaskStatus::Completed, rest)
        } else {
            continue;
        };
        tasks.push(Task {
            ordinal: tasks.len() + 1,
            description: rest.trim().to_string(),
            status,
        });
    }
    tasks
}

/// Parse `journal.md`. A missing file is zero entries.
pub fn parse_journal_file(path: &Path) -> Result<Vec<JournalEntry>, ParseError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let contents =
        fs::read_to_string(path).map_err(|err| ParseError::new(path, err.to_string()))?;
    Ok(parse_journal(&contents))
}

/// Split a journal into `## <kind>: <timestamp>` sections, preserving file
/// order. Sections with an unknown kind are ignored, never reordered.
pub fn parse_journal(contents: &str) -> Vec<JournalEntry> {
    let mut entries = Vec::new();
    let mut current: Option<(JournalKind, String, Vec<&str>)> = None;

    for line in contents.lines() {
        if let Some(header) = line.strip_prefix("## ") {
            if let Some((kind, timestamp, body)) = current.take() {
                entries.push(entry(kind, timestamp, &body));
            }
            current = header.split_once(':').and_then(|(kind, timestamp)| {
                JournalKind::from_header(kind)
                    .map(|kind| (kind, timestamp.trim().to_string(), Vec::new()))
            });
            continue;
        }
        if let Some((_, _, body)) = current.as_mut() {
            body.push(line);
        }
    }
    if let Some((kind, timestamp, body)) = current.take() {
        entries.push(entry(kind, timestamp, &body));
    }
    entries
}

fn entry(kind: JournalKind, timestamp: String, body: &[&str]) -> JournalEntry {
    JournalEntry {
        timestamp,
        kind,
        body: body.join("\n").trim().to_string(),
    }
}

fn first_heading(body: &str) -> Option<String> {
    body.lines()
        .find_map(|line| line.strip_prefix("# "))
        .map(|heading| heading.trim().to_string())
}

fn read_document(path: &Path) -> Result<Document, ParseError> {
    let contents =
        fs::read_to_string(path).map_err(|err| ParseError::new(path, err.to_string()))?;
    parse_document(&contents).map_err(|err| ParseError::new(path, err.to_string()))
}
