//! Identifier resolution over the scanned entity graph.
//!
//! Loads the graph from disk, hands ranking to `core::finder`, and renders
//! disambiguation snippets for ambiguous results.

use std::path::Path;

use anyhow::{Context, Result, bail};
use regex::Regex;

use crate::core::finder::{Candidate, FindError, Resolution, resolve};
use crate::core::types::StoryStatus;
use crate::io::config::SagaConfig;
use crate::io::scanner::{
    epics_directory_exists, scan_all_stories, scan_archived_stories, scan_epics, scan_stories,
    stories_directory_exists,
};
use crate::model::{Epic, Story};

const CONTEXT_MAX_LEN: usize = 300;

/// Resolve a user-supplied query to a unique epic.
///
/// Misses surface as [`FindError`] (downcastable from the returned error) so
/// callers can distinguish not-found from ambiguous.
pub fn find_epic(root: &Path, query: &str, config: &SagaConfig) -> Result<Epic> {
    if !epics_directory_exists(root) {
        bail!("no .saga/epics directory under {}", root.display());
    }
    let mut epics = scan_epics(root).context("scan epics")?;
    if epics.is_empty() {
        return Err(FindError::NotFound {
            query: query.to_string(),
        }
        .into());
    }

    let candidates: Vec<Candidate> = epics
        .iter()
        .map(|epic| Candidate {
            slug: epic.slug.clone(),
            title: epic.title.clone(),
        })
        .collect();
    match resolve(
        query,
        &candidates,
        config.finder.accept_threshold,
        config.finder.ambiguity_window,
    ) {
        Resolution::Unique(index) => Ok(epics.swap_remove(index)),
        Resolution::Ambiguous(indices) => Err(FindError::Ambiguous {
            query: query.to_string(),
            candidates: indices.iter().map(|&i| epic_context(&epics[i])).collect(),
        }
        .into()),
        Resolution::None => Err(FindError::NotFound {
            query: query.to_string(),
        }
        .into()),
    }
}

/// Resolve a query to a unique story.
///
/// With `epic_slug`, the search covers that epic's active and archived
/// stories; without it, every story in the project. An optional status filter
/// narrows candidates before ranking.
pub fn find_story(
    root: &Path,
    epic_slug: Option<&str>,
    query: &str,
    status: Option<StoryStatus>,
    config: &SagaConfig,
) -> Result<Story> {
    if !stories_directory_exists(root) && !epics_directory_exists(root) {
        bail!("no .saga/stories or .saga/epics directory under {}", root.display());
    }

    let mut stories = match epic_slug {
        Some(epic) => {
            let mut stories = scan_stories(root, epic).context("scan stories")?;
            stories.extend(scan_archived_stories(root, epic).context("scan archive")?);
            stories
        }
        None => scan_all_stories(root).context("scan stories")?,
    };
    if let Some(status) = status {
        stories.retain(|story| story.status == status);
    }
    if stories.is_empty() {
        return Err(FindError::NotFound {
            query: query.to_string(),
        }
        .into());
    }

    let candidates: Vec<Candidate> = stories
        .iter()
        .map(|story| Candidate {
            slug: story.slug.clone(),
            title: story.title.clone(),
        })
        .collect();
    match resolve(
        query,
        &candidates,
        config.finder.accept_threshold,
        config.finder.ambiguity_window,
    ) {
        Resolution::Unique(index) => Ok(stories.swap_remove(index)),
        Resolution::Ambiguous(indices) => Err(FindError::Ambiguous {
            query: query.to_string(),
            candidates: indices
                .iter()
                .map(|&i| extract_context(&stories[i]))
                .collect(),
        }
        .into()),
        Resolution::None => Err(FindError::NotFound {
            query: query.to_string(),
        }
        .into()),
    }
}

/// Short human-readable snippet for disambiguation prompts: title, status,
/// parent epic, and the story's `## Context` section when it has one.
pub fn extract_context(story: &Story) -> String {
    let mut snippet = format!(
        "{} [{}] (epic: {})",
        story.title,
        story.status.label(),
        story.epic_slug
    );
    let section = context_section(&story.body);
    if !section.is_empty() {
        snippet.push_str(" - ");
        snippet.push_str(&section);
    }
    snippet
}

fn epic_context(epic: &Epic) -> String {
    format!(
        "{} ({} stories, {} completed)",
        epic.title, epic.story_counts.total, epic.story_counts.completed
    )
}

/// The `## Context` section of a story body (case-insensitive heading match),
/// truncated to a display-friendly length. Empty when absent.
fn context_section(body: &str) -> String {
    use std::sync::LazyLock;
    static CONTEXT_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?is)##\s*context\s*\n+(.*?)(?:\n##|\z)").unwrap());

    let Some(captures) = CONTEXT_RE.captures(body) else {
        return String::new();
    };
    let context = captures[1].trim().to_string();
    if context.chars().count() > CONTEXT_MAX_LEN {
        let truncated: String = context.chars().take(CONTEXT_MAX_LEN - 3).collect();
        return format!("{truncated}...");
    }
    context
}
