//! Directory scanning for the `.saga/` tree.
//!
//! Scans are pure reads. One malformed or half-written entity is skipped with
//! a warning and never aborts the rest of the scan; output order is normalized
//! to lexicographic slug order so an unchanged tree always scans identically.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::warn;

use crate::core::status::derive_story_status;
use crate::io::entity::{parse_epic_file, parse_journal_file, parse_story_file, parse_tasks_file};
use crate::io::paths::SagaPaths;
use crate::model::{Epic, Story, StoryCounts};

pub fn saga_directory_exists(root: &Path) -> bool {
    SagaPaths::new(root).saga_dir.is_dir()
}

pub fn epics_directory_exists(root: &Path) -> bool {
    SagaPaths::new(root).epics_dir.is_dir()
}

pub fn stories_directory_exists(root: &Path) -> bool {
    SagaPaths::new(root).stories_dir.is_dir()
}

pub fn worktrees_directory_exists(root: &Path) -> bool {
    SagaPaths::new(root).worktrees_dir.is_dir()
}

/// Scan the epics root, one `epic.md` per immediate subdirectory.
///
/// Story counts cover active and archived stories (archived tally as
/// completed); the `stories` list names only the active ones.
pub fn scan_epics(root: &Path) -> Result<Vec<Epic>> {
    let paths = SagaPaths::new(root);
    let mut epics = Vec::new();
    for slug in sorted_subdirs(&paths.epics_dir)? {
        let epic_file = paths.epic_file(&slug);
        if !epic_file.is_file() {
            warn!(epic = %slug, "skipping epic directory without epic.md");
            continue;
        }
        let doc = match parse_epic_file(&epic_file, &slug) {
            Ok(doc) => doc,
            Err(err) => {
                warn!(%err, "skipping unparseable epic");
                continue;
            }
        };

        let active = scan_stories(root, &slug)?;
        let archived = scan_archived_stories(root, &slug)?;
        let story_counts =
            StoryCounts::tally(active.iter().chain(archived.iter()).map(|s| s.status));

        epics.push(Epic {
            title: doc.title,
            body: doc.body,
            extra: doc.extra,
            stories: active.iter().map(|s| s.slug.clone()).collect(),
            story_counts,
            path: paths.epic_dir(&slug),
            slug,
        });
    }
    Ok(epics)
}

/// Scan the active stories of one epic, sorted by slug.
pub fn scan_stories(root: &Path, epic_slug: &str) -> Result<Vec<Story>> {
    scan_story_dirs(root, epic_slug, false)
}

/// Scan the archived stories of one epic; these always derive `completed` and
/// are not reported as active.
pub fn scan_archived_stories(root: &Path, epic_slug: &str) -> Result<Vec<Story>> {
    scan_story_dirs(root, epic_slug, true)
}

/// Every story in the project, active then archived, each group in epic/slug
/// order. This is the resolver's search space.
pub fn scan_all_stories(root: &Path) -> Result<Vec<Story>> {
    let paths = SagaPaths::new(root);
    let mut all = Vec::new();
    for epic_slug in sorted_subdirs(&paths.stories_dir)? {
        all.extend(scan_stories(root, &epic_slug)?);
    }
    for epic_slug in sorted_subdirs(&paths.archive_dir)? {
        all.extend(scan_archived_stories(root, &epic_slug)?);
    }
    Ok(all)
}

fn scan_story_dirs(root: &Path, epic_slug: &str, archived: bool) -> Result<Vec<Story>> {
    let paths = SagaPaths::new(root);
    let base = if archived {
        paths.archive_epic_dir(epic_slug)
    } else {
        paths.epic_stories_dir(epic_slug)
    };

    let mut stories = Vec::new();
    for slug in sorted_subdirs(&base)? {
        let dir = base.join(&slug);
        let story_file = dir.join("story.md");
        if !story_file.is_file() {
            warn!(epic = %epic_slug, story = %slug, "skipping story directory without story.md");
            continue;
        }
        let doc = match parse_story_file(&story_file, &slug) {
            Ok(doc) => doc,
            Err(err) => {
                warn!(%err, "skipping unparseable story");
                continue;
            }
        };
        let tasks = parse_tasks_file(&dir.join("tasks.md")).unwrap_or_else(|err| {
            warn!(%err, "ignoring unreadable tasks file");
            Vec::new()
        });
        let journal = parse_journal_file(&dir.join("journal.md")).unwrap_or_else(|err| {
            warn!(%err, "ignoring unreadable journal file");
            Vec::new()
        });

        let worktree_dir = paths.worktree_dir(epic_slug, &slug);
        let has_worktree = !archived && worktree_dir.is_dir();
        let status = derive_story_status(doc.explicit_pending(), &tasks, has_worktree, archived);

        stories.push(Story {
            epic_slug: epic_slug.to_string(),
            title: doc.title,
            status,
            tasks,
            journal,
            archived,
            body: doc.body,
            extra: doc.extra,
            story_path: story_file,
            worktree_path: has_worktree.then_some(worktree_dir),
            slug,
        });
    }
    Ok(stories)
}

/// Immediate subdirectory names of `dir`, lexicographic. A missing directory
/// is an empty scan, not an error.
fn sorted_subdirs(dir: &Path) -> Result<Vec<String>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut names = Vec::new();
    let entries =
        fs::read_dir(dir).with_context(|| format!("read directory {}", dir.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("read directory {}", dir.display()))?;
        if !entry.path().is_dir() {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) => names.push(name),
            Err(_) => warn!(path = %entry.path().display(), "skipping non-UTF-8 directory name"),
        }
    }
    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::StoryStatus;
    use crate::test_support::{
        write_archived_story, write_epic, write_story, write_story_raw, write_tasks,
    };

    #[test]
    fn scan_epics_is_sorted_and_counts_stories() {
        let temp = tempfile::tempdir().expect("tempdir");
        let root = temp.path();
        write_epic(root, "zeta", "Zeta epic");
        write_epic(root, "billing", "Billing overhaul");
        write_story(root, "billing", "add-invoice", "Add invoice");
        write_tasks(root, "billing", "add-invoice", &[(true, "schema"), (true, "endpoint")]);
        write_archived_story(root, "billing", "old-story", "Old story");

        let epics = scan_epics(root).expect("scan");
        assert_eq!(epics.len(), 2);
        assert_eq!(epics[0].slug, "billing");
        assert_eq!(epics[1].slug, "zeta");
        assert_eq!(epics[0].stories, vec!["add-invoice".to_string()]);
        assert_eq!(epics[0].story_counts.total, 2);
        assert_eq!(epics[0].story_counts.completed, 2);
    }

    #[test]
    fn scan_skips_epic_directory_without_canonical_file() {
        let temp = tempfile::tempdir().expect("tempdir");
        let root = temp.path();
        write_epic(root, "billing", "Billing");
        fs::create_dir_all(root.join(".saga/epics/empty-dir")).expect("mkdir");

        let epics = scan_epics(root).expect("scan");
        assert_eq!(epics.len(), 1);
        assert_eq!(epics[0].slug, "billing");
    }

    #[test]
    fn malformed_story_is_isolated_from_the_rest_of_the_scan() {
        let temp = tempfile::tempdir().expect("tempdir");
        let root = temp.path();
        write_epic(root, "billing", "Billing");
        write_story(root, "billing", "good-story", "Good");
        write_story_raw(root, "billing", "bad-story", "no frontmatter at all\n");

        let stories = scan_stories(root, "billing").expect("scan");
        assert_eq!(stories.len(), 1);
        assert_eq!(stories[0].slug, "good-story");
    }

    #[test]
    fn worktree_presence_drives_in_progress() {
        let temp = tempfile::tempdir().expect("tempdir");
        let root = temp.path();
        write_epic(root, "billing", "Billing");
        write_story(root, "billing", "add-invoice", "Add invoice");
        fs::create_dir_all(root.join(".saga/worktrees/billing/add-invoice")).expect("mkdir");

        let stories = scan_stories(root, "billing").expect("scan");
        assert_eq!(stories[0].status, StoryStatus::InProgress);
        assert!(stories[0].worktree_path.is_some());
    }

    #[test]
    fn archived_stories_derive_completed_and_are_not_active() {
        let temp = tempfile::tempdir().expect("tempdir");
        let root = temp.path();
        write_epic(root, "billing", "Billing");
        write_archived_story(root, "billing", "old-story", "Old story");

        assert!(scan_stories(root, "billing").expect("scan").is_empty());
        let archived = scan_archived_stories(root, "billing").expect("scan");
        assert_eq!(archived.len(), 1);
        assert!(archived[0].archived);
        assert_eq!(archived[0].status, StoryStatus::Completed);
    }

    #[test]
    fn missing_directories_scan_empty() {
        let temp = tempfile::tempdir().expect("tempdir");
        assert!(!saga_directory_exists(temp.path()));
        assert!(!epics_directory_exists(temp.path()));
        assert!(!stories_directory_exists(temp.path()));
        assert!(!worktrees_directory_exists(temp.path()));
        assert!(scan_epics(temp.path()).expect("scan").is_empty());
        assert!(scan_all_stories(temp.path()).expect("scan").is_empty());
    }

    #[test]
    fn existence_checks_see_created_directories() {
        let temp = tempfile::tempdir().expect("tempdir");
        let root = temp.path();
        write_epic(root, "billing", "Billing");
        write_story(root, "billing", "add-invoice", "Add invoice");
        fs::create_dir_all(root.join(".saga/worktrees")).expect("mkdir");

        assert!(saga_directory_exists(root));
        assert!(epics_directory_exists(root));
        assert!(stories_directory_exists(root));
        assert!(worktrees_directory_exists(root));
    }
}
