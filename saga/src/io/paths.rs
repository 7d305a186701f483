//! Canonical paths within a project's `.saga/` tree.

use std::path::PathBuf;

/// All root-level `.saga/` paths for a project root.
#[derive(Debug, Clone)]
pub struct SagaPaths {
    pub root: PathBuf,
    pub saga_dir: PathBuf,
    pub epics_dir: PathBuf,
    pub stories_dir: PathBuf,
    pub worktrees_dir: PathBuf,
    pub archive_dir: PathBuf,
    pub config_path: PathBuf,
}

impl SagaPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let saga_dir = root.join(".saga");
        Self {
            root: root.clone(),
            epics_dir: saga_dir.join("epics"),
            stories_dir: saga_dir.join("stories"),
            worktrees_dir: saga_dir.join("worktrees"),
            archive_dir: saga_dir.join("archive"),
            config_path: saga_dir.join("config.toml"),
            saga_dir,
        }
    }

    /// `.saga/epics/<epic>/`
    pub fn epic_dir(&self, epic_slug: &str) -> PathBuf {
        self.epics_dir.join(epic_slug)
    }

    /// `.saga/epics/<epic>/epic.md`, the one canonical file per epic.
    pub fn epic_file(&self, epic_slug: &str) -> PathBuf {
        self.epic_dir(epic_slug).join("epic.md")
    }

    /// `.saga/stories/<epic>/`, stories grouped by parent epic.
    pub fn epic_stories_dir(&self, epic_slug: &str) -> PathBuf {
        self.stories_dir.join(epic_slug)
    }

    /// `.saga/stories/<epic>/<story>/`
    pub fn story_dir(&self, epic_slug: &str, story_slug: &str) -> PathBuf {
        self.epic_stories_dir(epic_slug).join(story_slug)
    }

    pub fn story_file(&self, epic_slug: &str, story_slug: &str) -> PathBuf {
        self.story_dir(epic_slug, story_slug).join("story.md")
    }

    pub fn tasks_file(&self, epic_slug: &str, story_slug: &str) -> PathBuf {
        self.story_dir(epic_slug, story_slug).join("tasks.md")
    }

    pub fn journal_file(&self, epic_slug: &str, story_slug: &str) -> PathBuf {
        self.story_dir(epic_slug, story_slug).join("journal.md")
    }

    /// `.saga/archive/<epic>/`, terminal location for completed stories.
    pub fn archive_epic_dir(&self, epic_slug: &str) -> PathBuf {
        self.archive_dir.join(epic_slug)
    }

    pub fn archive_story_dir(&self, epic_slug: &str, story_slug: &str) -> PathBuf {
        self.archive_epic_dir(epic_slug).join(story_slug)
    }

    pub fn archive_story_file(&self, epic_slug: &str, story_slug: &str) -> PathBuf {
        self.archive_story_dir(epic_slug, story_slug).join("story.md")
    }

    /// `.saga/worktrees/<epic>/<story>/`, the story's isolated checkout.
    pub fn worktree_dir(&self, epic_slug: &str, story_slug: &str) -> PathBuf {
        self.worktrees_dir.join(epic_slug).join(story_slug)
    }
}
