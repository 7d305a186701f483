//! Test-only helpers: `.saga/` fixtures and a disposable git repository.

use std::fs;
use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result, anyhow};

use crate::core::types::TaskStatus;
use crate::model::Task;

/// Create a deterministic pending task.
pub fn pending_task(ordinal: usize, description: &str) -> Task {
    Task {
        ordinal,
        description: description.to_string(),
        status: TaskStatus::Pending,
    }
}

/// Create a deterministic completed task.
pub fn completed_task(ordinal: usize, description: &str) -> Task {
    Task {
        ordinal,
        description: description.to_string(),
        status: TaskStatus::Completed,
    }
}

/// Write `.saga/epics/<slug>/epic.md` with a title.
pub fn write_epic(root: &Path, slug: &str, title: &str) {
    let dir = root.join(".saga/epics").join(slug);
    fs::create_dir_all(&dir).expect("create epic dir");
    fs::write(
        dir.join("epic.md"),
        format!("---\ntitle: {title}\n---\n\nFixture epic.\n"),
    )
    .expect("write epic.md");
}

/// Write `.saga/stories/<epic>/<slug>/story.md` with a title.
pub fn write_story(root: &Path, epic_slug: &str, slug: &str, title: &str) {
    write_story_raw(
        root,
        epic_slug,
        slug,
        &format!("---\ntitle: {title}\n---\n\n## Context\n\nFixture story.\n"),
    );
}

/// Write a story with an explicit frontmatter `status` value.
pub fn write_story_with_status(
    root: &Path,
    epic_slug: &str,
    slug: &str,
    title: &str,
    status: &str,
) {
    write_story_raw(
        root,
        epic_slug,
        slug,
        &format!("---\ntitle: {title}\nstatus: {status}\n---\n"),
    );
}

/// Write raw `story.md` contents (useful for malformed fixtures).
pub fn write_story_raw(root: &Path, epic_slug: &str, slug: &str, contents: &str) {
    let dir = root.join(".saga/stories").join(epic_slug).join(slug);
    fs::create_dir_all(&dir).expect("create story dir");
    fs::write(dir.join("story.md"), contents).expect("write story.md");
}

/// Write `tasks.md` as a checklist; `true` marks a completed task.
pub fn write_tasks(root: &Path, epic_slug: &str, story_slug: &str, tasks: &[(bool, &str)]) {
    let dir = root.join(".saga/stories").join(epic_slug).join(story_slug);
    fs::create_dir_all(&dir).expect("create story dir");
    let mut contents = String::from("# Tasks\n\n");
    for (done, description) in tasks {
        let mark = if *done { "x" } else { " " };
        contents.push_str(&format!("- [{mark}] {description}\n"));
    }
    fs::write(dir.join("tasks.md"), contents).expect("write tasks.md");
}

/// Write `journal.md` verbatim.
pub fn write_journal(root: &Path, epic_slug: &str, story_slug: &str, contents: &str) {
    let dir = root.join(".saga/stories").join(epic_slug).join(story_slug);
    fs::create_dir_all(&dir).expect("create story dir");
    fs::write(dir.join("journal.md"), contents).expect("write journal.md");
}

/// Write an archived story under `.saga/archive/<epic>/<slug>/`.
pub fn write_archived_story(root: &Path, epic_slug: &str, slug: &str, title: &str) {
    let dir = root.join(".saga/archive").join(epic_slug).join(slug);
    fs::create_dir_all(&dir).expect("create archive dir");
    fs::write(
        dir.join("story.md"),
        format!("---\ntitle: {title}\n---\n"),
    )
    .expect("write story.md");
}

/// A temporary directory initialized as a git repository with one commit,
/// for exercising the workspace provisioner against real git.
pub struct TestRepo {
    temp: tempfile::TempDir,
}

impl TestRepo {
    pub fn new() -> Result<Self> {
        let temp = tempfile::tempdir().context("create tempdir")?;
        let root = temp.path();
        run_git(root, &["init", "-b", "main"])?;
        run_git(root, &["config", "user.email", "tests@example.invalid"])?;
        run_git(root, &["config", "user.name", "Saga Tests"])?;
        fs::write(root.join("README.md"), "# fixture\n").context("write README")?;
        fs::write(root.join(".gitignore"), ".saga/worktrees/\n").context("write gitignore")?;
        run_git(root, &["add", "."])?;
        run_git(root, &["commit", "-m", "initial commit"])?;
        Ok(Self { temp })
    }

    pub fn root(&self) -> &Path {
        self.temp.path()
    }
}

fn run_git(root: &Path, args: &[&str]) -> Result<()> {
    let output = Command::new("git")
        .args(args)
        .current_dir(root)
        .output()
        .with_context(|| format!("spawn git {}", args.join(" ")))?;
    if !output.status.success() {
        return Err(anyhow!(
            "git {} failed: {}",
            args.join(" "),
            String::from_utf8_lossy(&output.stderr).trim()
        ));
    }
    Ok(())
}
