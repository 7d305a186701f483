//! Scope validation sessions for agent tool calls.
//!
//! This is the runtime security boundary: every file-mutating tool call made
//! by an agent process is checked against the boundary of the story it is
//! bound to. The rules themselves are pure (`core::scope`); this module owns
//! session state, boundary construction from disk, and path canonicalization.

use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use tracing::debug;

use crate::core::scope::{ScopeBoundary, evaluate};
use crate::core::types::{Access, FileOperation};
use crate::io::paths::SagaPaths;

/// Per-session validator state.
///
/// `Unbound` → (workspace assigned) → `Bound` → (session ends or workspace
/// torn down) → `Unbound`. No operation is validated while unbound.
#[derive(Debug, Clone, Default)]
pub enum ScopeSession {
    #[default]
    Unbound,
    Bound(ScopeBoundary),
}

impl ScopeSession {
    pub fn bind(&mut self, boundary: ScopeBoundary) {
        *self = ScopeSession::Bound(boundary);
    }

    pub fn unbind(&mut self) {
        *self = ScopeSession::Unbound;
    }

    pub fn boundary(&self) -> Option<&ScopeBoundary> {
        match self {
            ScopeSession::Unbound => None,
            ScopeSession::Bound(boundary) => Some(boundary),
        }
    }

    /// Validate one requested operation. An unbound session is a
    /// configuration error, not a denial.
    pub fn validate(&self, requested: &Path, operation: FileOperation) -> Result<Access> {
        match self {
            ScopeSession::Unbound => {
                bail!("scope session is unbound; bind a story workspace before validating")
            }
            ScopeSession::Bound(boundary) => validate_path(boundary, requested, operation),
        }
    }
}

/// Build the scope boundary for a story from the tree on disk.
///
/// The worktree must already be provisioned. Forbidden prefixes cover the
/// archive root and every other story's directory, in both the main tree and
/// the worktree's own `.saga/` checkout.
pub fn bind_story(root: &Path, epic_slug: &str, story_slug: &str) -> Result<ScopeBoundary> {
    let paths = SagaPaths::new(root);
    let project_root = fs::canonicalize(&paths.root)
        .with_context(|| format!("resolve project root {}", paths.root.display()))?;
    let worktree_dir = paths.worktree_dir(epic_slug, story_slug);
    let workspace_root = fs::canonicalize(&worktree_dir).with_context(|| {
        format!(
            "no worktree at {} (provision the workspace first)",
            worktree_dir.display()
        )
    })?;

    let archive_roots = vec![
        project_root.join(".saga").join("archive"),
        workspace_root.join(".saga").join("archive"),
    ];

    let mut foreign_story_dirs = Vec::new();
    for saga_root in [&project_root, &workspace_root] {
        let stories_dir = saga_root.join(".saga").join("stories");
        collect_foreign_story_dirs(&stories_dir, epic_slug, story_slug, &mut foreign_story_dirs)?;
    }

    debug!(
        workspace = %workspace_root.display(),
        forbidden = foreign_story_dirs.len(),
        "bound story scope"
    );
    Ok(ScopeBoundary {
        epic_slug: epic_slug.to_string(),
        story_slug: story_slug.to_string(),
        project_root,
        workspace_root,
        archive_roots,
        foreign_story_dirs,
    })
}

/// Canonicalize the requested path, then apply the pure containment rules.
///
/// Relative paths resolve against the workspace root (the agent's working
/// directory is its worktree).
pub fn validate_path(
    boundary: &ScopeBoundary,
    requested: &Path,
    operation: FileOperation,
) -> Result<Access> {
    let absolute = if requested.is_absolute() {
        requested.to_path_buf()
    } else {
        boundary.workspace_root.join(requested)
    };
    let canonical = canonicalize_lenient(&absolute)?;
    Ok(evaluate(boundary, &canonical, operation))
}

/// Resolve a path that may not exist yet: lexically normalize `.`/`..`, then
/// canonicalize the nearest existing ancestor (resolving symlinks) and re-join
/// the non-existent tail. Components that do not exist cannot be symlinks, so
/// the tail needs no further resolution.
fn canonicalize_lenient(path: &Path) -> Result<PathBuf> {
    let mut base = lexical_normalize(path);
    let mut tail: Vec<PathBuf> = Vec::new();

    loop {
        match fs::canonicalize(&base) {
            Ok(canonical) => {
                let mut resolved = canonical;
                for component in tail.iter().rev() {
                    resolved.push(component);
                }
                return Ok(resolved);
            }
            Err(_) => match (base.file_name(), base.parent()) {
                (Some(name), Some(parent)) => {
                    tail.push(PathBuf::from(name));
                    base = parent.to_path_buf();
                }
                _ => {
                    return Err(anyhow!(
                        "cannot resolve any ancestor of {}",
                        path.display()
                    ));
                }
            },
        }
    }
}

fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            Component::Normal(name) => out.push(name),
        }
    }
    out
}

fn collect_foreign_story_dirs(
    stories_dir: &Path,
    epic_slug: &str,
    story_slug: &str,
    out: &mut Vec<PathBuf>,
) -> Result<()> {
    if !stories_dir.is_dir() {
        return Ok(());
    }
    for epic_entry in sorted_dirs(stories_dir)? {
        let epic_name = epic_entry
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        for story_entry in sorted_dirs(&epic_entry)? {
            let story_name = story_entry
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            if epic_name == epic_slug && story_name == story_slug {
                continue;
            }
            out.push(story_entry);
        }
    }
    Ok(())
}

fn sorted_dirs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    let entries =
        fs::read_dir(dir).with_context(|| format!("read directory {}", dir.display()))?;
    for entry in entries {
        let path = entry
            .with_context(|| format!("read directory {}", dir.display()))?
            .path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}
