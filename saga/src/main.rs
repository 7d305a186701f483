//! Coordination CLI for epic/story agent work.
//!
//! Thin surface over the library: scanning the `.saga/` tree, resolving
//! identifiers, provisioning story workspaces, and checking paths against a
//! story's scope. Structured results go to stdout as JSON so the dashboard and
//! hook layers can consume them.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;

use saga::core::finder::FindError;
use saga::core::types::{Access, FileOperation, StoryStatus};
use saga::exit_codes;
use saga::find::{find_epic, find_story};
use saga::io::config::{SagaConfig, load_config};
use saga::io::paths::SagaPaths;
use saga::io::scanner::{scan_all_stories, scan_epics};
use saga::workspace::{ProvisionError, create_worktree, remove_worktree};
use saga::{logging, scope};

#[derive(Parser)]
#[command(
    name = "saga",
    version,
    about = "Filesystem-backed coordination for epic/story agent work"
)]
struct Cli {
    /// Project root containing `.saga/` (defaults to the current directory).
    #[arg(long, global = true, default_value = ".")]
    path: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the scanned entity graph as JSON.
    Scan,
    /// Resolve a query to a unique story (or epic with --epics).
    Find {
        query: String,
        /// Restrict the search to one epic's stories.
        #[arg(long)]
        epic: Option<String>,
        /// Match epics instead of stories.
        #[arg(long, conflicts_with_all = ["epic", "status"])]
        epics: bool,
        /// Only consider stories with this derived status.
        #[arg(long, value_enum)]
        status: Option<StatusArg>,
    },
    /// Manage story workspaces (branch + worktree pairs).
    Worktree {
        #[command(subcommand)]
        command: WorktreeCommand,
    },
    /// Validate a file path against a story's scope boundary.
    ///
    /// Exit code 0 allows the operation; 2 blocks it with a reason on stderr.
    CheckPath {
        file: PathBuf,
        #[arg(long)]
        epic: String,
        #[arg(long)]
        story: String,
        #[arg(long, value_enum, default_value_t = OpArg::Read)]
        op: OpArg,
    },
}

#[derive(Subcommand)]
enum WorktreeCommand {
    /// Create (or reuse) the worktree backing a story.
    Create { epic: String, story: String },
    /// Tear down a story's worktree and branch (no-op if already gone).
    Remove { epic: String, story: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StatusArg {
    Pending,
    InProgress,
    Completed,
}

impl From<StatusArg> for StoryStatus {
    fn from(status: StatusArg) -> Self {
        match status {
            StatusArg::Pending => StoryStatus::Pending,
            StatusArg::InProgress => StoryStatus::InProgress,
            StatusArg::Completed => StoryStatus::Completed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OpArg {
    Read,
    Write,
}

impl From<OpArg> for FileOperation {
    fn from(op: OpArg) -> Self {
        match op {
            OpArg::Read => FileOperation::Read,
            OpArg::Write => FileOperation::Write,
        }
    }
}

fn main() {
    logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{err:#}");
            let code = match err.downcast_ref::<FindError>() {
                Some(FindError::Ambiguous { .. }) => exit_codes::AMBIGUOUS,
                _ => exit_codes::INVALID,
            };
            std::process::exit(code);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    let root = cli.path;
    let config = load_config(&SagaPaths::new(&root).config_path).context("load config")?;

    match cli.command {
        Command::Scan => cmd_scan(&root),
        Command::Find {
            query,
            epic,
            epics,
            status,
        } => cmd_find(&root, &query, epic.as_deref(), epics, status, &config),
        Command::Worktree { command } => match command {
            WorktreeCommand::Create { epic, story } => {
                cmd_worktree_create(&root, &epic, &story, &config)
            }
            WorktreeCommand::Remove { epic, story } => {
                cmd_worktree_remove(&root, &epic, &story, &config)
            }
        },
        Command::CheckPath {
            file,
            epic,
            story,
            op,
        } => cmd_check_path(&root, &file, &epic, &story, op.into()),
    }
}

fn cmd_scan(root: &Path) -> Result<i32> {
    let epics = scan_epics(root)?;
    let stories = scan_all_stories(root)?;
    print_json(&json!({ "epics": epics, "stories": stories }))?;
    Ok(exit_codes::OK)
}

fn cmd_find(
    root: &Path,
    query: &str,
    epic: Option<&str>,
    epics: bool,
    status: Option<StatusArg>,
    config: &SagaConfig,
) -> Result<i32> {
    if epics {
        let found = find_epic(root, query, config)?;
        print_json(&found)?;
    } else {
        let found = find_story(root, epic, query, status.map(StoryStatus::from), config)?;
        print_json(&found)?;
    }
    Ok(exit_codes::OK)
}

fn cmd_worktree_create(
    root: &Path,
    epic: &str,
    story: &str,
    config: &SagaConfig,
) -> Result<i32> {
    // A hung git invocation is retried once before being surfaced.
    let result = match create_worktree(root, epic, story, config) {
        Err(ProvisionError::Timeout { .. }) => create_worktree(root, epic, story, config),
        other => other,
    };
    match result {
        Ok(outcome) => {
            print_json(&json!({
                "success": true,
                "worktreePath": outcome.workspace.worktree_path,
                "branch": outcome.workspace.branch,
                "created": outcome.created,
            }))?;
            Ok(exit_codes::OK)
        }
        Err(err) => {
            print_json(&json!({ "success": false, "error": err.to_string() }))?;
            Ok(exit_codes::INVALID)
        }
    }
}

fn cmd_worktree_remove(
    root: &Path,
    epic: &str,
    story: &str,
    config: &SagaConfig,
) -> Result<i32> {
    let result = match remove_worktree(root, epic, story, config) {
        Err(ProvisionError::Timeout { .. }) => remove_worktree(root, epic, story, config),
        other => other,
    };
    match result {
        Ok(()) => {
            print_json(&json!({ "success": true }))?;
            Ok(exit_codes::OK)
        }
        Err(err) => {
            print_json(&json!({ "success": false, "error": err.to_string() }))?;
            Ok(exit_codes::INVALID)
        }
    }
}

fn cmd_check_path(
    root: &Path,
    file: &Path,
    epic: &str,
    story: &str,
    op: FileOperation,
) -> Result<i32> {
    let boundary = scope::bind_story(root, epic, story)?;
    // Hook inputs arrive relative to the invoking process's working directory.
    let file = if file.is_relative() {
        std::env::current_dir().context("resolve working directory")?.join(file)
    } else {
        file.to_path_buf()
    };
    match scope::validate_path(&boundary, &file, op)? {
        Access::Allowed => Ok(exit_codes::OK),
        Access::Denied { reason } => {
            eprintln!(
                "scope violation [{}]: {} ({}/{})",
                reason.code(),
                reason.message(),
                epic,
                story
            );
            Ok(exit_codes::BLOCKED)
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let payload = serde_json::to_string_pretty(value).context("serialize json")?;
    println!("{payload}");
    Ok(())
}
