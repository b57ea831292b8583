//! CLI argument parsing and command dispatch

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands::{self, Context};
use repotree::defaults::{CONFIG_ENV, REPOS_DIR_ENV};

/// repotree - Navigate and operate on a tree of git repositories
#[derive(Parser, Debug)]
#[command(name = "repotree")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Workspace document to use instead of searching upward for .repotree.yaml
    #[arg(short, long, global = true, value_name = "FILE", env = CONFIG_ENV)]
    config: Option<PathBuf>,

    /// Directory holding the working copies (overrides the document's repos_dir)
    #[arg(long, global = true, value_name = "DIR", env = REPOS_DIR_ENV)]
    repos_dir: Option<PathBuf>,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a workspace document and clone its eager repositories
    Init(commands::init::InitArgs),

    /// List nodes with their fetch mode and clone state
    #[command(alias = "ls")]
    List(commands::list::ListArgs),

    /// Display the workspace tree
    Tree(commands::tree::TreeArgs),

    /// Show branch and working-copy state of cloned repositories
    Status(commands::status::StatusArgs),

    /// Print the directory of a node
    Path(commands::path::PathArgs),

    /// Add a node to the workspace
    Add(commands::add::AddArgs),

    /// Remove a node from the workspace
    #[command(alias = "rm")]
    Remove(commands::remove::RemoveArgs),

    /// Clone repositories
    Clone(commands::clone::CloneArgs),

    /// Pull already cloned repositories
    Pull(commands::pull::PullArgs),

    /// Commit all changes in repositories
    Commit(commands::commit::CommitArgs),

    /// Push repositories to their upstream
    Push(commands::push::PushArgs),

    /// Show, set or clear the current position in the tree
    Use(commands::use_position::UseArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.log_level);

        let ctx = Context {
            config: self.config,
            repos_dir: self.repos_dir,
            color: self.color,
        };

        match self.command {
            Commands::Init(args) => commands::init::execute(args, &ctx),
            Commands::List(args) => commands::list::execute(args, &ctx),
            Commands::Tree(args) => commands::tree::execute(args, &ctx),
            Commands::Status(args) => commands::status::execute(args, &ctx),
            Commands::Path(args) => commands::path::execute(args, &ctx),
            Commands::Add(args) => commands::add::execute(args, &ctx),
            Commands::Remove(args) => commands::remove::execute(args, &ctx),
            Commands::Clone(args) => commands::clone::execute(args, &ctx),
            Commands::Pull(args) => commands::pull::execute(args, &ctx),
            Commands::Commit(args) => commands::commit::execute(args, &ctx),
            Commands::Push(args) => commands::push::execute(args, &ctx),
            Commands::Use(args) => commands::use_position::execute(args, &ctx),
        }
    }
}

/// Logs go to stderr. `RUST_LOG` takes precedence over `--log-level`.
fn init_logging(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level);
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .format_target(false)
        .try_init();
}
