//! # CLI Command Implementations
//!
//! One file per subcommand of the `repotree` command-line tool.
//!
//! ## Structure
//!
//! Each command module contains:
//! - An `Args` struct that defines the command-specific arguments and options,
//!   derived using `clap`.
//! - An `execute` function that takes the parsed `Args` and the global
//!   [`Context`] and performs the command's logic through the
//!   `repotree::workspace::Workspace` facade.
//!
//! Batch commands print one outcome line per node and a summary, and fail
//! (non-zero exit) when any node failed.

pub mod add;
pub mod clone;
pub mod commit;
pub mod init;
pub mod list;
pub mod path;
pub mod pull;
pub mod push;
pub mod remove;
pub mod status;
pub mod tree;
pub mod use_position;

use std::env;
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use repotree::defaults::{self, DEFAULT_MAX_PARALLEL};
use repotree::error::Error;
use repotree::executor::{BatchReport, ExecOptions};
use repotree::output::{self, OutputConfig};
use repotree::suggestions;
use repotree::workspace::{OpenOptions, Workspace};

/// Flags shared by every command.
#[derive(Debug, Clone)]
pub struct Context {
    pub config: Option<PathBuf>,
    pub repos_dir: Option<PathBuf>,
    pub color: String,
}

impl Context {
    /// Opens the workspace named by `--config`, or the nearest one.
    pub fn open_workspace(&self) -> Result<Workspace> {
        if self.config.is_none() {
            let cwd = env::current_dir()?;
            if defaults::find_config(&cwd).is_none() {
                return Err(suggestions::config_not_found(&cwd));
            }
        }
        let options = OpenOptions {
            config: self.config.clone(),
            repos_dir: self.repos_dir.clone(),
        };
        Workspace::open(&options).map_err(|e| suggestions::explain(e, &[]))
    }

    pub fn output(&self) -> OutputConfig {
        OutputConfig::from_env_and_flag(&self.color)
    }
}

/// Options of the network-bound batch commands (clone and pull).
#[derive(Args, Debug, Clone)]
pub struct BatchArgs {
    /// Apply to the whole subtree, not just the node itself
    #[arg(short, long)]
    pub recursive: bool,

    /// Also reach lazy repositories below the node
    #[arg(long)]
    pub include_lazy: bool,

    /// Maximum number of concurrent git processes (0 or 1 runs sequentially)
    #[arg(short, long, value_name = "N", default_value_t = DEFAULT_MAX_PARALLEL)]
    pub jobs: usize,
}

impl BatchArgs {
    pub fn options(&self) -> ExecOptions {
        ExecOptions {
            recursive: self.recursive,
            include_lazy: self.include_lazy,
            max_parallel: self.jobs,
        }
    }
}

/// Options for commands that run sequentially.
pub fn sequential(recursive: bool) -> ExecOptions {
    ExecOptions {
        recursive,
        include_lazy: false,
        max_parallel: 1,
    }
}

/// Maps a library error to an `anyhow` error with suggestions drawn from the
/// workspace's node names.
pub fn explain(workspace: &Workspace) -> impl Fn(Error) -> anyhow::Error + '_ {
    move |err| suggestions::explain(err, &workspace.node_names())
}

/// Prints a batch report and turns node failures into a command failure.
pub fn finish_batch(out: &OutputConfig, report: &BatchReport) -> Result<()> {
    output::print_report(out, report);
    if report.has_failures() {
        anyhow::bail!(
            "{} failed for {} node(s)",
            report.operation(),
            report.count(repotree::executor::Outcome::Failed)
        );
    }
    Ok(())
}
