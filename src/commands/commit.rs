//! # Commit Command Implementation
//!
//! This module implements the `commit` subcommand, which stages and commits
//! every change in the selected repositories. Clean repositories are skipped.

use anyhow::Result;
use clap::Args;

use super::{explain, finish_batch, sequential, Context};

/// Commit all changes in repositories
#[derive(Args, Debug)]
pub struct CommitArgs {
    /// Node to commit (defaults to the current node)
    #[arg(value_name = "PATH")]
    pub target: Option<String>,

    /// Commit message
    #[arg(short, long)]
    pub message: String,

    /// Include the whole subtree
    #[arg(short, long)]
    pub recursive: bool,
}

/// Execute the `commit` command.
pub fn execute(args: CommitArgs, ctx: &Context) -> Result<()> {
    let out = ctx.output();
    let mut workspace = ctx.open_workspace()?;
    let report = workspace
        .commit_node(args.target.as_deref(), &args.message, &sequential(args.recursive))
        .map_err(explain(&workspace))?;
    finish_batch(&out, &report)
}
