//! # Pull Command Implementation
//!
//! This module implements the `pull` subcommand. Only repositories that are
//! already cloned are pulled; pull never clones.

use anyhow::Result;
use clap::Args;

use super::{explain, finish_batch, BatchArgs, Context};

/// Pull already cloned repositories
#[derive(Args, Debug)]
pub struct PullArgs {
    /// Node to pull (defaults to the current node)
    #[arg(value_name = "PATH")]
    pub target: Option<String>,

    #[command(flatten)]
    pub batch: BatchArgs,

    /// Discard local divergence and reset to the upstream branch
    #[arg(short, long)]
    pub force: bool,
}

/// Execute the `pull` command.
pub fn execute(args: PullArgs, ctx: &Context) -> Result<()> {
    let out = ctx.output();
    let mut workspace = ctx.open_workspace()?;
    let report = workspace
        .pull_node_with_options(args.target.as_deref(), args.force, &args.batch.options())
        .map_err(explain(&workspace))?;
    finish_batch(&out, &report)
}
