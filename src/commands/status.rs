//! # Status Command Implementation
//!
//! This module implements the `status` subcommand, which reports the branch
//! and working-copy state of cloned repositories.
//!
//! Nodes that are not cloned, or have no repository, are listed as skipped.
//! Nothing is cloned or modified.

use anyhow::Result;
use clap::Args;

use super::{explain, finish_batch, sequential, Context};

/// Show branch and working-copy state of cloned repositories
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Node to inspect (defaults to the current node)
    #[arg(value_name = "PATH")]
    pub target: Option<String>,

    /// Include the whole subtree
    #[arg(short, long)]
    pub recursive: bool,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

/// Execute the `status` command.
pub fn execute(args: StatusArgs, ctx: &Context) -> Result<()> {
    let out = ctx.output();
    let mut workspace = ctx.open_workspace()?;
    let report = workspace
        .status_node(args.target.as_deref(), &sequential(args.recursive))
        .map_err(explain(&workspace))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        if report.has_failures() {
            anyhow::bail!("status failed for some nodes");
        }
        return Ok(());
    }
    finish_batch(&out, &report)
}
