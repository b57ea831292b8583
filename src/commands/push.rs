//! # Push Command Implementation
//!
//! This module implements the `push` subcommand.

use anyhow::Result;
use clap::Args;

use super::{explain, finish_batch, sequential, Context};

/// Push repositories to their upstream
#[derive(Args, Debug)]
pub struct PushArgs {
    /// Node to push (defaults to the current node)
    #[arg(value_name = "PATH")]
    pub target: Option<String>,

    /// Include the whole subtree
    #[arg(short, long)]
    pub recursive: bool,
}

/// Execute the `push` command.
pub fn execute(args: PushArgs, ctx: &Context) -> Result<()> {
    let out = ctx.output();
    let mut workspace = ctx.open_workspace()?;
    let report = workspace
        .push_node(args.target.as_deref(), &sequential(args.recursive))
        .map_err(explain(&workspace))?;
    finish_batch(&out, &report)
}
