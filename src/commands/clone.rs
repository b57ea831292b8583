//! # Clone Command Implementation
//!
//! This module implements the `clone` subcommand.
//!
//! The named node is always cloned. With `-r` its eager descendants are
//! cloned too, and with `--include-lazy` every descendant. Already cloned
//! repositories are left untouched.

use anyhow::Result;
use clap::Args;

use super::{explain, finish_batch, BatchArgs, Context};

/// Clone repositories
#[derive(Args, Debug)]
pub struct CloneArgs {
    /// Node to clone (defaults to the current node)
    #[arg(value_name = "PATH")]
    pub target: Option<String>,

    #[command(flatten)]
    pub batch: BatchArgs,
}

/// Execute the `clone` command.
pub fn execute(args: CloneArgs, ctx: &Context) -> Result<()> {
    let out = ctx.output();
    let mut workspace = ctx.open_workspace()?;
    let report = workspace
        .clone_repos(args.target.as_deref(), &args.batch.options())
        .map_err(explain(&workspace))?;
    finish_batch(&out, &report)
}
