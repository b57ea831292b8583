//! # Remove Command Implementation
//!
//! This module implements the `remove` subcommand, which takes a node and its
//! subtree out of the workspace document.
//!
//! Working copies stay on disk unless `--purge` is given, and purging asks
//! for confirmation unless `--yes` is given as well.

use anyhow::Result;
use clap::Args;
use dialoguer::{theme::ColorfulTheme, Confirm};

use repotree::output::emoji;

use super::{explain, Context};

/// Remove a node from the workspace
#[derive(Args, Debug)]
pub struct RemoveArgs {
    /// Node to remove
    #[arg(value_name = "PATH")]
    pub target: String,

    /// Also delete the node's directory and everything below it
    #[arg(long)]
    pub purge: bool,

    /// Do not ask for confirmation
    #[arg(short, long)]
    pub yes: bool,
}

/// Execute the `remove` command.
pub fn execute(args: RemoveArgs, ctx: &Context) -> Result<()> {
    let out = ctx.output();
    let mut workspace = ctx.open_workspace()?;

    let mut purge = args.purge;
    if purge && !args.yes {
        let dir = workspace
            .resolve_path(Some(&args.target), false)
            .map_err(explain(&workspace))?;
        purge = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(format!(
                "Delete {} and everything below it?",
                dir.display()
            ))
            .default(false)
            .interact()?;
        if !purge {
            println!("Keeping the directory; removing the node only.");
        }
    }

    let removed = workspace
        .remove_node(Some(&args.target), purge)
        .map_err(explain(&workspace))?;
    println!("{} Removed {}", emoji(&out, "🗑️ ", "[OK]"), removed.path);
    if removed.purged {
        println!("   Deleted {}", removed.physical.display());
    } else if removed.physical.exists() {
        println!("   Left {} on disk", removed.physical.display());
    }
    Ok(())
}
