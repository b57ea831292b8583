//! # Use Command Implementation
//!
//! This module implements the `use` subcommand, which moves the stored
//! position that commands default to when run outside any node's directory.
//!
//! - `repotree use PATH` sets the position (relative paths start at the current node)
//! - `repotree use --clear` forgets it
//! - `repotree use` prints the current node and the stored position

use anyhow::Result;
use clap::Args;

use repotree::output::emoji;

use super::{explain, Context};

/// Show, set or clear the current position in the tree
#[derive(Args, Debug)]
pub struct UseArgs {
    /// Node to move to
    #[arg(value_name = "PATH", conflicts_with = "clear")]
    pub target: Option<String>,

    /// Forget the stored position
    #[arg(long)]
    pub clear: bool,
}

/// Execute the `use` command.
pub fn execute(args: UseArgs, ctx: &Context) -> Result<()> {
    let out = ctx.output();
    let mut workspace = ctx.open_workspace()?;

    if args.clear {
        workspace.clear_position()?;
        println!("{} Position cleared", emoji(&out, "✅", "[OK]"));
        return Ok(());
    }

    match args.target {
        Some(target) => {
            let path = workspace
                .use_position(&target)
                .map_err(explain(&workspace))?;
            println!("{} Now at {}", emoji(&out, "📍", "[POS]"), path);
        }
        None => {
            let current = workspace.current_node().map_err(explain(&workspace))?;
            println!("{}", current);
            if let Some(stored) = workspace.current_position()? {
                if stored != current {
                    println!("(stored position: {})", stored);
                }
            }
        }
    }
    Ok(())
}
