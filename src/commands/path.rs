//! # Path Command Implementation
//!
//! This module implements the `path` subcommand, which prints where a node
//! lives on disk, or where the current directory is in the tree.
//!
//! `repotree path` without arguments prints the directory of the current
//! node, which makes `cd "$(repotree path api)"` work from anywhere in the
//! workspace. `--ensure` clones a lazy node first.

use std::path::Path;

use anyhow::{anyhow, Result};
use clap::Args;

use super::{explain, Context};

/// Print the directory of a node
#[derive(Args, Debug)]
pub struct PathArgs {
    /// Node to resolve (defaults to the current node)
    #[arg(value_name = "PATH")]
    pub target: Option<String>,

    /// Clone the node first if it is not on disk yet
    #[arg(short, long)]
    pub ensure: bool,

    /// Print the virtual path of the node instead of its directory
    #[arg(long = "virtual", conflicts_with = "ensure")]
    pub show_virtual: bool,
}

/// Execute the `path` command.
///
/// Resolving an explicit target moves the stored position there.
pub fn execute(args: PathArgs, ctx: &Context) -> Result<()> {
    let mut workspace = ctx.open_workspace()?;
    let target = args.target.as_deref();

    let physical = workspace
        .resolve_path(target, args.ensure)
        .map_err(explain(&workspace))?;

    if let Some(target) = target {
        workspace
            .use_position(target)
            .map_err(explain(&workspace))?;
    }

    if args.show_virtual {
        let virtual_path = workspace
            .physical_to_virtual(&physical)
            .map_err(explain(&workspace))?;
        println!("{}", virtual_label(virtual_path, &physical, workspace.repos_dir())?);
        return Ok(());
    }

    println!("{}", physical.display());
    Ok(())
}

/// The virtual path to print, or an error when `physical` maps to no node.
fn virtual_label(virtual_path: Option<String>, physical: &Path, repos_dir: &Path) -> Result<String> {
    virtual_path.ok_or_else(|| {
        anyhow!(
            "{} is not inside the workspace (repositories live in {})",
            physical.display(),
            repos_dir.display()
        )
    })
}
