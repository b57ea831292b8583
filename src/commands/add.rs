//! # Add Command Implementation
//!
//! This module implements the `add` subcommand, which adds a node to the
//! workspace and saves the document that defines its parent's children.
//!
//! ## Functionality
//!
//! - **Repository Nodes**: `add NAME URL` adds a repository
//! - **Containers**: `add NAME` without a URL adds an organizational node
//! - **External Subtrees**: `--file` makes the node's children come from another document
//! - **Fetch Override**: `--fetch eager|lazy` overrides the URL-derived mode
//! - **Immediate Clone**: `--clone` materializes the new node right away

use anyhow::Result;
use clap::Args;

use repotree::fetch_mode::FetchMode;
use repotree::output::emoji;

use super::{explain, Context};

/// Add a node to the workspace
#[derive(Args, Debug)]
pub struct AddArgs {
    /// Name of the new node
    #[arg(value_name = "NAME")]
    pub name: String,

    /// Repository URL (omit for a container node)
    #[arg(value_name = "URL")]
    pub url: Option<String>,

    /// Parent node (defaults to the current node)
    #[arg(short, long, value_name = "PATH")]
    pub parent: Option<String>,

    /// Fetch mode, overriding the one derived from the URL
    #[arg(long, value_name = "MODE")]
    pub fetch: Option<FetchMode>,

    /// Load the node's children from this document (relative to the parent's document)
    #[arg(long, value_name = "FILE")]
    pub file: Option<String>,

    /// Clone the new node immediately
    #[arg(long)]
    pub clone: bool,
}

/// Execute the `add` command.
pub fn execute(args: AddArgs, ctx: &Context) -> Result<()> {
    let out = ctx.output();
    let mut workspace = ctx.open_workspace()?;

    let path = workspace
        .add_repo_simple(
            args.parent.as_deref(),
            &args.name,
            args.url.as_deref(),
            args.fetch,
            args.file.as_deref(),
        )
        .map_err(explain(&workspace))?;
    println!("{} Added {}", emoji(&out, "✅", "[OK]"), path);

    if args.clone {
        let dir = workspace
            .resolve_path(Some(&path), true)
            .map_err(explain(&workspace))?;
        println!(
            "{} Cloned into {}",
            emoji(&out, "📥", "[CLONE]"),
            dir.display()
        );
    }
    Ok(())
}
