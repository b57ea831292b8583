//! # Init Command Implementation
//!
//! This module implements the `init` subcommand, which creates a workspace
//! document and clones the repositories marked (or named) as eager.
//!
//! ## Functionality
//!
//! - **Starter Document**: Writes `.repotree.yaml` with an optional `repos_dir`
//! - **Seed Repositories**: `--repo name=url` adds top-level nodes up front
//! - **Interactive Mode**: Prompts for repositories with `--interactive`
//! - **Eager Clone**: Materializes eager nodes unless `--no-clone`
//!
//! Running `init` in an existing workspace keeps its document and only clones
//! what is missing; `--force` replaces the document.

use std::env;
use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Args;
use dialoguer::{theme::ColorfulTheme, Input};

use repotree::config::{NodeSpec, WorkspaceDocument};
use repotree::defaults::DEFAULT_CONFIG_FILENAME;
use repotree::executor::ExecOptions;
use repotree::output::emoji;
use repotree::workspace::{OpenOptions, Workspace};

use super::{finish_batch, Context};

/// Create a workspace document
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Directory to create the workspace in (defaults to the current directory)
    #[arg(value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// repos_dir setting to write into the document, relative to it
    #[arg(long = "store", value_name = "DIR")]
    pub store: Option<String>,

    /// Seed a top-level repository, as NAME=URL (repeatable)
    #[arg(long = "repo", value_name = "NAME=URL")]
    pub repos: Vec<String>,

    /// Prompt for repositories to add
    #[arg(short, long)]
    pub interactive: bool,

    /// Overwrite an existing document
    #[arg(short, long)]
    pub force: bool,

    /// Do not clone eager repositories after writing the document
    #[arg(long)]
    pub no_clone: bool,
}

/// Execute the `init` command.
pub fn execute(args: InitArgs, ctx: &Context) -> Result<()> {
    let out = ctx.output();
    let cwd = env::current_dir()?;
    let dir = match &args.dir {
        Some(dir) => cwd.join(dir),
        None => cwd,
    };
    let config_path = ctx
        .config
        .clone()
        .unwrap_or_else(|| dir.join(DEFAULT_CONFIG_FILENAME));

    if config_path.exists() && !args.force {
        println!(
            "{} Workspace already initialized: {}",
            emoji(&out, "ℹ️ ", "[INFO]"),
            config_path.display()
        );
    } else {
        let mut nodes = args
            .repos
            .iter()
            .map(|entry| parse_repo_entry(entry))
            .collect::<Result<Vec<_>>>()?;
        if args.interactive {
            nodes.extend(prompt_for_repos()?);
        }

        let document = WorkspaceDocument {
            repos_dir: args.store.clone(),
            nodes,
        };
        Workspace::init(&config_path, &document, args.force)?;
        println!(
            "{} Created {}",
            emoji(&out, "✅", "[OK]"),
            config_path.display()
        );
    }

    if args.no_clone {
        return Ok(());
    }

    let mut workspace = Workspace::open(&OpenOptions {
        config: Some(config_path),
        repos_dir: ctx.repos_dir.clone(),
    })?;
    println!(
        "{} Cloning eager repositories into {}",
        emoji(&out, "📥", "[CLONE]"),
        workspace.repos_dir().display()
    );
    let report = workspace.clone_repos(Some("/"), &ExecOptions::recursive())?;
    finish_batch(&out, &report)
}

/// Parses `name=url`.
fn parse_repo_entry(entry: &str) -> Result<NodeSpec> {
    let (name, url) = entry
        .split_once('=')
        .with_context(|| format!("invalid --repo '{}': expected NAME=URL", entry))?;
    let (name, url) = (name.trim(), url.trim());
    if name.is_empty() || url.is_empty() {
        anyhow::bail!("invalid --repo '{}': expected NAME=URL", entry);
    }
    Ok(NodeSpec::new(name).with_url(url))
}

/// Asks for repositories until an empty URL is entered.
fn prompt_for_repos() -> Result<Vec<NodeSpec>> {
    let theme = ColorfulTheme::default();
    let mut nodes = Vec::new();

    println!();
    println!("Enter repository URLs to add. Leave empty when done.");
    println!();

    loop {
        let url: String = Input::with_theme(&theme)
            .with_prompt("Repository URL")
            .allow_empty(true)
            .interact_text()?;
        let url = url.trim().to_string();
        if url.is_empty() {
            break;
        }

        let default_name = repotree::fetch_mode::repo_basename(&url).to_string();
        let name: String = Input::with_theme(&theme)
            .with_prompt("Node name")
            .default(default_name)
            .interact_text()?;
        nodes.push(NodeSpec::new(name.trim()).with_url(url));
    }
    Ok(nodes)
}
