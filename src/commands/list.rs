//! # List Command Implementation
//!
//! This module implements the `list` subcommand, which shows nodes together
//! with their fetch mode and whether they are cloned.
//!
//! ## Functionality
//!
//! - **Single or Recursive**: The node itself, or its whole subtree with `-r`
//! - **Pattern Filtering**: `--pattern` keeps nodes whose virtual path matches a glob
//! - **JSON Output**: `--json` prints machine-readable rows
//!
//! This command is read-only. It loads external documents it reaches but
//! never clones anything.

use anyhow::Result;
use clap::Args;
use glob::Pattern;

use repotree::materializer::MaterializationState;
use repotree::output::{emoji, OutputConfig};
use repotree::suggestions;
use repotree::workspace::NodeInfo;

use super::{explain, Context};

/// List nodes with their fetch mode and clone state
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Node to list (defaults to the current node)
    #[arg(value_name = "PATH")]
    pub target: Option<String>,

    /// List the whole subtree
    #[arg(short, long)]
    pub recursive: bool,

    /// Only show nodes whose virtual path matches this glob (e.g. "/platform/*")
    #[arg(short, long, value_name = "PATTERN")]
    pub pattern: Option<String>,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

/// Execute the `list` command.
pub fn execute(args: ListArgs, ctx: &Context) -> Result<()> {
    let out = ctx.output();
    let pattern = args
        .pattern
        .as_deref()
        .map(|p| Pattern::new(p).map_err(|e| suggestions::invalid_glob(p, &e)))
        .transpose()?;

    let mut workspace = ctx.open_workspace()?;
    let rows = workspace
        .list_nodes_recursive(args.target.as_deref(), args.recursive)
        .map_err(explain(&workspace))?;
    let rows = filter_rows(rows, pattern.as_ref());

    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if rows.is_empty() {
        println!("No nodes matched.");
        return Ok(());
    }
    for row in &rows {
        println!("{}", format_row(&out, row));
    }
    Ok(())
}

fn filter_rows(rows: Vec<NodeInfo>, pattern: Option<&Pattern>) -> Vec<NodeInfo> {
    match pattern {
        Some(pattern) => rows
            .into_iter()
            .filter(|row| pattern.matches(&row.path) || pattern.matches(&row.name))
            .collect(),
        None => rows,
    }
}

fn format_row(out: &OutputConfig, row: &NodeInfo) -> String {
    let marker = match row.state {
        MaterializationState::Cloned => emoji(out, "📦", "[x]"),
        MaterializationState::Absent => emoji(out, "☁️ ", "[ ]"),
    };
    let label = if row.name.is_empty() { "/" } else { row.name.as_str() };
    let mut line = format!("{}{} {} ({})", "  ".repeat(row.depth), marker, label, row.fetch);
    if let Some(url) = &row.url {
        line.push_str(&format!("  {}", url));
    }
    if let Some(file) = &row.file {
        line.push_str(&format!("  -> {}", file));
    }
    line
}
