//! # Tree Command Implementation
//!
//! This module implements the `tree` subcommand, which renders the workspace
//! hierarchy below a node.
//!
//! ## Functionality
//!
//! - **Hierarchy Visualization**: Draws the tree with `ptree`
//! - **Depth Control**: `--depth` limits how far down the rendering goes
//! - **State Markers**: Shows the fetch mode and whether each node is cloned
//!
//! External documents within the displayed depth are loaded; nothing is cloned.

use anyhow::Result;
use clap::Args;
use ptree::{print_tree, TreeItem};

use repotree::materializer::MaterializationState;
use repotree::workspace::TreeView;

use super::{explain, Context};

/// Display the workspace tree
#[derive(Args, Debug)]
pub struct TreeArgs {
    /// Node to start from (defaults to the current node)
    #[arg(value_name = "PATH")]
    pub target: Option<String>,

    /// Maximum depth to display in the tree.
    ///
    /// If not specified, displays the full tree. Use 0 to show only the
    /// starting node, 1 to show its children, etc.
    #[arg(long, value_name = "NUM")]
    pub depth: Option<usize>,
}

/// Execute the `tree` command.
pub fn execute(args: TreeArgs, ctx: &Context) -> Result<()> {
    let mut workspace = ctx.open_workspace()?;
    let view = workspace
        .show_tree_at_path(args.target.as_deref(), args.depth)
        .map_err(explain(&workspace))?;

    print_tree(&TreeNode::from_view(&view))
        .map_err(|e| anyhow::anyhow!("Failed to display tree: {}", e))?;
    Ok(())
}

/// Tree node structure for ptree visualization
#[derive(Clone)]
struct TreeNode {
    label: String,
    children: Vec<TreeNode>,
}

impl TreeNode {
    fn from_view(view: &TreeView) -> Self {
        let name = if view.path == "/" { "/" } else { view.name.as_str() };
        let state = match view.state {
            MaterializationState::Cloned => "cloned",
            MaterializationState::Absent => "absent",
        };
        let mut label = match &view.url {
            Some(url) => format!("{} [{}, {}] {}", name, view.fetch, state, url),
            None => name.to_string(),
        };
        if view.truncated {
            label.push_str(" ...");
        }
        TreeNode {
            label,
            children: view.children.iter().map(TreeNode::from_view).collect(),
        }
    }
}

impl TreeItem for TreeNode {
    type Child = TreeNode;

    fn write_self<W: std::io::Write>(
        &self,
        f: &mut W,
        _style: &ptree::Style,
    ) -> std::io::Result<()> {
        write!(f, "{}", self.label)
    }

    fn children(&self) -> std::borrow::Cow<'_, [Self::Child]> {
        std::borrow::Cow::Borrowed(&self.children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use repotree::fetch_mode::FetchMode;

    fn view(path: &str, url: Option<&str>, children: Vec<TreeView>) -> TreeView {
        TreeView {
            name: path.rsplit('/').next().unwrap_or_default().to_string(),
            path: path.to_string(),
            url: url.map(str::to_string),
            fetch: FetchMode::Eager,
            state: MaterializationState::Absent,
            truncated: false,
            children,
        }
    }

    #[test]
    fn test_labels() {
        let root = view(
            "/",
            None,
            vec![view(
                "/core",
                Some("https://example.com/core-munorepo.git"),
                Vec::new(),
            )],
        );
        let node = TreeNode::from_view(&root);
        assert_eq!(node.label, "/");
        assert_eq!(
            node.children[0].label,
            "core [eager, absent] https://example.com/core-munorepo.git"
        );
    }

    #[test]
    fn test_truncated_marker() {
        let mut group = view("/group", None, Vec::new());
        group.truncated = true;
        assert_eq!(TreeNode::from_view(&group).label, "group ...");
    }

    #[test]
    fn test_rendering_writes_every_label() {
        let root = view("/", None, vec![view("/a", None, vec![view("/a/b", None, Vec::new())])]);
        let mut buffer = Vec::new();
        ptree::write_tree(&TreeNode::from_view(&root), &mut buffer).unwrap();
        let rendered = String::from_utf8(buffer).unwrap();
        assert!(rendered.contains('a'));
        assert!(rendered.contains('b'));
    }
}
