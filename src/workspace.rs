//! # Workspace Manager
//!
//! The facade the command line talks to. A [`Workspace`] owns the tree and
//! composes the resolver, the materializer, the executor and the position
//! store; every user-facing operation is one method here.
//!
//! Targets are optional virtual paths. `None` means "where I am", worked out
//! from the current directory, then the stored position, then the root.
//! Relative targets start from that same node.

use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info};
use serde::Serialize;

use crate::config::{self, NodeSpec, WorkspaceDocument};
use crate::defaults;
use crate::error::{Error, Result};
use crate::executor::{BatchReport, ExecOptions, Executor, Operation};
use crate::fetch_mode::FetchMode;
use crate::materializer::{MaterializationState, Materializer};
use crate::path::{absolutize, expand_home};
use crate::position::{FilePositionStore, PositionStore};
use crate::repository::{GitOperations, SystemGit};
use crate::resolver::PathResolver;
use crate::tree::{NodeId, WorkspaceTree};

/// Where to find a workspace.
#[derive(Debug, Clone, Default)]
pub struct OpenOptions {
    /// Explicit workspace document. Searched for upward from the current
    /// directory when absent.
    pub config: Option<PathBuf>,
    /// Overrides the document's `repos_dir`.
    pub repos_dir: Option<PathBuf>,
}

/// One row of `list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeInfo {
    pub path: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub fetch: FetchMode,
    pub state: MaterializationState,
    /// Depth below the node the listing started from.
    pub depth: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

/// A subtree snapshot for `tree`.
#[derive(Debug, Clone, Serialize)]
pub struct TreeView {
    pub name: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub fetch: FetchMode,
    pub state: MaterializationState,
    /// Set when children exist below the display depth.
    pub truncated: bool,
    pub children: Vec<TreeView>,
}

/// What `remove` did.
#[derive(Debug, Clone)]
pub struct RemovedNode {
    pub path: String,
    pub physical: PathBuf,
    pub spec: NodeSpec,
    pub purged: bool,
}

/// Decides where working copies live.
///
/// An explicit override wins, then the document's `repos_dir` (relative to
/// the document, `~/` allowed), then the document's own directory.
pub fn resolve_repos_dir(
    config_path: &Path,
    setting: Option<&str>,
    override_dir: Option<&Path>,
    cwd: &Path,
) -> PathBuf {
    let config_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
    if let Some(dir) = override_dir {
        return absolutize(cwd, dir);
    }
    match setting {
        Some(setting) => absolutize(config_dir, &expand_home(setting)),
        None => config_dir.to_path_buf(),
    }
}

/// A loaded workspace and everything needed to act on it.
pub struct Workspace {
    tree: WorkspaceTree,
    resolver: PathResolver,
    materializer: Arc<Materializer>,
    executor: Executor,
    positions: Box<dyn PositionStore>,
    cwd: Option<PathBuf>,
}

impl Workspace {
    /// Assembles a workspace from explicit parts.
    pub fn with_components(
        tree: WorkspaceTree,
        repos_dir: &Path,
        git: Arc<dyn GitOperations>,
        positions: Box<dyn PositionStore>,
        cwd: Option<PathBuf>,
    ) -> Self {
        let materializer = Arc::new(Materializer::new(git.clone()));
        let executor = Executor::new(git, materializer.clone());
        Self {
            tree,
            resolver: PathResolver::new(repos_dir),
            materializer,
            executor,
            positions,
            cwd,
        }
    }

    /// Opens the workspace with system git and a file position store.
    pub fn open(options: &OpenOptions) -> Result<Self> {
        let cwd = env::current_dir()?;
        let config_path = match &options.config {
            Some(path) => absolutize(&cwd, path),
            None => defaults::find_config(&cwd).ok_or_else(|| Error::Config {
                message: format!(
                    "no {} found in {} or any parent directory",
                    defaults::DEFAULT_CONFIG_FILENAME,
                    cwd.display()
                ),
                hint: Some(
                    "Run 'repotree init' to create a workspace, or pass --config".to_string(),
                ),
            })?,
        };
        debug!("Opening workspace {}", config_path.display());

        let tree = WorkspaceTree::load(&config_path)?;
        let repos_dir = resolve_repos_dir(
            &config_path,
            tree.repos_dir_setting(),
            options.repos_dir.as_deref(),
            &cwd,
        );
        let positions = Box::new(FilePositionStore::beside(&config_path));
        Ok(Self::with_components(
            tree,
            &repos_dir,
            Arc::new(SystemGit),
            positions,
            Some(cwd),
        ))
    }

    /// Writes a new root document.
    ///
    /// Refuses to overwrite an existing document unless `overwrite` is set.
    pub fn init(config_path: &Path, document: &WorkspaceDocument, overwrite: bool) -> Result<()> {
        if config_path.exists() && !overwrite {
            return Err(Error::Config {
                message: format!("{} already exists", config_path.display()),
                hint: Some("Use --force to overwrite it".to_string()),
            });
        }
        for node in &document.nodes {
            config::validate_name(&node.name)?;
        }
        config::save(config_path, document)?;
        info!("Created workspace document {}", config_path.display());
        Ok(())
    }

    pub fn tree(&self) -> &WorkspaceTree {
        &self.tree
    }

    pub fn repos_dir(&self) -> &Path {
        self.resolver.repos_dir()
    }

    /// Names of every loaded node, for suggestions.
    pub fn node_names(&self) -> Vec<String> {
        self.tree.names()
    }

    fn target(&mut self, target: Option<&str>) -> Result<NodeId> {
        self.resolver.resolve_target(
            &mut self.tree,
            target,
            self.cwd.as_deref(),
            self.positions.as_ref(),
        )
    }

    fn state(&self, id: NodeId) -> MaterializationState {
        let target = self.resolver.target(&self.tree, id);
        if self.materializer.is_materialized(&target) {
            MaterializationState::Cloned
        } else {
            MaterializationState::Absent
        }
    }

    /// Physical directory of a node, cloning it first when `ensure` is set.
    pub fn resolve_path(&mut self, target: Option<&str>, ensure: bool) -> Result<PathBuf> {
        let id = self.target(target)?;
        self.resolver
            .resolve(&self.tree, &self.materializer, id, ensure)
    }

    /// Virtual path of the node containing `physical`, if any.
    pub fn physical_to_virtual(&mut self, physical: &Path) -> Result<Option<String>> {
        let base = match &self.cwd {
            Some(cwd) => absolutize(cwd, physical),
            None => physical.to_path_buf(),
        };
        Ok(self
            .resolver
            .physical_to_virtual(&mut self.tree, &base)?
            .map(|id| self.tree.virtual_path(id)))
    }

    /// Virtual path of the node commands default to.
    pub fn current_node(&mut self) -> Result<String> {
        let id = self.target(None)?;
        Ok(self.tree.virtual_path(id))
    }

    fn run(
        &mut self,
        target: Option<&str>,
        operation: Operation,
        options: &ExecOptions,
    ) -> Result<BatchReport> {
        let start = self.target(target)?;
        self.executor
            .apply(&mut self.tree, &self.resolver, start, &operation, options)
    }

    /// Clones the target and, recursively, its eager descendants (all of them
    /// with `include_lazy`).
    pub fn clone_repos(&mut self, target: Option<&str>, options: &ExecOptions) -> Result<BatchReport> {
        self.run(target, Operation::Clone, options)
    }

    /// Fast-forwards already cloned repositories.
    pub fn pull_node(&mut self, target: Option<&str>, options: &ExecOptions) -> Result<BatchReport> {
        self.pull_node_with_options(target, false, options)
    }

    /// Pulls, optionally discarding local divergence.
    pub fn pull_node_with_options(
        &mut self,
        target: Option<&str>,
        force: bool,
        options: &ExecOptions,
    ) -> Result<BatchReport> {
        self.run(target, Operation::Pull { force }, options)
    }

    pub fn commit_node(
        &mut self,
        target: Option<&str>,
        message: &str,
        options: &ExecOptions,
    ) -> Result<BatchReport> {
        self.run(
            target,
            Operation::Commit {
                message: message.to_string(),
            },
            options,
        )
    }

    pub fn push_node(&mut self, target: Option<&str>, options: &ExecOptions) -> Result<BatchReport> {
        self.run(target, Operation::Push, options)
    }

    pub fn status_node(&mut self, target: Option<&str>, options: &ExecOptions) -> Result<BatchReport> {
        self.run(target, Operation::Status, options)
    }

    /// Lists the target, and its whole subtree when `recursive` is set.
    pub fn list_nodes_recursive(
        &mut self,
        target: Option<&str>,
        recursive: bool,
    ) -> Result<Vec<NodeInfo>> {
        let start = self.target(target)?;
        let options = ExecOptions {
            recursive,
            ..ExecOptions::default()
        };
        let report =
            self.executor
                .apply(&mut self.tree, &self.resolver, start, &Operation::List, &options)?;

        let base_depth = self.tree.depth(start);
        let mut rows = Vec::with_capacity(report.results().len());
        for result in report.results() {
            let Some(id) = self.tree.lookup(&result.path) else {
                continue;
            };
            let node = self.tree.node(id);
            rows.push(NodeInfo {
                path: result.path.clone(),
                name: node.name().to_string(),
                url: node.url().map(str::to_string),
                fetch: node.fetch_mode(),
                state: self.state(id),
                depth: self.tree.depth(id) - base_depth,
                file: node.external_reference().map(str::to_string),
            });
        }
        Ok(rows)
    }

    /// Snapshot of the subtree at `target`, `depth` levels deep (unbounded
    /// when `None`). External documents within reach are loaded.
    pub fn show_tree_at_path(
        &mut self,
        target: Option<&str>,
        depth: Option<usize>,
    ) -> Result<TreeView> {
        let start = self.target(target)?;
        self.tree_view(start, depth.unwrap_or(usize::MAX))
    }

    fn tree_view(&mut self, id: NodeId, remaining: usize) -> Result<TreeView> {
        let children = self.tree.children(id)?;
        let truncated = remaining == 0 && !children.is_empty();
        let children = if remaining == 0 {
            Vec::new()
        } else {
            children
                .into_iter()
                .map(|child| self.tree_view(child, remaining - 1))
                .collect::<Result<Vec<_>>>()?
        };
        let node = self.tree.node(id);
        Ok(TreeView {
            name: node.name().to_string(),
            path: self.tree.virtual_path(id),
            url: node.url().map(str::to_string),
            fetch: node.fetch_mode(),
            state: self.state(id),
            truncated,
            children,
        })
    }

    /// Adds a node under `parent` and saves the document that defines the
    /// parent's children. Returns the new node's virtual path.
    pub fn add_repo_simple(
        &mut self,
        parent: Option<&str>,
        name: &str,
        url: Option<&str>,
        fetch: Option<FetchMode>,
        file: Option<&str>,
    ) -> Result<String> {
        let parent = self.target(parent)?;
        let mut spec = NodeSpec::new(name);
        spec.url = url.map(str::to_string);
        spec.fetch = fetch;
        spec.file = file.map(str::to_string);

        let id = self.tree.insert_child(parent, spec)?;
        let document = self.tree.save_document(parent)?;

        let path = self.tree.virtual_path(id);
        info!("Added {} to {}", path, document.display());
        Ok(path)
    }

    /// Removes a node and its subtree from the configuration.
    ///
    /// With `purge` the node's working directory is deleted as well; without
    /// it nothing on disk is touched. A stored position inside the removed
    /// subtree is cleared.
    pub fn remove_node(&mut self, target: Option<&str>, purge: bool) -> Result<RemovedNode> {
        let id = self.target(target)?;
        let parent = self.tree.node(id).parent().ok_or_else(|| Error::Config {
            message: "the workspace root cannot be removed".to_string(),
            hint: Some("Remove individual nodes instead".to_string()),
        })?;

        let path = self.tree.virtual_path(id);
        let materialize_target = self.resolver.target(&self.tree, id);
        let spec = self.tree.remove_subtree(id)?;
        let document = self.tree.save_document(parent)?;
        info!("Removed {} from {}", path, document.display());

        if let Some(position) = self.positions.get()? {
            if position == path || position.starts_with(&format!("{}/", path)) {
                self.positions.clear()?;
            }
        }

        if purge {
            self.materializer.discard(&materialize_target)?;
        }
        Ok(RemovedNode {
            path,
            physical: materialize_target.physical,
            spec,
            purged: purge,
        })
    }

    /// Moves the stored position. Returns the new virtual path.
    pub fn use_position(&mut self, target: &str) -> Result<String> {
        let id = self.target(Some(target))?;
        let path = self.tree.virtual_path(id);
        self.positions.set(&path)?;
        Ok(path)
    }

    /// The stored position, as written.
    pub fn current_position(&self) -> Result<Option<String>> {
        self.positions.get()
    }

    pub fn clear_position(&self) -> Result<()> {
        self.positions.clear()
    }
}
