//! # Path Resolver
//!
//! Maps between virtual tree paths and physical directories, and decides
//! which node a command acts on when the user names none.
//!
//! The physical layout is fixed: node `/a/b` lives in `<repos_dir>/a/b` and
//! the root is `<repos_dir>` itself. That makes the inverse mapping exact:
//! a directory is mapped back by walking its components below `repos_dir`
//! through the tree.
//!
//! ## Current node
//!
//! Each invocation re-derives where the user "is":
//!
//! 1. the node whose directory contains the process's working directory,
//! 2. otherwise the persisted position,
//! 3. otherwise the root.

use std::path::{Component, Path, PathBuf};

use log::{debug, warn};

use crate::error::{Error, Result};
use crate::materializer::{MaterializeTarget, Materializer};
use crate::path::canonicalize_lenient;
use crate::position::PositionStore;
use crate::tree::{NodeId, WorkspaceTree};

/// Translates between virtual paths and directories under `repos_dir`.
#[derive(Debug, Clone)]
pub struct PathResolver {
    repos_dir: PathBuf,
}

impl PathResolver {
    pub fn new(repos_dir: &Path) -> Self {
        Self {
            repos_dir: canonicalize_lenient(repos_dir),
        }
    }

    /// Directory holding every working copy.
    pub fn repos_dir(&self) -> &Path {
        &self.repos_dir
    }

    /// Physical directory of a node, whether or not it exists yet.
    pub fn physical_path(&self, tree: &WorkspaceTree, id: NodeId) -> PathBuf {
        let mut path = self.repos_dir.clone();
        for segment in tree.segments(id) {
            path.push(segment);
        }
        path
    }

    /// Describes a node for the materializer.
    pub fn target(&self, tree: &WorkspaceTree, id: NodeId) -> MaterializeTarget {
        MaterializeTarget {
            virtual_path: tree.virtual_path(id),
            url: tree.node(id).url().map(str::to_string),
            physical: self.physical_path(tree, id),
        }
    }

    /// Finds the deepest node whose directory contains `physical`.
    ///
    /// Returns `None` when the path lies outside `repos_dir`. A path inside a
    /// node's working copy (say `api/src/bin`) maps to that node.
    pub fn physical_to_virtual(
        &self,
        tree: &mut WorkspaceTree,
        physical: &Path,
    ) -> Result<Option<NodeId>> {
        let physical = canonicalize_lenient(physical);
        let relative = match physical.strip_prefix(&self.repos_dir) {
            Ok(relative) => relative,
            Err(_) => return Ok(None),
        };

        let mut current = tree.root();
        for component in relative.components() {
            let name = match component {
                Component::Normal(name) => name.to_string_lossy(),
                _ => break,
            };
            tree.expand(current)?;
            match tree.find_child(current, &name) {
                Some(child) => current = child,
                None => break,
            }
        }
        Ok(Some(current))
    }

    /// Node the user is at: CWD first, then the stored position, then root.
    pub fn current_node(
        &self,
        tree: &mut WorkspaceTree,
        cwd: Option<&Path>,
        positions: &dyn PositionStore,
    ) -> Result<NodeId> {
        if let Some(cwd) = cwd {
            if let Some(id) = self.physical_to_virtual(tree, cwd)? {
                debug!("Working directory maps to {}", tree.virtual_path(id));
                return Ok(id);
            }
        }

        if let Some(position) = positions.get()? {
            match tree.resolve(&position) {
                Ok(id) => {
                    debug!("Using stored position {}", position);
                    return Ok(id);
                }
                Err(Error::NodeNotFound { .. }) => {
                    warn!(
                        "Stored position {} no longer exists in the workspace; using the root",
                        position
                    );
                }
                Err(err) => return Err(err),
            }
        }

        Ok(tree.root())
    }

    /// Resolves a user-supplied target to a node.
    ///
    /// `None` means "where I am". Relative paths start at the current node,
    /// absolute ones (`/`, `~`, `~/...`) at the root.
    pub fn resolve_target(
        &self,
        tree: &mut WorkspaceTree,
        target: Option<&str>,
        cwd: Option<&Path>,
        positions: &dyn PositionStore,
    ) -> Result<NodeId> {
        let current = self.current_node(tree, cwd, positions)?;
        match target {
            None => Ok(current),
            Some(path) => tree.resolve_virtual_path(current, path),
        }
    }

    /// Physical directory of `id`, cloning it first when `ensure` is set.
    pub fn resolve(
        &self,
        tree: &WorkspaceTree,
        materializer: &Materializer,
        id: NodeId,
        ensure: bool,
    ) -> Result<PathBuf> {
        let target = self.target(tree, id);
        if ensure {
            materializer.ensure(&target)?;
        }
        Ok(target.physical)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config;
    use crate::materializer::tests::MockGit;
    use crate::position::MemoryPositionStore;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn workspace(dir: &Path) -> (WorkspaceTree, PathResolver) {
        let doc = config::parse(
            r#"
nodes:
  - name: platform
    children:
      - name: api
        url: https://example.com/api.git
      - name: web
        url: https://example.com/web.git
  - name: tools
"#,
        )
        .unwrap();
        let tree = WorkspaceTree::from_document(&dir.join(".repotree.yaml"), &doc).unwrap();
        (tree, PathResolver::new(dir))
    }

    #[test]
    fn test_physical_layout() {
        let temp_dir = TempDir::new().unwrap();
        let (mut tree, resolver) = workspace(temp_dir.path());
        let api = tree.resolve("/platform/api").unwrap();
        assert_eq!(
            resolver.physical_path(&tree, api),
            resolver.repos_dir().join("platform").join("api")
        );
        assert_eq!(resolver.physical_path(&tree, tree.root()), resolver.repos_dir());
    }

    #[test]
    fn test_physical_to_virtual_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let (mut tree, resolver) = workspace(temp_dir.path());
        for path in ["/", "/platform", "/platform/api", "/platform/web", "/tools"] {
            let id = tree.resolve(path).unwrap();
            let physical = resolver.physical_path(&tree, id);
            let back = resolver.physical_to_virtual(&mut tree, &physical).unwrap();
            assert_eq!(back, Some(id), "round trip failed for {}", path);
        }
    }

    #[test]
    fn test_physical_to_virtual_inside_working_copy() {
        let temp_dir = TempDir::new().unwrap();
        let (mut tree, resolver) = workspace(temp_dir.path());
        let nested = temp_dir.path().join("platform/api/src/bin");
        fs::create_dir_all(&nested).unwrap();
        let id = resolver.physical_to_virtual(&mut tree, &nested).unwrap().unwrap();
        assert_eq!(tree.virtual_path(id), "/platform/api");
    }

    #[test]
    fn test_physical_to_virtual_outside_workspace() {
        let temp_dir = TempDir::new().unwrap();
        let other = TempDir::new().unwrap();
        let (mut tree, resolver) = workspace(temp_dir.path());
        assert_eq!(
            resolver.physical_to_virtual(&mut tree, other.path()).unwrap(),
            None
        );
    }

    #[test]
    fn test_current_node_precedence() {
        let temp_dir = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        let (mut tree, resolver) = workspace(temp_dir.path());
        let positions = MemoryPositionStore::with_position("/tools");

        // CWD inside a node wins over the stored position.
        let web_dir = temp_dir.path().join("platform/web");
        let id = resolver
            .current_node(&mut tree, Some(&web_dir), &positions)
            .unwrap();
        assert_eq!(tree.virtual_path(id), "/platform/web");

        // Outside the workspace the position applies.
        let id = resolver
            .current_node(&mut tree, Some(outside.path()), &positions)
            .unwrap();
        assert_eq!(tree.virtual_path(id), "/tools");

        // Nothing stored: root.
        let empty = MemoryPositionStore::new();
        let id = resolver
            .current_node(&mut tree, Some(outside.path()), &empty)
            .unwrap();
        assert_eq!(id, tree.root());
    }

    #[test]
    fn test_stale_position_falls_back_to_root() {
        let temp_dir = TempDir::new().unwrap();
        let (mut tree, resolver) = workspace(temp_dir.path());
        let positions = MemoryPositionStore::with_position("/gone/away");
        let id = resolver.current_node(&mut tree, None, &positions).unwrap();
        assert_eq!(id, tree.root());
    }

    #[test]
    fn test_resolve_target_relative_to_current() {
        let temp_dir = TempDir::new().unwrap();
        let (mut tree, resolver) = workspace(temp_dir.path());
        let positions = MemoryPositionStore::with_position("/platform");

        let id = resolver
            .resolve_target(&mut tree, Some("api"), None, &positions)
            .unwrap();
        assert_eq!(tree.virtual_path(id), "/platform/api");

        let id = resolver
            .resolve_target(&mut tree, Some("/tools"), None, &positions)
            .unwrap();
        assert_eq!(tree.virtual_path(id), "/tools");

        let err = resolver
            .resolve_target(&mut tree, Some("nope"), None, &positions)
            .unwrap_err();
        assert!(matches!(err, Error::NodeNotFound { ref segment, .. } if segment == "nope"));
    }

    #[test]
    fn test_resolve_with_and_without_ensure() {
        let temp_dir = TempDir::new().unwrap();
        let (mut tree, resolver) = workspace(temp_dir.path());
        let git = Arc::new(MockGit::default());
        let materializer = Materializer::new(git.clone());
        let api = tree.resolve("/platform/api").unwrap();

        let path = resolver.resolve(&tree, &materializer, api, false).unwrap();
        assert!(!path.exists());
        assert!(git.calls().is_empty());

        let ensured = resolver.resolve(&tree, &materializer, api, true).unwrap();
        assert_eq!(path, ensured);
        assert!(ensured.join(".git").exists());
        assert_eq!(git.calls(), vec!["clone https://example.com/api.git"]);
    }
}
