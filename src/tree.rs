//! # Workspace Tree Model
//!
//! The in-memory hierarchy of repository nodes built from one or more
//! workspace documents.
//!
//! ## Ownership
//!
//! All nodes live in a single arena owned by [`WorkspaceTree`] and are
//! addressed by [`NodeId`]. Parents own their children through the id lists;
//! the parent link is a plain id, so there are no reference cycles and upward
//! path reconstruction stays cheap. Removing a subtree only detaches it: ids
//! stay valid for the lifetime of the tree, they just stop being reachable.
//!
//! ## External documents
//!
//! A node with a `file:` reference has no inline children. The referenced
//! document is loaded through the [`DocumentLoader`] the first time anything
//! needs the node's children (path resolution, traversal, editing), and its
//! nodes are grafted in as children. The chain of documents from the root to
//! the node forms the loader's load-order stack, which is what turns
//! `a.yaml -> b.yaml -> a.yaml` into a [`Error::CyclicReference`].
//!
//! ## Virtual paths
//!
//! `/` and `~` name the root, `.` is the current node, `..` the parent
//! (clamped at the root). Paths starting with `/` or `~/` resolve from the
//! root, anything else from a caller-supplied base node.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::debug;

use crate::config::{self, NodeSpec, WorkspaceDocument};
use crate::error::{Error, Result};
use crate::fetch_mode::{classify_fetch_mode, FetchMode};
use crate::loader::DocumentLoader;

/// Handle to a node inside a [`WorkspaceTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// A `file:` reference and, once followed, the document it resolved to.
#[derive(Debug, Clone)]
struct ExternalRef {
    reference: String,
    resolved: Option<PathBuf>,
}

/// A vertex of the workspace tree.
#[derive(Debug, Clone)]
pub struct Node {
    name: String,
    url: Option<String>,
    fetch: Option<FetchMode>,
    external: Option<ExternalRef>,
    document: PathBuf,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    detached: bool,
}

impl Node {
    /// Node name; empty for the root.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Repository URL, if the node has one.
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Fetch mode written in the document, if any.
    pub fn explicit_fetch(&self) -> Option<FetchMode> {
        self.fetch
    }

    /// Effective fetch mode, derived from the URL unless overridden.
    pub fn fetch_mode(&self) -> FetchMode {
        classify_fetch_mode(self.url.as_deref(), self.fetch)
    }

    /// The `file:` reference as written, if the node has one.
    pub fn external_reference(&self) -> Option<&str> {
        self.external.as_ref().map(|e| e.reference.as_str())
    }

    /// Whether the node's external document has been loaded.
    pub fn is_expanded(&self) -> bool {
        self.external
            .as_ref()
            .map_or(true, |external| external.resolved.is_some())
    }

    /// Identity of the document that declared this node.
    pub fn document(&self) -> &Path {
        &self.document
    }

    /// Parent node; `None` for the root.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in declaration order. Unexpanded external nodes report none.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// The merged tree of every loaded workspace document.
#[derive(Debug)]
pub struct WorkspaceTree {
    nodes: Vec<Node>,
    root: NodeId,
    index: HashMap<String, NodeId>,
    loader: DocumentLoader,
    root_document: PathBuf,
    repos_dir: Option<String>,
}

/// Renders the virtual path of a child given its parent's path.
pub fn join_virtual(parent: &str, name: &str) -> String {
    if parent == "/" {
        format!("/{}", name)
    } else {
        format!("{}/{}", parent, name)
    }
}

impl WorkspaceTree {
    /// Loads a workspace from its root document on disk.
    pub fn load(path: &Path) -> Result<Self> {
        let mut loader = DocumentLoader::new();
        let (identity, document) = loader.load(path)?;
        Self::build(identity, &document, loader)
    }

    /// Builds a tree from an already parsed root document.
    ///
    /// `identity` is where the document lives (or would live) on disk;
    /// external references are resolved relative to it.
    pub fn from_document(identity: &Path, document: &WorkspaceDocument) -> Result<Self> {
        let mut loader = DocumentLoader::new();
        let identity = DocumentLoader::identity(identity);
        loader.store(identity.clone(), document.clone());
        Self::build(identity, document, loader)
    }

    fn build(
        identity: PathBuf,
        document: &WorkspaceDocument,
        loader: DocumentLoader,
    ) -> Result<Self> {
        let root = Node {
            name: String::new(),
            url: None,
            fetch: None,
            external: None,
            document: identity.clone(),
            parent: None,
            children: Vec::new(),
            detached: false,
        };
        let mut tree = Self {
            nodes: vec![root],
            root: NodeId(0),
            index: HashMap::new(),
            loader,
            root_document: identity.clone(),
            repos_dir: document.repos_dir.clone(),
        };
        let root_id = tree.root;
        tree.graft(root_id, &document.nodes, &identity)?;
        tree.rebuild_index();
        Ok(tree)
    }

    /// Root node id.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Identity of the root document.
    pub fn root_document(&self) -> &Path {
        &self.root_document
    }

    /// `repos_dir` setting of the root document.
    pub fn repos_dir_setting(&self) -> Option<&str> {
        self.repos_dir.as_deref()
    }

    /// The document loader, for inspecting which documents were read.
    pub fn loader(&self) -> &DocumentLoader {
        &self.loader
    }

    /// Access a node. Ids are only ever handed out by this tree.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Whether the node is still attached to the tree.
    pub fn is_attached(&self, id: NodeId) -> bool {
        !self.nodes[id.0].detached
    }

    /// Number of attached nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| !n.detached).count()
    }

    /// Whether the tree holds only its root.
    pub fn is_empty(&self) -> bool {
        self.nodes[self.root.0].children.is_empty()
    }

    fn push_node(&mut self, parent: NodeId, spec: &NodeSpec, document: &Path) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            name: spec.name.clone(),
            url: spec.url.clone(),
            fetch: spec.fetch,
            external: spec.file.as_ref().map(|reference| ExternalRef {
                reference: reference.clone(),
                resolved: None,
            }),
            document: document.to_path_buf(),
            parent: Some(parent),
            children: Vec::new(),
            detached: false,
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    fn graft(&mut self, parent: NodeId, specs: &[NodeSpec], document: &Path) -> Result<()> {
        for spec in specs {
            config::validate_name(&spec.name)?;
            if self.find_child(parent, &spec.name).is_some() {
                return Err(Error::DuplicateName {
                    parent: self.virtual_path(parent),
                    name: spec.name.clone(),
                });
            }
            let id = self.push_node(parent, spec, document);
            self.graft(id, &spec.children, document)?;
        }
        Ok(())
    }

    /// Documents from the root down to (and including) the one declaring `id`.
    fn document_chain(&self, id: NodeId) -> Vec<PathBuf> {
        let mut lineage = Vec::new();
        let mut current = Some(id);
        while let Some(node_id) = current {
            lineage.push(node_id);
            current = self.nodes[node_id.0].parent;
        }

        let mut chain: Vec<PathBuf> = Vec::new();
        for node_id in lineage.into_iter().rev() {
            let document = &self.nodes[node_id.0].document;
            if chain.last() != Some(document) {
                chain.push(document.clone());
            }
        }
        chain
    }

    /// Loads the external document of `id` if it has one and it has not been
    /// loaded yet. A no-op for every other node.
    pub fn expand(&mut self, id: NodeId) -> Result<()> {
        let reference = match &self.nodes[id.0].external {
            Some(ExternalRef {
                reference,
                resolved: None,
            }) => reference.clone(),
            _ => return Ok(()),
        };

        let stack = self.document_chain(id);
        let referrer = self.nodes[id.0].document.clone();
        let (identity, document) = self
            .loader
            .load_reference(&referrer, &reference, &stack)?;
        debug!(
            "Expanding {} from {}",
            self.virtual_path(id),
            identity.display()
        );

        self.graft(id, &document.nodes, &identity)?;
        if let Some(external) = self.nodes[id.0].external.as_mut() {
            external.resolved = Some(identity);
        }
        self.rebuild_index();
        Ok(())
    }

    /// Expands every external document in the subtree rooted at `id`.
    ///
    /// Surfaces configuration errors (including cycles) for the whole subtree
    /// before anything acts on it.
    pub fn expand_all(&mut self, id: NodeId) -> Result<()> {
        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            self.expand(current)?;
            pending.extend(self.nodes[current.0].children.iter().rev().copied());
        }
        Ok(())
    }

    /// Children of `id`, loading its external document first if needed.
    pub fn children(&mut self, id: NodeId) -> Result<Vec<NodeId>> {
        self.expand(id)?;
        Ok(self.nodes[id.0].children.clone())
    }

    /// Finds an already-loaded child by name.
    pub fn find_child(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.nodes[parent.0]
            .children
            .iter()
            .copied()
            .find(|child| self.nodes[child.0].name == name)
    }

    /// Absolute virtual path of a node (`/` for the root).
    pub fn virtual_path(&self, id: NodeId) -> String {
        let mut names = Vec::new();
        let mut current = id;
        while let Some(parent) = self.nodes[current.0].parent {
            names.push(self.nodes[current.0].name.as_str());
            current = parent;
        }
        if names.is_empty() {
            return "/".to_string();
        }
        names.reverse();
        format!("/{}", names.join("/"))
    }

    /// Path segments of a node below the root.
    pub fn segments(&self, id: NodeId) -> Vec<String> {
        let mut names = Vec::new();
        let mut current = id;
        while let Some(parent) = self.nodes[current.0].parent {
            names.push(self.nodes[current.0].name.clone());
            current = parent;
        }
        names.reverse();
        names
    }

    /// Depth below the root (the root is 0).
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = id;
        while let Some(parent) = self.nodes[current.0].parent {
            depth += 1;
            current = parent;
        }
        depth
    }

    /// Resolves an absolute virtual path.
    pub fn resolve(&mut self, path: &str) -> Result<NodeId> {
        let root = self.root;
        self.resolve_virtual_path(root, path)
    }

    /// Resolves a virtual path, relative ones starting at `base`.
    pub fn resolve_virtual_path(&mut self, base: NodeId, path: &str) -> Result<NodeId> {
        let trimmed = path.trim();
        let (mut current, rest) = if trimmed == "~" {
            (self.root, "")
        } else if let Some(rest) = trimmed.strip_prefix("~/") {
            (self.root, rest)
        } else if let Some(rest) = trimmed.strip_prefix('/') {
            (self.root, rest)
        } else {
            (base, trimmed)
        };

        for segment in rest.split('/').filter(|s| !s.is_empty()) {
            match segment {
                "." => {}
                ".." => {
                    current = self.nodes[current.0].parent.unwrap_or(self.root);
                }
                name => {
                    self.expand(current)?;
                    current = self
                        .find_child(current, name)
                        .ok_or_else(|| Error::NodeNotFound {
                            path: trimmed.to_string(),
                            segment: name.to_string(),
                        })?;
                }
            }
        }
        Ok(current)
    }

    /// Looks up a loaded node by its canonical absolute virtual path.
    pub fn lookup(&self, path: &str) -> Option<NodeId> {
        self.index.get(path).copied()
    }

    fn rebuild_index(&mut self) {
        let mut index = HashMap::new();
        for (id, _) in self.descendants(self.root) {
            index.insert(self.virtual_path(id), id);
        }
        self.index = index;
    }

    /// Loaded nodes of the subtree rooted at `id` in pre-order (parent before
    /// children, children in declaration order), paired with their depth
    /// relative to `id`. Does not load external documents.
    pub fn descendants(&self, id: NodeId) -> Vec<(NodeId, usize)> {
        let mut out = Vec::new();
        let mut pending = vec![(id, 0usize)];
        while let Some((current, depth)) = pending.pop() {
            out.push((current, depth));
            for child in self.nodes[current.0].children.iter().rev() {
                pending.push((*child, depth + 1));
            }
        }
        out
    }

    /// Names of every loaded node, for suggestions.
    pub fn names(&self) -> Vec<String> {
        self.descendants(self.root)
            .into_iter()
            .filter(|(id, _)| *id != self.root)
            .map(|(id, _)| self.nodes[id.0].name.clone())
            .collect()
    }

    /// The document that holds the children of `id`.
    pub fn children_document(&mut self, id: NodeId) -> Result<PathBuf> {
        self.expand(id)?;
        let node = &self.nodes[id.0];
        Ok(match node.external.as_ref().and_then(|e| e.resolved.clone()) {
            Some(resolved) => resolved,
            None => node.document.clone(),
        })
    }

    /// Inserts a new child under `parent`.
    ///
    /// Fails with [`Error::DuplicateName`] when a sibling already has the
    /// name. The child is recorded as belonging to whichever document holds
    /// `parent`'s children.
    pub fn insert_child(&mut self, parent: NodeId, spec: NodeSpec) -> Result<NodeId> {
        config::validate_name(&spec.name)?;
        if spec.file.is_some() && !spec.children.is_empty() {
            return Err(Error::config(format!(
                "node '{}' declares both 'file' and 'children'",
                spec.name
            )));
        }
        let document = self.children_document(parent)?;
        if self.find_child(parent, &spec.name).is_some() {
            return Err(Error::DuplicateName {
                parent: self.virtual_path(parent),
                name: spec.name,
            });
        }

        let id = self.push_node(parent, &spec, &document);
        self.graft(id, &spec.children, &document)?;
        self.rebuild_index();
        Ok(id)
    }

    /// Detaches the subtree rooted at `id` and returns it as a [`NodeSpec`].
    ///
    /// Never touches the filesystem.
    pub fn remove_subtree(&mut self, id: NodeId) -> Result<NodeSpec> {
        let parent = self.nodes[id.0].parent.ok_or_else(|| Error::Config {
            message: "the workspace root cannot be removed".to_string(),
            hint: Some("Remove individual nodes instead".to_string()),
        })?;

        let spec = self.to_spec(id);
        self.nodes[parent.0].children.retain(|child| *child != id);
        for (node_id, _) in self.descendants(id) {
            self.nodes[node_id.0].detached = true;
        }
        self.rebuild_index();
        Ok(spec)
    }

    fn to_spec(&self, id: NodeId) -> NodeSpec {
        let node = &self.nodes[id.0];
        let children = if node.external.is_some() {
            Vec::new()
        } else {
            node.children.iter().map(|child| self.to_spec(*child)).collect()
        };
        NodeSpec {
            name: node.name.clone(),
            url: node.url.clone(),
            fetch: node.fetch,
            file: node.external.as_ref().map(|e| e.reference.clone()),
            children,
        }
    }

    /// The node whose children make up `identity`: the nearest node at or
    /// above `id` that mounts it, or the root.
    fn document_owner(&self, id: NodeId, identity: &Path) -> NodeId {
        let mut current = id;
        loop {
            let node = &self.nodes[current.0];
            if node.external.as_ref().and_then(|e| e.resolved.as_deref()) == Some(identity) {
                return current;
            }
            match node.parent {
                Some(parent) => current = parent,
                None => return current,
            }
        }
    }

    fn owned_document(&mut self, id: NodeId) -> Result<(NodeId, PathBuf)> {
        let identity = self.children_document(id)?;
        Ok((self.document_owner(id, &identity), identity))
    }

    /// Rebuilds the document that holds the children of `id`.
    ///
    /// The document is read from `id`'s own branch, so an edit below one
    /// mount of a shared document is what gets written.
    pub fn to_document(&mut self, id: NodeId) -> Result<WorkspaceDocument> {
        let (owner, _) = self.owned_document(id)?;
        Ok(self.document_from(owner))
    }

    fn document_from(&self, owner: NodeId) -> WorkspaceDocument {
        WorkspaceDocument {
            repos_dir: if owner == self.root {
                self.repos_dir.clone()
            } else {
                None
            },
            nodes: self.nodes[owner.0]
                .children
                .iter()
                .map(|child| self.to_spec(*child))
                .collect(),
        }
    }

    /// Writes the document holding the children of `id` back to disk and
    /// returns its identity.
    ///
    /// Other mounts of the same document are rebuilt from what was written.
    pub fn save_document(&mut self, id: NodeId) -> Result<PathBuf> {
        let (owner, identity) = self.owned_document(id)?;
        let document = self.document_from(owner);
        debug!("Saving document: {}", identity.display());
        config::save(&identity, &document)?;
        self.refresh_mounts(owner, &identity, &document)?;
        self.loader.store(identity.clone(), document);
        Ok(identity)
    }

    fn refresh_mounts(
        &mut self,
        owner: NodeId,
        identity: &Path,
        document: &WorkspaceDocument,
    ) -> Result<()> {
        let mounts: Vec<NodeId> = self
            .descendants(self.root)
            .into_iter()
            .map(|(id, _)| id)
            .filter(|id| {
                *id != owner
                    && self.nodes[id.0]
                        .external
                        .as_ref()
                        .and_then(|e| e.resolved.as_deref())
                        == Some(identity)
            })
            .collect();
        if mounts.is_empty() {
            return Ok(());
        }

        for mount in mounts {
            if self.nodes[mount.0].detached {
                continue;
            }
            for child in std::mem::take(&mut self.nodes[mount.0].children) {
                for (node_id, _) in self.descendants(child) {
                    self.nodes[node_id.0].detached = true;
                }
            }
            debug!("Refreshing {} from {}", self.virtual_path(mount), identity.display());
            self.graft(mount, &document.nodes, identity)?;
        }
        self.rebuild_index();
        Ok(())
    }
}
