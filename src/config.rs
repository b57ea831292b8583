//! # Workspace Document Schema and Parsing
//!
//! This module defines the data structures that represent a `.repotree.yaml`
//! workspace document and the functions that read and write it. Loading a
//! document here is purely syntactic: resolving `file:` references into
//! subtrees is the job of [`crate::loader`].
//!
//! ## Format
//!
//! ```yaml
//! repos_dir: .
//! nodes:
//!   - name: platform
//!     children:
//!       - name: fulfillment
//!         url: git@github.com:acme/fulfillment-munorepo.git
//!       - name: payments
//!         url: https://github.com/acme/payments.git
//!         fetch: eager
//!   - name: data
//!     file: data/.repotree.yaml
//! ```
//!
//! A node declares either `children` inline or a `file` holding them, never
//! both. Names are unique among siblings and may not contain path separators.

use crate::error::{Error, Result};
use crate::fetch_mode::FetchMode;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// A single node as written in a workspace document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeSpec {
    /// Name of the node, unique among its siblings.
    pub name: String,
    /// Remote repository URL. Absent for organizational nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Explicit fetch mode. When absent the mode is derived from the URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fetch: Option<FetchMode>,
    /// Path to another workspace document holding this node's children,
    /// relative to the directory of the document declaring it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Inline children, in display order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeSpec>,
}

impl NodeSpec {
    /// Creates a leaf node with only a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: None,
            fetch: None,
            file: None,
            children: Vec::new(),
        }
    }

    /// Sets the repository URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Sets an explicit fetch mode.
    pub fn with_fetch(mut self, fetch: FetchMode) -> Self {
        self.fetch = Some(fetch);
        self
    }

    /// Sets an external document reference.
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Appends an inline child.
    pub fn with_child(mut self, child: NodeSpec) -> Self {
        self.children.push(child);
        self
    }
}

/// A whole workspace document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkspaceDocument {
    /// Directory holding the working copies, relative to the document.
    ///
    /// Only honored on the root document of a workspace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repos_dir: Option<String>,
    /// Top-level nodes of this document.
    #[serde(default)]
    pub nodes: Vec<NodeSpec>,
}

/// Checks that `name` is usable as a single virtual path segment.
pub fn validate_name(name: &str) -> Result<()> {
    let reason = if name.trim().is_empty() {
        Some("names must not be empty")
    } else if name.contains('/') || name.contains('\\') {
        Some("names must not contain path separators")
    } else if matches!(name, "." | ".." | "~") {
        Some("'.', '..' and '~' are reserved path segments")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(Error::Config {
            message: format!("invalid node name '{}': {}", name, reason),
            hint: Some("Use a plain directory name such as 'payments-api'".to_string()),
        }),
        None => Ok(()),
    }
}

/// Validates a list of sibling nodes and, recursively, their inline children.
fn validate_nodes(nodes: &[NodeSpec], parent: &str) -> Result<()> {
    let mut seen = HashSet::new();
    for node in nodes {
        validate_name(&node.name)?;
        if !seen.insert(node.name.as_str()) {
            return Err(Error::DuplicateName {
                parent: parent.to_string(),
                name: node.name.clone(),
            });
        }
        if node.file.is_some() && !node.children.is_empty() {
            return Err(Error::Config {
                message: format!(
                    "node '{}' declares both 'file' and 'children'",
                    node.name
                ),
                hint: Some("Move the children into the referenced document".to_string()),
            });
        }
        if let Some(url) = &node.url {
            if url.trim().is_empty() {
                return Err(Error::config(format!(
                    "node '{}' has an empty url",
                    node.name
                )));
            }
        }
        let child_parent = if parent == "/" {
            format!("/{}", node.name)
        } else {
            format!("{}/{}", parent, node.name)
        };
        validate_nodes(&node.children, &child_parent)?;
    }
    Ok(())
}

/// Parses and validates a workspace document from a YAML string.
pub fn parse(yaml: &str) -> Result<WorkspaceDocument> {
    if yaml.trim().is_empty() {
        return Ok(WorkspaceDocument::default());
    }
    let document: WorkspaceDocument = serde_yaml::from_str(yaml).map_err(|e| Error::Config {
        message: e.to_string(),
        hint: Some(
            "A workspace document is a mapping with a 'nodes' list; \
             each node takes name, url, fetch, file and children"
                .to_string(),
        ),
    })?;
    validate_nodes(&document.nodes, "/")?;
    Ok(document)
}

/// Reads and parses a workspace document from disk.
pub fn from_file(path: &Path) -> Result<WorkspaceDocument> {
    let content = fs::read_to_string(path).map_err(|e| Error::Config {
        message: format!("cannot read {}: {}", path.display(), e),
        hint: None,
    })?;
    parse(&content).map_err(|e| match e {
        Error::Config { message, hint } => Error::Config {
            message: format!("{}: {}", path.display(), message),
            hint,
        },
        other => other,
    })
}

/// Serializes a workspace document to YAML.
pub fn to_yaml(document: &WorkspaceDocument) -> Result<String> {
    Ok(serde_yaml::to_string(document)?)
}

/// Writes a workspace document to disk, creating parent directories.
pub fn save(path: &Path, document: &WorkspaceDocument) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, to_yaml(document)?)?;
    Ok(())
}
