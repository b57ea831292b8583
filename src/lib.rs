//! # repotree
//!
//! A tree of independently versioned git repositories, navigated and operated
//! on as one workspace.
//!
//! Repositories are nodes in a hierarchy declared in `.repotree.yaml`. Some
//! are cloned eagerly, others only when first needed, and whole branches of
//! the tree can live in separate documents pulled in by reference, much like
//! a mount point. The `repotree` command-line tool is a thin layer over this
//! library.
//!
//! ## Quick Example
//!
//! ```
//! use repotree::config;
//! use repotree::fetch_mode::FetchMode;
//! use repotree::tree::WorkspaceTree;
//! use std::path::Path;
//!
//! let document = config::parse(r#"
//! nodes:
//!   - name: platform
//!     children:
//!       - name: core
//!         url: git@github.com:acme/core-munorepo.git
//!       - name: payments
//!         url: https://github.com/acme/payments.git
//! "#).unwrap();
//!
//! let mut tree = WorkspaceTree::from_document(Path::new("/ws/.repotree.yaml"), &document).unwrap();
//! let core = tree.resolve("/platform/core").unwrap();
//! assert_eq!(tree.node(core).fetch_mode(), FetchMode::Eager);
//!
//! let payments = tree.resolve_virtual_path(core, "../payments").unwrap();
//! assert_eq!(tree.virtual_path(payments), "/platform/payments");
//! ```
//!
//! ## Core Concepts
//!
//! - **Documents (`config`, `loader`)**: the YAML schema and the cached,
//!   cycle-checked loading of root and referenced documents.
//! - **Tree (`tree`)**: the arena of nodes, virtual path resolution and
//!   structural edits.
//! - **Fetch modes (`fetch_mode`)**: eager or lazy, derived from the
//!   repository URL unless set explicitly.
//! - **Resolution (`resolver`)**: virtual path to directory and back, and the
//!   "where am I" policy (working directory, stored position, root).
//! - **Materialization (`materializer`)**: clone on demand, exactly once.
//! - **Batches (`executor`)**: apply clone, pull, commit, push, status or list
//!   over a subtree with bounded parallelism and per-node failure isolation.
//! - **Position (`position`)**: the persisted current node.
//! - **Facade (`workspace`)**: everything above behind one type.
//!
//! Git itself is reached through the `repository::GitOperations` trait; the
//! default implementation shells out to the system `git`.

pub mod config;
pub mod defaults;
pub mod error;
pub mod executor;
pub mod fetch_mode;
pub mod git;
pub mod loader;
pub mod materializer;
pub mod output;
pub mod path;
pub mod position;
pub mod repository;
pub mod resolver;
pub mod suggestions;
pub mod tree;
pub mod workspace;

#[cfg(test)]
mod path_proptest;
