//! # Error Handling
//!
//! This module defines the centralized error type for the `repotree` library.
//! It uses `thiserror` to build a single `Error` enum covering every failure
//! mode, and a `Result<T>` alias used throughout the crate.
//!
//! Errors fall into two groups, which callers treat differently:
//!
//! - **Structural errors** stop the command before any git work happens:
//!   `Config`, `CyclicReference`, `NodeNotFound` and `DuplicateName`.
//! - **Per-node operational errors** are recorded against a single node in a
//!   batch report and never abort the rest of the batch:
//!   `Materialization`, `GitOperation` and `GitCommand`.
//!
//! The remaining variants wrap errors from the standard library and the
//! crates `repotree` depends on.

use thiserror::Error;

/// Main error type for repotree operations
#[derive(Error, Debug)]
pub enum Error {
    /// A workspace document is malformed or violates the schema.
    ///
    /// Includes an optional hint about how to fix the document.
    #[error("Configuration error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    Config {
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// An external document reference leads back to a document that is
    /// already being loaded.
    #[error("Cyclic document reference: {cycle}")]
    CyclicReference { cycle: String },

    /// A virtual path names a node that does not exist.
    #[error("Node not found: '{segment}' in {path}")]
    NodeNotFound {
        /// The full virtual path that was being resolved
        path: String,
        /// The first segment that could not be resolved
        segment: String,
    },

    /// A sibling with the same name already exists.
    #[error("Duplicate node name: '{name}' already exists under {parent}")]
    DuplicateName { parent: String, name: String },

    /// Cloning a node's repository failed. The node stays absent.
    #[error("Failed to materialize {path}: {message}")]
    Materialization { path: String, message: String },

    /// A pull, commit, push or status call failed for a node.
    #[error("Git operation failed for {path}: {message}")]
    GitOperation { path: String, message: String },

    /// The `git` subprocess could not be started or exited unsuccessfully.
    #[error("Git command failed in {dir}: {command} - {stderr}")]
    GitCommand {
        command: String,
        dir: String,
        stderr: String,
    },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A glob pattern error, wrapped from `glob::PatternError`.
    #[error("Glob pattern error: {0}")]
    Glob(#[from] glob::PatternError),

    /// An error indicating that a mutex or other lock has been poisoned.
    #[error("Lock poisoned: {context}")]
    LockPoisoned { context: String },
}

impl Error {
    /// Shorthand for a `Config` error without a hint.
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            hint: None,
        }
    }

    /// Returns true for errors that must stop a command before any git work.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Error::Config { .. }
                | Error::CyclicReference { .. }
                | Error::NodeNotFound { .. }
                | Error::DuplicateName { .. }
                | Error::Yaml(_)
        )
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
