//! # Git Capability
//!
//! repotree never reimplements git. Every content operation on a repository
//! goes through the [`GitOperations`] trait, which separates the tree and
//! traversal logic from the concrete way git is invoked.
//!
//! In the application [`SystemGit`] is used, which shells out to the `git`
//! binary via [`crate::git`]. Tests swap in mock implementations that record
//! calls and simulate failures without touching the network.

use std::path::Path;

use crate::error::Result;
use crate::git::RepoStatus;

/// Trait for git operations - allows mocking in tests
pub trait GitOperations: Send + Sync {
    /// Clones `url` into `dest`.
    fn clone_repo(&self, url: &str, dest: &Path) -> Result<()>;

    /// Updates the working copy at `dest` from its upstream.
    ///
    /// `force` asks the implementation to discard local divergence.
    fn pull(&self, dest: &Path, force: bool) -> Result<()>;

    /// Commits every change in the working copy with `message`.
    fn commit(&self, dest: &Path, message: &str) -> Result<()>;

    /// Pushes the current branch.
    fn push(&self, dest: &Path) -> Result<()>;

    /// Reports the branch and cleanliness of the working copy.
    fn status(&self, dest: &Path) -> Result<RepoStatus>;
}

/// The default implementation of `GitOperations`, which uses the system's
/// `git` command to perform real Git operations.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemGit;

impl GitOperations for SystemGit {
    fn clone_repo(&self, url: &str, dest: &Path) -> Result<()> {
        crate::git::clone(url, dest)
    }

    fn pull(&self, dest: &Path, force: bool) -> Result<()> {
        crate::git::pull(dest, force)
    }

    fn commit(&self, dest: &Path, message: &str) -> Result<()> {
        crate::git::commit(dest, message)
    }

    fn push(&self, dest: &Path) -> Result<()> {
        crate::git::push(dest)
    }

    fn status(&self, dest: &Path) -> Result<RepoStatus> {
        crate::git::status(dest)
    }
}
