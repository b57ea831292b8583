//! # Lazy Materializer
//!
//! Makes sure a node's working copy exists on disk, cloning it through the
//! [`GitOperations`] capability the first time it is needed.
//!
//! The filesystem is the source of truth for whether a repository is cloned:
//! a directory is materialized when it contains `.git`. On top of that the
//! materializer remembers every clone it started during this process, so a
//! repository is never cloned twice even if two callers race on the same
//! directory.
//!
//! The materializer knows nothing about the tree. Callers hand it a
//! [`MaterializeTarget`] describing one node (its virtual path for error
//! messages, its URL and its physical directory), which keeps it usable from
//! the executor's worker threads without sharing the tree.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use log::{debug, info};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::repository::GitOperations;

/// Whether a node's repository is on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MaterializationState {
    Absent,
    Cloned,
}

impl std::fmt::Display for MaterializationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MaterializationState::Absent => write!(f, "absent"),
            MaterializationState::Cloned => write!(f, "cloned"),
        }
    }
}

/// What [`Materializer::ensure`] had to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ensured {
    /// The repository was cloned by this call.
    Cloned,
    /// The repository (or container directory) was already there.
    Present,
    /// A container node without a URL got its directory created.
    Created,
}

/// One node, as far as materialization is concerned.
#[derive(Debug, Clone)]
pub struct MaterializeTarget {
    pub virtual_path: String,
    pub url: Option<String>,
    pub physical: PathBuf,
}

/// Clones repositories on demand, at most once each.
pub struct Materializer {
    git: Arc<dyn GitOperations>,
    claimed: Mutex<HashSet<PathBuf>>,
}

impl std::fmt::Debug for Materializer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Materializer")
            .field("claimed", &self.claimed)
            .finish_non_exhaustive()
    }
}

impl Materializer {
    pub fn new(git: Arc<dyn GitOperations>) -> Self {
        Self {
            git,
            claimed: Mutex::new(HashSet::new()),
        }
    }

    fn claimed(&self) -> Result<std::sync::MutexGuard<'_, HashSet<PathBuf>>> {
        self.claimed.lock().map_err(|_| Error::LockPoisoned {
            context: "materializer clone set".to_string(),
        })
    }

    /// Checks whether the repository at `physical` is on disk.
    pub fn state(&self, physical: &Path) -> MaterializationState {
        if physical.join(".git").exists() {
            return MaterializationState::Cloned;
        }
        match self.claimed() {
            Ok(claimed) if claimed.contains(physical) => MaterializationState::Cloned,
            _ => MaterializationState::Absent,
        }
    }

    /// Whether `target` has usable content: a clone for nodes with a URL, an
    /// existing directory for containers.
    pub fn is_materialized(&self, target: &MaterializeTarget) -> bool {
        match target.url {
            Some(_) => self.state(&target.physical) == MaterializationState::Cloned,
            None => target.physical.is_dir(),
        }
    }

    /// Makes `target` present on disk.
    ///
    /// Idempotent: an already cloned repository is never touched again.
    /// Containers only get their directory created. A failed clone leaves the
    /// node absent and reports [`Error::Materialization`] with the node's
    /// virtual path.
    pub fn ensure(&self, target: &MaterializeTarget) -> Result<Ensured> {
        let url = match target.url.as_deref() {
            Some(url) => url,
            None => {
                if target.physical.is_dir() {
                    return Ok(Ensured::Present);
                }
                fs::create_dir_all(&target.physical)?;
                return Ok(Ensured::Created);
            }
        };

        {
            let mut claimed = self.claimed()?;
            if claimed.contains(&target.physical) || target.physical.join(".git").exists() {
                debug!("{} already materialized", target.virtual_path);
                return Ok(Ensured::Present);
            }
            claimed.insert(target.physical.clone());
        }

        info!(
            "Cloning {} into {}",
            target.virtual_path,
            target.physical.display()
        );
        if let Err(err) = self.git.clone_repo(url, &target.physical) {
            self.claimed()?.remove(&target.physical);
            return Err(Error::Materialization {
                path: target.virtual_path.clone(),
                message: err.to_string(),
            });
        }
        Ok(Ensured::Cloned)
    }

    /// Deletes the working directory of `target`.
    ///
    /// The only destructive operation in repotree; callers must have the
    /// user's explicit consent.
    pub fn discard(&self, target: &MaterializeTarget) -> Result<()> {
        self.claimed()?.remove(&target.physical);
        if target.physical.exists() {
            debug!(
                "Deleting {} at {}",
                target.virtual_path,
                target.physical.display()
            );
            fs::remove_dir_all(&target.physical)?;
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::git::RepoStatus;
    use tempfile::TempDir;

    /// Records every git call and fails for configured URLs or directories.
    #[derive(Default)]
    pub(crate) struct MockGit {
        pub calls: Arc<Mutex<Vec<String>>>,
        pub failing: Vec<String>,
        pub dirty: bool,
    }

    impl MockGit {
        pub(crate) fn failing(patterns: &[&str]) -> Self {
            Self {
                failing: patterns.iter().map(|p| p.to_string()).collect(),
                ..Self::default()
            }
        }

        pub(crate) fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: String, subject: &str) -> Result<()> {
            self.calls.lock().unwrap().push(call);
            if self.failing.iter().any(|f| subject.contains(f.as_str())) {
                return Err(Error::GitCommand {
                    command: "mock".to_string(),
                    dir: subject.to_string(),
                    stderr: "simulated failure".to_string(),
                });
            }
            Ok(())
        }
    }

    impl GitOperations for MockGit {
        fn clone_repo(&self, url: &str, dest: &Path) -> Result<()> {
            self.record(format!("clone {}", url), url)?;
            fs::create_dir_all(dest.join(".git"))?;
            Ok(())
        }

        fn pull(&self, dest: &Path, force: bool) -> Result<()> {
            let call = format!("pull{} {}", if force { " --force" } else { "" }, dest.display());
            self.record(call, &dest.to_string_lossy())
        }

        fn commit(&self, dest: &Path, message: &str) -> Result<()> {
            self.record(
                format!("commit {} {}", dest.display(), message),
                &dest.to_string_lossy(),
            )
        }

        fn push(&self, dest: &Path) -> Result<()> {
            self.record(format!("push {}", dest.display()), &dest.to_string_lossy())
        }

        fn status(&self, dest: &Path) -> Result<RepoStatus> {
            self.record(format!("status {}", dest.display()), &dest.to_string_lossy())?;
            Ok(RepoStatus {
                branch: "main".to_string(),
                dirty: self.dirty,
                ahead: 0,
                behind: 0,
            })
        }
    }

    fn target(dir: &Path, name: &str, url: Option<&str>) -> MaterializeTarget {
        MaterializeTarget {
            virtual_path: format!("/{}", name),
            url: url.map(str::to_string),
            physical: dir.join(name),
        }
    }

    #[test]
    fn test_ensure_clones_once() {
        let temp_dir = TempDir::new().unwrap();
        let git = Arc::new(MockGit::default());
        let materializer = Materializer::new(git.clone());
        let api = target(temp_dir.path(), "api", Some("https://example.com/api.git"));

        assert_eq!(materializer.state(&api.physical), MaterializationState::Absent);
        assert_eq!(materializer.ensure(&api).unwrap(), Ensured::Cloned);
        assert_eq!(materializer.ensure(&api).unwrap(), Ensured::Present);
        assert_eq!(materializer.state(&api.physical), MaterializationState::Cloned);
        assert_eq!(git.calls(), vec!["clone https://example.com/api.git"]);
    }

    #[test]
    fn test_ensure_existing_checkout_is_untouched() {
        let temp_dir = TempDir::new().unwrap();
        let git = Arc::new(MockGit::default());
        let materializer = Materializer::new(git.clone());
        let api = target(temp_dir.path(), "api", Some("https://example.com/api.git"));
        fs::create_dir_all(api.physical.join(".git")).unwrap();
        fs::write(api.physical.join("local.txt"), "keep me").unwrap();

        assert_eq!(materializer.ensure(&api).unwrap(), Ensured::Present);
        assert!(git.calls().is_empty());
        assert_eq!(
            fs::read_to_string(api.physical.join("local.txt")).unwrap(),
            "keep me"
        );
    }

    #[test]
    fn test_ensure_container_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let git = Arc::new(MockGit::default());
        let materializer = Materializer::new(git.clone());
        let group = target(temp_dir.path(), "group", None);

        assert!(!materializer.is_materialized(&group));
        assert_eq!(materializer.ensure(&group).unwrap(), Ensured::Created);
        assert!(group.physical.is_dir());
        assert_eq!(materializer.ensure(&group).unwrap(), Ensured::Present);
        assert!(git.calls().is_empty());
    }

    #[test]
    fn test_failed_clone_stays_absent() {
        let temp_dir = TempDir::new().unwrap();
        let git = Arc::new(MockGit::failing(&["broken"]));
        let materializer = Materializer::new(git.clone());
        let broken = target(temp_dir.path(), "broken", Some("https://example.com/broken.git"));

        match materializer.ensure(&broken).unwrap_err() {
            Error::Materialization { path, message } => {
                assert_eq!(path, "/broken");
                assert!(message.contains("simulated failure"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(materializer.state(&broken.physical), MaterializationState::Absent);

        // A later attempt is allowed to retry.
        let _ = materializer.ensure(&broken);
        assert_eq!(git.calls().len(), 2);
    }

    #[test]
    fn test_discard_removes_directory() {
        let temp_dir = TempDir::new().unwrap();
        let git = Arc::new(MockGit::default());
        let materializer = Materializer::new(git);
        let api = target(temp_dir.path(), "api", Some("https://example.com/api.git"));
        materializer.ensure(&api).unwrap();

        materializer.discard(&api).unwrap();
        assert!(!api.physical.exists());
        assert_eq!(materializer.state(&api.physical), MaterializationState::Absent);

        // Discarding something that is not there is fine.
        materializer.discard(&api).unwrap();
    }
}
