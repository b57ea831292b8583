//! Shared test utilities for integration and E2E tests.
//!
//! This module provides common fixtures, helper functions, and document
//! snippets to reduce duplication across test files.
//!
//! ## Usage
//!
//! Add `mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new().with_config(configs::PLATFORM);
//!     fixture.repotree().arg("list").assert().success();
//! }
//! ```

use assert_fs::prelude::*;
use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    #[allow(unused_imports)]
    pub use assert_cmd::cargo::cargo_bin_cmd;
    #[allow(unused_imports)]
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use assert_fs::TempDir;
    #[allow(unused_imports)]
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::configs;
    #[allow(unused_imports)]
    pub use super::{git_available, init_bare_repo, should_skip_network_tests};
    #[allow(unused_imports)]
    pub use super::TestFixture;
}

/// Workspace documents used across tests. None of them contains an eager
/// repository, so commands that clone eagerly never reach the network.
#[allow(dead_code)]
pub mod configs {
    /// A small tree with containers and lazy repositories.
    pub const PLATFORM: &str = r#"
nodes:
  - name: platform
    children:
      - name: payments
        url: https://example.invalid/acme/payments.git
      - name: ledger
        url: https://example.invalid/acme/ledger.git
  - name: tools
"#;

    /// Root document mounting an external document under `data`.
    pub const WITH_EXTERNAL: &str = r#"
nodes:
  - name: data
    file: data.yaml
"#;

    /// The external document referenced by `WITH_EXTERNAL`.
    pub const DATA: &str = r#"
nodes:
  - name: warehouse
    url: https://example.invalid/acme/warehouse.git
"#;

    /// Invalid YAML for error testing.
    pub const INVALID_YAML: &str = "nodes: [unclosed";

    /// A document whose node carries an unknown key.
    pub const UNKNOWN_KEY: &str = r#"
nodes:
  - name: api
    uri: https://example.invalid/api.git
"#;
}

/// Check if network tests should be skipped.
///
/// Returns `true` if the `SKIP_NETWORK_TESTS` environment variable is set.
#[allow(dead_code)]
pub fn should_skip_network_tests() -> bool {
    env::var("SKIP_NETWORK_TESTS").is_ok()
}

/// Whether a usable `git` binary is on the PATH.
#[allow(dead_code)]
pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Creates a bare repository at `dir` holding one commit with a README,
/// usable as a clone source via its path.
#[allow(dead_code)]
pub fn init_bare_repo(dir: &Path) -> PathBuf {
    let work = dir.with_extension("work");
    std::fs::create_dir_all(&work).unwrap();
    let git = |args: &[&str], cwd: &Path| {
        let status = Command::new("git")
            .args(args)
            .current_dir(cwd)
            .env("GIT_AUTHOR_NAME", "test")
            .env("GIT_AUTHOR_EMAIL", "test@example.com")
            .env("GIT_COMMITTER_NAME", "test")
            .env("GIT_COMMITTER_EMAIL", "test@example.com")
            .status()
            .unwrap();
        assert!(status.success(), "git {:?} failed", args);
    };
    git(&["init", "--quiet", "--initial-branch=main"], &work);
    std::fs::write(work.join("README.md"), "# fixture\n").unwrap();
    git(&["add", "README.md"], &work);
    git(&["commit", "--quiet", "-m", "initial"], &work);
    git(
        &["clone", "--quiet", "--bare", work.to_str().unwrap(), dir.to_str().unwrap()],
        dir.parent().unwrap(),
    );
    dir.to_path_buf()
}

/// A test fixture that provides a temporary workspace directory.
///
/// # Example
///
/// ```rust,ignore
/// let fixture = TestFixture::new()
///     .with_config(configs::WITH_EXTERNAL)
///     .with_file("data.yaml", configs::DATA);
///
/// fixture.repotree().args(["list", "-r", "/"]).assert().success();
/// ```
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

#[allow(dead_code)]
impl TestFixture {
    /// Create a new test fixture with an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().unwrap(),
        }
    }

    /// Write `.repotree.yaml` with the given content.
    pub fn with_config(self, content: &str) -> Self {
        self.temp_dir
            .child(".repotree.yaml")
            .write_str(content)
            .unwrap();
        self
    }

    /// Write an arbitrary file relative to the workspace root.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir.child(path).write_str(content).unwrap();
        self
    }

    /// Create a directory relative to the workspace root.
    pub fn with_dir(self, path: &str) -> Self {
        self.temp_dir.child(path).create_dir_all().unwrap();
        self
    }

    /// Path of the workspace root.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Path of the root workspace document.
    pub fn config_path(&self) -> PathBuf {
        self.temp_dir.path().join(".repotree.yaml")
    }

    /// Read a file relative to the workspace root.
    pub fn read(&self, path: &str) -> String {
        std::fs::read_to_string(self.temp_dir.path().join(path)).unwrap()
    }

    /// A `repotree` command running in the workspace root with a clean
    /// environment and plain output.
    pub fn repotree(&self) -> assert_cmd::Command {
        self.repotree_in(self.temp_dir.path())
    }

    /// Like [`TestFixture::repotree`] but running in `dir`.
    pub fn repotree_in(&self, dir: &Path) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("repotree");
        cmd.current_dir(dir)
            .env_remove("REPOTREE_CONFIG")
            .env_remove("REPOTREE_REPOS_DIR")
            .env_remove("RUST_LOG")
            .arg("--color")
            .arg("never");
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}
