//! Default values for repotree configuration.
//!
//! This module provides centralized default values used across the library
//! and the commands, ensuring consistency and avoiding duplication.

use std::path::{Path, PathBuf};

/// File name of a workspace document.
pub const DEFAULT_CONFIG_FILENAME: &str = ".repotree.yaml";

/// File name of the position record, stored next to the root document.
pub const POSITION_FILENAME: &str = ".repotree.state.yaml";

/// Environment variable naming the workspace document.
pub const CONFIG_ENV: &str = "REPOTREE_CONFIG";

/// Environment variable overriding the repos directory.
pub const REPOS_DIR_ENV: &str = "REPOTREE_REPOS_DIR";

/// Default bound on concurrent git invocations for clone and pull.
pub const DEFAULT_MAX_PARALLEL: usize = 4;

/// Searches `start` and its ancestors for a workspace document.
///
/// This mirrors how git discovers `.git`: the nearest enclosing workspace
/// wins.
pub fn find_config(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(DEFAULT_CONFIG_FILENAME))
        .find(|candidate| candidate.is_file())
}
