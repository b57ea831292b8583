//! Eager/lazy classification of repository nodes.
//!
//! Whether a node is cloned during bulk `init`/`clone` is decided from its
//! URL, never from its name, so nodes can be renamed without silently changing
//! clone behavior. Aggregate repositories follow a naming convention where the
//! repository basename ends in a marker token (`fulfillment-munorepo.git`).

use std::fmt;

use serde::{Deserialize, Serialize};

/// When a node's repository gets materialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FetchMode {
    /// Cloned automatically whenever a bulk clone reaches the node.
    Eager,
    /// Cloned only on explicit access.
    #[default]
    Lazy,
}

impl fmt::Display for FetchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchMode::Eager => write!(f, "eager"),
            FetchMode::Lazy => write!(f, "lazy"),
        }
    }
}

impl std::str::FromStr for FetchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "eager" => Ok(FetchMode::Eager),
            "lazy" => Ok(FetchMode::Lazy),
            other => Err(format!("unknown fetch mode '{}' (expected eager or lazy)", other)),
        }
    }
}

/// Marker tokens identifying aggregate repositories.
pub const EAGER_MARKERS: &[&str] = &["munorepo", "monorepo"];

fn ends_with_marker(basename: &str) -> bool {
    let last = basename.rsplit(['-', '_', '.']).next().unwrap_or(basename);
    EAGER_MARKERS
        .iter()
        .any(|marker| last.eq_ignore_ascii_case(marker))
}

/// Extract the repository basename from a URL.
///
/// Handles `https://host/org/name.git`, `git@host:org/name.git`, local paths
/// and trailing slashes.
pub fn repo_basename(url: &str) -> &str {
    let trimmed = url.trim().trim_end_matches('/');
    let tail = trimmed
        .rsplit(['/', ':', '\\'])
        .next()
        .unwrap_or(trimmed);
    tail.strip_suffix(".git").unwrap_or(tail)
}

/// Decide the fetch mode for a node.
///
/// An explicit mode always wins. Otherwise the node is eager iff its URL's
/// basename ends in one of [`EAGER_MARKERS`]. Nodes without a URL are lazy.
pub fn classify_fetch_mode(url: Option<&str>, explicit: Option<FetchMode>) -> FetchMode {
    if let Some(mode) = explicit {
        return mode;
    }
    match url {
        Some(url) if ends_with_marker(repo_basename(url)) => FetchMode::Eager,
        _ => FetchMode::Lazy,
    }
}
