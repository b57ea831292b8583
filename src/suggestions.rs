//! # Error Suggestions
//!
//! Helpers that turn library errors into messages telling users what went
//! wrong AND how to fix it.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use repotree::suggestions;
//!
//! // Instead of:
//! anyhow::bail!("Node not found: {}", path);
//!
//! // Use:
//! return Err(suggestions::node_not_found(path, segment, &workspace.node_names()));
//! ```

use std::path::Path;

use crate::error::Error;

/// Generate an error for when no workspace document can be found.
pub fn config_not_found(start: &Path) -> anyhow::Error {
    anyhow::anyhow!(
        "No workspace found: no .repotree.yaml in {start} or any parent directory\n\n\
         hint: Run 'repotree init' to create a workspace here\n\
         hint: Use --config to point at an existing workspace document\n\
         hint: Set the REPOTREE_CONFIG environment variable",
        start = start.display()
    )
}

/// Generate an error for a virtual path that does not resolve.
///
/// Suggests node names close to the one that failed.
pub fn node_not_found(path: &str, segment: &str, names: &[String]) -> anyhow::Error {
    let candidates: Vec<&str> = names.iter().map(String::as_str).collect();
    let did_you_mean = find_similar(segment, &candidates)
        .map(|s| format!("\nhint: Did you mean '{s}'?"))
        .unwrap_or_default();

    anyhow::anyhow!(
        "Node not found: '{segment}' in {path}{did_you_mean}\n\n\
         hint: Run 'repotree list -r /' to see every node\n\
         hint: Paths starting with '/' or '~/' resolve from the workspace root"
    )
}

/// Generate an error for a cycle between workspace documents.
pub fn cycle_detected(cycle: &str) -> anyhow::Error {
    anyhow::anyhow!(
        "Cyclic document reference: {cycle}\n\n\
         hint: Remove one of the 'file:' references to break the cycle\n\
         hint: Inline the shared nodes into one of the documents instead"
    )
}

/// Generate an error for an invalid `--pattern` glob.
pub fn invalid_glob(pattern: &str, error: &glob::PatternError) -> anyhow::Error {
    anyhow::anyhow!(
        "Invalid glob pattern: {pattern}\n\
         error: {error}\n\n\
         hint: Patterns match virtual paths, e.g. '/platform/*' or '**/*-api'\n\
         hint: Use [abc] for character classes, [!abc] to negate"
    )
}

/// Converts a library error into an `anyhow::Error`, attaching hints where a
/// specific helper exists.
pub fn explain(error: Error, names: &[String]) -> anyhow::Error {
    match error {
        Error::NodeNotFound { path, segment } => node_not_found(&path, &segment, names),
        Error::CyclicReference { cycle } => cycle_detected(&cycle),
        other => anyhow::Error::new(other),
    }
}

/// Find a similar string from a list of candidates using edit distance.
///
/// Returns Some(candidate) if a close match is found (edit distance <= 2).
fn find_similar<'a>(input: &str, candidates: &[&'a str]) -> Option<&'a str> {
    candidates
        .iter()
        .filter_map(|&candidate| {
            let distance = edit_distance(input, candidate);
            if distance <= 2 && distance < input.len() {
                Some((candidate, distance))
            } else {
                None
            }
        })
        .min_by_key(|(_, distance)| *distance)
        .map(|(candidate, _)| candidate)
}

/// Calculate the Levenshtein edit distance between two strings.
fn edit_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let a_len = a_chars.len();
    let b_len = b_chars.len();

    if a_len == 0 {
        return b_len;
    }
    if b_len == 0 {
        return a_len;
    }

    let mut previous: Vec<usize> = (0..=b_len).collect();
    let mut current = vec![0usize; b_len + 1];
    for i in 1..=a_len {
        current[0] = i;
        for j in 1..=b_len {
            let cost = usize::from(a_chars[i - 1] != b_chars[j - 1]);
            current[j] = (previous[j] + 1)
                .min(current[j - 1] + 1)
                .min(previous[j - 1] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b_len]
}
