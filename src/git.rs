//! Thin wrappers around the system `git` binary.
//!
//! Using the system command means authentication works exactly as it does in
//! the user's shell: SSH keys and agents, credential helpers, personal access
//! tokens and anything configured in `~/.gitconfig`.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use log::debug;
use serde::Serialize;

use crate::error::{Error, Result};

/// Working-copy state reported by `git status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepoStatus {
    /// Checked-out branch, or `HEAD` when detached.
    pub branch: String,
    /// Whether there are staged, unstaged or untracked changes.
    pub dirty: bool,
    /// Commits ahead of the upstream branch.
    pub ahead: u32,
    /// Commits behind the upstream branch.
    pub behind: u32,
}

fn run(dir: Option<&Path>, args: &[&str]) -> Result<String> {
    let mut command = Command::new("git");
    if let Some(dir) = dir {
        command.current_dir(dir);
    }
    command.args(args);
    debug!("git {} (in {:?})", args.join(" "), dir);

    let dir_display = dir
        .map(|d| d.display().to_string())
        .unwrap_or_else(|| ".".to_string());
    let output = command.output().map_err(|e| Error::GitCommand {
        command: args.join(" "),
        dir: dir_display.clone(),
        stderr: e.to_string(),
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        return Err(Error::GitCommand {
            command: args.join(" "),
            dir: dir_display,
            stderr: if stderr.is_empty() { stdout } else { stderr },
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

fn is_empty_dir(dir: &Path) -> Result<bool> {
    Ok(fs::read_dir(dir)?.next().is_none())
}

/// Adds a hint to clone failures that look like authentication problems.
fn explain_clone_failure(err: Error) -> Error {
    match err {
        Error::GitCommand {
            command,
            dir,
            stderr,
        } if stderr.contains("Authentication failed")
            || stderr.contains("Permission denied")
            || stderr.contains("Could not read from remote repository") =>
        {
            Error::GitCommand {
                command,
                dir,
                stderr: format!(
                    "{}\n\
                    Make sure you have access to the repository. For private repos, ensure you have:\n\
                    - SSH key added to ssh-agent\n\
                    - Git credentials configured\n\
                    - Personal access token set up",
                    stderr
                ),
            }
        }
        other => other,
    }
}

/// Clone `url` into `target_dir`.
///
/// Parent directories are created as needed. When `target_dir` already holds
/// other content (typically the directories of child nodes that were
/// materialized first) the repository is cloned without a checkout next to
/// it, its `.git` directory moved in, and the work tree checked out around
/// the existing files. Existing content is never deleted.
pub fn clone(url: &str, target_dir: &Path) -> Result<()> {
    if let Some(parent) = target_dir.parent() {
        fs::create_dir_all(parent)?;
    }

    let target = target_dir.to_string_lossy().to_string();
    if !target_dir.exists() || is_empty_dir(target_dir)? {
        return run(None, &["clone", url, &target])
            .map(|_| ())
            .map_err(explain_clone_failure);
    }

    let staging = staging_dir(target_dir)?;
    let staging_str = staging.to_string_lossy().to_string();
    run(None, &["clone", "--no-checkout", url, &staging_str]).map_err(explain_clone_failure)?;

    let moved = fs::rename(staging.join(".git"), target_dir.join(".git"));
    fs::remove_dir_all(&staging)?;
    moved?;

    run(Some(target_dir), &["checkout", "--", "."])
        .or_else(|_| run(Some(target_dir), &["reset", "--hard", "HEAD"]))?;
    Ok(())
}

/// A fresh sibling of `target_dir` to clone into before moving `.git` over.
///
/// Derived from the full directory name, so `svc.a` and `svc.b` never share
/// one. Directories that already exist are skipped, not reused.
fn staging_dir(target_dir: &Path) -> Result<PathBuf> {
    let parent = target_dir.parent().unwrap_or_else(|| Path::new("."));
    let name = target_dir
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| Error::GitOperation {
            path: target_dir.display().to_string(),
            message: "clone target has no directory name".to_string(),
        })?;

    let mut candidate = parent.join(format!(".{}.repotree-clone", name));
    let mut attempt = 1;
    while candidate.exists() {
        candidate = parent.join(format!(".{}.repotree-clone-{}", name, attempt));
        attempt += 1;
    }
    Ok(candidate)
}

/// Update the current branch from its upstream.
///
/// Without `force` only fast-forwards are accepted. With `force` local
/// divergence is discarded: the branch is reset to its upstream.
pub fn pull(dir: &Path, force: bool) -> Result<()> {
    if force {
        run(Some(dir), &["fetch", "--prune"])?;
        run(Some(dir), &["reset", "--hard", "@{upstream}"])?;
    } else {
        run(Some(dir), &["pull", "--ff-only"])?;
    }
    Ok(())
}

/// Stage everything and commit it with `message`.
pub fn commit(dir: &Path, message: &str) -> Result<()> {
    run(Some(dir), &["add", "--all"])?;
    run(Some(dir), &["commit", "--message", message])?;
    Ok(())
}

/// Push the current branch to its upstream.
pub fn push(dir: &Path) -> Result<()> {
    run(Some(dir), &["push"])?;
    Ok(())
}

/// Read the branch and cleanliness of a working copy.
pub fn status(dir: &Path) -> Result<RepoStatus> {
    let output = run(Some(dir), &["status", "--porcelain=v1", "--branch"])?;
    Ok(parse_status(&output))
}

/// Parse `git status --porcelain=v1 --branch` output.
pub fn parse_status(output: &str) -> RepoStatus {
    let mut lines = output.lines();
    let header = lines.next().unwrap_or_default();
    let dirty = lines.any(|line| !line.trim().is_empty());

    let header = header.strip_prefix("## ").unwrap_or(header);
    let (branch_part, tracking) = match header.split_once(" [") {
        Some((branch, tracking)) => (branch, tracking.trim_end_matches(']')),
        None => (header, ""),
    };

    let branch = if let Some(rest) = branch_part.strip_prefix("No commits yet on ") {
        rest.to_string()
    } else if branch_part.starts_with("HEAD (no branch)") {
        "HEAD".to_string()
    } else {
        branch_part
            .split("...")
            .next()
            .unwrap_or(branch_part)
            .to_string()
    };

    let mut ahead = 0;
    let mut behind = 0;
    for part in tracking.split(", ") {
        if let Some(n) = part.strip_prefix("ahead ") {
            ahead = n.trim().parse().unwrap_or(0);
        } else if let Some(n) = part.strip_prefix("behind ") {
            behind = n.trim().parse().unwrap_or(0);
        }
    }

    RepoStatus {
        branch,
        dirty,
        ahead,
        behind,
    }
}
