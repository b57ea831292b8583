//! # Recursive Operation Executor
//!
//! Applies one operation to a node and, optionally, its whole subtree.
//!
//! ## Phases
//!
//! 1. **Plan.** The subtree is expanded completely (every external document
//!    is loaded) and flattened into pre-order. Configuration problems,
//!    cycles included, surface here, before any git call.
//! 2. **Eligibility.** Each planned node is either scheduled or recorded as
//!    skipped: no URL, lazy without `include_lazy`, or not cloned for an
//!    operation that needs a working copy.
//! 3. **Run.** Clone and pull fan out over a bounded rayon pool. Clone goes
//!    depth level by depth level because a parent's working copy contains
//!    its children's directories. Status, commit, push and list run
//!    sequentially in pre-order.
//!
//! Every planned node owns exactly one result slot, written once. The report
//! is read out of the slots in plan order, so completion order never leaks
//! into the output. One node failing never stops the batch.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::{Arc, OnceLock};

use log::{debug, warn};
use rayon::prelude::*;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::fetch_mode::FetchMode;
use crate::git::RepoStatus;
use crate::materializer::{Ensured, MaterializeTarget, Materializer};
use crate::repository::GitOperations;
use crate::resolver::PathResolver;
use crate::tree::{NodeId, WorkspaceTree};

/// Operations the executor can fan out over a subtree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Clone,
    Pull { force: bool },
    Commit { message: String },
    Push,
    Status,
    List,
}

impl Operation {
    /// Short name used in logs and reports.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Clone => "clone",
            Operation::Pull { .. } => "pull",
            Operation::Commit { .. } => "commit",
            Operation::Push => "push",
            Operation::Status => "status",
            Operation::List => "list",
        }
    }

    fn honors_fetch_mode(&self) -> bool {
        matches!(self, Operation::Clone | Operation::Pull { .. })
    }

    fn needs_working_copy(&self) -> bool {
        matches!(
            self,
            Operation::Pull { .. } | Operation::Commit { .. } | Operation::Push | Operation::Status
        )
    }
}

/// How far and how wide an operation reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecOptions {
    /// Descend into the whole subtree instead of the start node only.
    pub recursive: bool,
    /// Let clone and pull reach lazy descendants.
    pub include_lazy: bool,
    /// Upper bound on concurrent git invocations; `0` or `1` is sequential.
    pub max_parallel: usize,
}

impl Default for ExecOptions {
    fn default() -> Self {
        Self {
            recursive: false,
            include_lazy: false,
            max_parallel: crate::defaults::DEFAULT_MAX_PARALLEL,
        }
    }
}

impl ExecOptions {
    pub fn recursive() -> Self {
        Self {
            recursive: true,
            ..Self::default()
        }
    }
}

/// Per-node outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Skipped,
    Failed,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Success => write!(f, "success"),
            Outcome::Skipped => write!(f, "skipped"),
            Outcome::Failed => write!(f, "failed"),
        }
    }
}

/// Result of applying the operation to one node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationResult {
    /// Virtual path of the node.
    pub path: String,
    pub outcome: Outcome,
    /// Human-readable explanation: what happened, why it was skipped, or
    /// the error message.
    pub detail: String,
    /// Working-copy state, for status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<RepoStatus>,
}

impl OperationResult {
    fn new(path: &str, outcome: Outcome, detail: impl Into<String>) -> Self {
        Self {
            path: path.to_string(),
            outcome,
            detail: detail.into(),
            status: None,
        }
    }

    fn success(path: &str, detail: impl Into<String>) -> Self {
        Self::new(path, Outcome::Success, detail)
    }

    fn skipped(path: &str, detail: impl Into<String>) -> Self {
        Self::new(path, Outcome::Skipped, detail)
    }

    fn failed(path: &str, err: &Error) -> Self {
        Self::new(path, Outcome::Failed, err.to_string())
    }
}

/// Outcomes of one batch, in pre-order.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    operation: &'static str,
    results: Vec<OperationResult>,
}

impl BatchReport {
    /// Name of the operation that produced the report.
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    pub fn results(&self) -> &[OperationResult] {
        &self.results
    }

    pub fn into_results(self) -> Vec<OperationResult> {
        self.results
    }

    /// True when at least one node failed. Skips do not count.
    pub fn has_failures(&self) -> bool {
        self.results.iter().any(|r| r.outcome == Outcome::Failed)
    }

    pub fn count(&self, outcome: Outcome) -> usize {
        self.results.iter().filter(|r| r.outcome == outcome).count()
    }

    pub fn find(&self, path: &str) -> Option<&OperationResult> {
        self.results.iter().find(|r| r.path == path)
    }
}

/// One node of the flattened subtree.
#[derive(Debug)]
struct PlannedNode {
    target: MaterializeTarget,
    fetch_mode: FetchMode,
    depth: usize,
    /// Index of the nearest planned ancestor.
    parent: Option<usize>,
    /// The node the user asked for, as opposed to one reached by recursion.
    explicit: bool,
}

/// Fans operations out over the tree.
pub struct Executor {
    git: Arc<dyn GitOperations>,
    materializer: Arc<Materializer>,
}

impl Executor {
    pub fn new(git: Arc<dyn GitOperations>, materializer: Arc<Materializer>) -> Self {
        Self { git, materializer }
    }

    /// Applies `operation` at `start` and reports one result per planned node.
    ///
    /// Returns an error only for structural problems found while planning;
    /// per-node failures end up in the report.
    pub fn apply(
        &self,
        tree: &mut WorkspaceTree,
        resolver: &PathResolver,
        start: NodeId,
        operation: &Operation,
        options: &ExecOptions,
    ) -> Result<BatchReport> {
        let plan = self.plan(tree, resolver, start, options)?;
        debug!(
            "Planned {} over {} node(s) from {}",
            operation.name(),
            plan.len(),
            tree.virtual_path(start)
        );

        let slots: Vec<OnceLock<OperationResult>> = plan.iter().map(|_| OnceLock::new()).collect();
        let mut scheduled = Vec::new();
        for (index, node) in plan.iter().enumerate() {
            match self.eligibility(node, operation, options) {
                Some(result) => record(&slots, index, result),
                None => scheduled.push(index),
            }
        }

        match operation {
            Operation::Clone => self.run_clone_levels(&plan, &scheduled, &slots, options),
            Operation::Pull { .. } => {
                self.run_parallel(&plan, &scheduled, &slots, operation, options)
            }
            _ => {
                for &index in &scheduled {
                    record(&slots, index, self.run_one(&plan[index], operation));
                }
            }
        }

        let results = slots
            .into_iter()
            .zip(plan.iter())
            .map(|(slot, node)| {
                slot.into_inner().unwrap_or_else(|| {
                    OperationResult::skipped(&node.target.virtual_path, "not attempted")
                })
            })
            .collect();
        Ok(BatchReport {
            operation: operation.name(),
            results,
        })
    }

    fn plan(
        &self,
        tree: &mut WorkspaceTree,
        resolver: &PathResolver,
        start: NodeId,
        options: &ExecOptions,
    ) -> Result<Vec<PlannedNode>> {
        let nodes = if options.recursive {
            tree.expand_all(start)?;
            tree.descendants(start)
        } else {
            vec![(start, 0)]
        };

        let mut positions: HashMap<NodeId, usize> = HashMap::new();
        let mut plan = Vec::with_capacity(nodes.len());
        for (index, (id, depth)) in nodes.into_iter().enumerate() {
            positions.insert(id, index);
            let parent = tree
                .node(id)
                .parent()
                .and_then(|parent| positions.get(&parent).copied());
            plan.push(PlannedNode {
                target: resolver.target(tree, id),
                fetch_mode: tree.node(id).fetch_mode(),
                depth,
                parent,
                explicit: id == start,
            });
        }
        Ok(plan)
    }

    /// `Some(result)` when the node is settled without running anything.
    fn eligibility(
        &self,
        node: &PlannedNode,
        operation: &Operation,
        options: &ExecOptions,
    ) -> Option<OperationResult> {
        let path = node.target.virtual_path.as_str();

        if *operation == Operation::List {
            let state = if self.materializer.is_materialized(&node.target) {
                "cloned"
            } else {
                "absent"
            };
            return Some(OperationResult::success(
                path,
                format!("{}, {}", node.fetch_mode, state),
            ));
        }

        if node.target.url.is_none() {
            return Some(OperationResult::skipped(path, "no repository url"));
        }

        if operation.honors_fetch_mode()
            && node.fetch_mode == FetchMode::Lazy
            && !options.include_lazy
            && !node.explicit
        {
            return Some(OperationResult::skipped(
                path,
                "lazy (use --include-lazy to include)",
            ));
        }

        let materialized = self.materializer.is_materialized(&node.target);
        if operation.needs_working_copy() && !materialized {
            return Some(OperationResult::skipped(path, "not cloned"));
        }
        if *operation == Operation::Clone && materialized {
            return Some(OperationResult::skipped(path, "already cloned"));
        }
        None
    }

    fn run_one(&self, node: &PlannedNode, operation: &Operation) -> OperationResult {
        let path = node.target.virtual_path.as_str();
        let dir = &node.target.physical;
        let git_error = |err: Error| Error::GitOperation {
            path: path.to_string(),
            message: err.to_string(),
        };

        let outcome = match operation {
            Operation::Clone => self.materializer.ensure(&node.target).map(|ensured| match ensured {
                Ensured::Cloned => OperationResult::success(path, "cloned"),
                Ensured::Created => OperationResult::success(path, "created"),
                Ensured::Present => OperationResult::skipped(path, "already cloned"),
            }),
            Operation::Pull { force } => self
                .git
                .pull(dir, *force)
                .map(|_| OperationResult::success(path, if *force { "reset to upstream" } else { "pulled" }))
                .map_err(git_error),
            Operation::Commit { message } => self.commit(path, dir, message).map_err(git_error),
            Operation::Push => self
                .git
                .push(dir)
                .map(|_| OperationResult::success(path, "pushed"))
                .map_err(git_error),
            Operation::Status => self
                .git
                .status(dir)
                .map(|status| {
                    let mut result = OperationResult::success(path, describe_status(&status));
                    result.status = Some(status);
                    result
                })
                .map_err(git_error),
            Operation::List => Ok(OperationResult::success(path, node.fetch_mode.to_string())),
        };

        outcome.unwrap_or_else(|err| {
            debug!("{} failed for {}: {}", operation.name(), path, err);
            OperationResult::failed(path, &err)
        })
    }

    fn commit(&self, path: &str, dir: &Path, message: &str) -> Result<OperationResult> {
        let status = self.git.status(dir)?;
        if !status.dirty {
            return Ok(OperationResult::skipped(path, "nothing to commit"));
        }
        self.git.commit(dir, message)?;
        Ok(OperationResult::success(path, "committed"))
    }

    fn run_parallel(
        &self,
        plan: &[PlannedNode],
        indices: &[usize],
        slots: &[OnceLock<OperationResult>],
        operation: &Operation,
        options: &ExecOptions,
    ) {
        let work = |index: usize| record(slots, index, self.run_one(&plan[index], operation));

        if options.max_parallel <= 1 || indices.len() <= 1 {
            indices.iter().copied().for_each(work);
            return;
        }

        match rayon::ThreadPoolBuilder::new()
            .num_threads(options.max_parallel)
            .build()
        {
            Ok(pool) => pool.install(|| indices.par_iter().copied().for_each(work)),
            Err(err) => {
                warn!("Could not start worker pool ({}); running sequentially", err);
                indices.iter().copied().for_each(work);
            }
        }
    }

    fn run_clone_levels(
        &self,
        plan: &[PlannedNode],
        scheduled: &[usize],
        slots: &[OnceLock<OperationResult>],
        options: &ExecOptions,
    ) {
        let max_depth = scheduled.iter().map(|&i| plan[i].depth).max().unwrap_or(0);
        for depth in 0..=max_depth {
            let mut level = Vec::new();
            for &index in scheduled.iter().filter(|&&i| plan[i].depth == depth) {
                if ancestor_failed(plan, slots, index) {
                    record(
                        slots,
                        index,
                        OperationResult::skipped(
                            &plan[index].target.virtual_path,
                            "ancestor failed to clone",
                        ),
                    );
                } else {
                    level.push(index);
                }
            }
            self.run_parallel(plan, &level, slots, &Operation::Clone, options);
        }
    }
}

fn record(slots: &[OnceLock<OperationResult>], index: usize, result: OperationResult) {
    if slots[index].set(result).is_err() {
        warn!("Result for plan entry {} recorded twice; keeping the first", index);
    }
}

fn ancestor_failed(plan: &[PlannedNode], slots: &[OnceLock<OperationResult>], index: usize) -> bool {
    let mut current = plan[index].parent;
    while let Some(parent) = current {
        if slots[parent]
            .get()
            .is_some_and(|result| result.outcome == Outcome::Failed)
        {
            return true;
        }
        current = plan[parent].parent;
    }
    false
}

fn describe_status(status: &RepoStatus) -> String {
    let mut detail = format!(
        "{}, {}",
        status.branch,
        if status.dirty { "dirty" } else { "clean" }
    );
    if status.ahead > 0 {
        detail.push_str(&format!(", ahead {}", status.ahead));
    }
    if status.behind > 0 {
        detail.push_str(&format!(", behind {}", status.behind));
    }
    detail
}
