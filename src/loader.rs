//! # Workspace Document Loader
//!
//! Loads workspace documents from disk and resolves `file:` references
//! between them.
//!
//! ## Caching
//!
//! Every successfully parsed document is cached for the lifetime of the
//! loader, keyed by its resolved path. Re-entering a document that was already
//! loaded hands back the same `Arc`, not a fresh parse.
//!
//! ## Cycle Detection
//!
//! External documents are expanded on first access, so the loader never sees
//! the whole document graph at once. Callers pass the chain of documents that
//! led to the reference being followed (the load-order stack); if the
//! referenced document is already on that chain the load fails with
//! [`Error::CyclicReference`] naming every document in the cycle.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::debug;

use crate::config::{self, WorkspaceDocument};
use crate::error::{Error, Result};
use crate::path::canonicalize_lenient;

/// Loads and caches workspace documents.
#[derive(Debug, Default)]
pub struct DocumentLoader {
    cache: HashMap<PathBuf, Arc<WorkspaceDocument>>,
    parses: usize,
}

impl DocumentLoader {
    /// Creates an empty loader.
    pub fn new() -> Self {
        Self::default()
    }

    /// The identity of a document: its path with symlinks and `..` resolved.
    pub fn identity(path: &Path) -> PathBuf {
        canonicalize_lenient(path)
    }

    /// Resolves a `file:` reference relative to the directory of the
    /// document that declares it.
    pub fn resolve_reference(referring_document: &Path, reference: &str) -> PathBuf {
        let base = referring_document.parent().unwrap_or_else(|| Path::new(""));
        Self::identity(&base.join(crate::path::expand_home(reference)))
    }

    /// Loads a root document, with an empty load-order stack.
    pub fn load(&mut self, path: &Path) -> Result<(PathBuf, Arc<WorkspaceDocument>)> {
        let identity = Self::identity(path);
        let document = self.load_identity(&identity)?;
        Ok((identity, document))
    }

    /// Follows a `file:` reference declared in `referring_document`.
    ///
    /// `stack` is the chain of documents, outermost first, that led to this
    /// reference. Fails with [`Error::CyclicReference`] if the target is
    /// already on it.
    pub fn load_reference(
        &mut self,
        referring_document: &Path,
        reference: &str,
        stack: &[PathBuf],
    ) -> Result<(PathBuf, Arc<WorkspaceDocument>)> {
        let identity = Self::resolve_reference(referring_document, reference);

        if stack.contains(&identity) {
            let mut cycle: Vec<String> = stack
                .iter()
                .skip_while(|doc| **doc != identity)
                .map(|doc| doc.display().to_string())
                .collect();
            cycle.push(identity.display().to_string());
            return Err(Error::CyclicReference {
                cycle: cycle.join(" -> "),
            });
        }

        let document = self.load_identity(&identity).map_err(|e| match e {
            Error::Config { message, hint } if !identity.exists() => Error::Config {
                message: format!(
                    "{} references missing document '{}': {}",
                    referring_document.display(),
                    reference,
                    message
                ),
                hint: hint.or_else(|| {
                    Some("'file:' paths are relative to the referencing document".to_string())
                }),
            },
            other => other,
        })?;
        Ok((identity, document))
    }

    fn load_identity(&mut self, identity: &Path) -> Result<Arc<WorkspaceDocument>> {
        if let Some(cached) = self.cache.get(identity) {
            debug!("Document cache hit: {}", identity.display());
            return Ok(Arc::clone(cached));
        }

        debug!("Loading document: {}", identity.display());
        let document = Arc::new(config::from_file(identity)?);
        self.parses += 1;
        self.cache
            .insert(identity.to_path_buf(), Arc::clone(&document));
        Ok(document)
    }

    /// Replaces the cached copy of a document after it was rewritten.
    pub fn store(&mut self, identity: PathBuf, document: WorkspaceDocument) {
        self.cache.insert(identity, Arc::new(document));
    }

    /// Returns true if the document has been loaded in this process.
    pub fn is_loaded(&self, path: &Path) -> bool {
        self.cache.contains_key(&Self::identity(path))
    }

    /// Identities of every document loaded so far.
    pub fn loaded_documents(&self) -> impl Iterator<Item = &Path> {
        self.cache.keys().map(PathBuf::as_path)
    }

    /// Number of times a document was actually parsed from disk.
    pub fn parse_count(&self) -> usize {
        self.parses
    }
}
