//! # Position Store
//!
//! Persists the "current node" between CLI invocations, so a stateless
//! process can behave like a shell session with a working directory.
//!
//! The store is an injected dependency of the [`crate::workspace::Workspace`]
//! facade. [`FilePositionStore`] keeps a small YAML record next to the root
//! workspace document; [`MemoryPositionStore`] keeps it in memory for tests
//! and embedding. Writes are last-writer-wins: concurrent invocations against
//! the same workspace are not synchronized.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Durable storage for the current virtual path.
pub trait PositionStore: Send + Sync {
    /// The persisted position, if any.
    fn get(&self) -> Result<Option<String>>;

    /// Persist `virtual_path` as the current position.
    fn set(&self, virtual_path: &str) -> Result<()>;

    /// Forget the current position.
    fn clear(&self) -> Result<()>;
}

/// On-disk layout of the position record.
#[derive(Debug, Default, Serialize, Deserialize)]
struct PositionRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    position: Option<String>,
}

/// Position store backed by a YAML file.
#[derive(Debug, Clone)]
pub struct FilePositionStore {
    path: PathBuf,
}

impl FilePositionStore {
    /// Creates a store that reads and writes `path`.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Creates the store colocated with a workspace document.
    pub fn beside(document: &Path) -> Self {
        let dir = document.parent().unwrap_or_else(|| Path::new("."));
        Self::new(dir.join(crate::defaults::POSITION_FILENAME))
    }

    /// Location of the record.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PositionStore for FilePositionStore {
    fn get(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(None);
        }
        let record: PositionRecord = serde_yaml::from_str(&content).map_err(|e| Error::Config {
            message: format!("{}: {}", self.path.display(), e),
            hint: Some("Run 'repotree use --clear' to reset the stored position".to_string()),
        })?;
        Ok(record.position.filter(|p| !p.trim().is_empty()))
    }

    fn set(&self, virtual_path: &str) -> Result<()> {
        debug!("Saving position {} to {}", virtual_path, self.path.display());
        let record = PositionRecord {
            position: Some(virtual_path.to_string()),
        };
        fs::write(&self.path, serde_yaml::to_string(&record)?)?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

/// Position store held in memory.
#[derive(Debug, Default)]
pub struct MemoryPositionStore {
    position: Mutex<Option<String>>,
}

impl MemoryPositionStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store preloaded with a position.
    pub fn with_position(virtual_path: &str) -> Self {
        Self {
            position: Mutex::new(Some(virtual_path.to_string())),
        }
    }
}

impl PositionStore for MemoryPositionStore {
    fn get(&self) -> Result<Option<String>> {
        let position = self.position.lock().map_err(|_| Error::LockPoisoned {
            context: "position store".to_string(),
        })?;
        Ok(position.clone())
    }

    fn set(&self, virtual_path: &str) -> Result<()> {
        let mut position = self.position.lock().map_err(|_| Error::LockPoisoned {
            context: "position store".to_string(),
        })?;
        *position = Some(virtual_path.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut position = self.position.lock().map_err(|_| Error::LockPoisoned {
            context: "position store".to_string(),
        })?;
        *position = None;
        Ok(())
    }
}
