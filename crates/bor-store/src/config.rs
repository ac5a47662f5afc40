//! Store configuration.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{Result, StoreError};
use crate::json::JsonStore;
use crate::sqlite::SqliteStore;
use crate::traits::ProofStore;

/// Default store root, relative to the working directory.
pub const DEFAULT_ROOT: &str = ".bor_store";

/// Persistence backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Backend {
    /// One JSON file per label.
    #[default]
    Json,
    /// `proofs.db` with full save history.
    Sqlite,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Json => f.write_str("json"),
            Backend::Sqlite => f.write_str("sqlite"),
        }
    }
}

impl FromStr for Backend {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Backend::Json),
            "sqlite" => Ok(Backend::Sqlite),
            other => Err(StoreError::InvalidData(format!("unknown backend: {}", other))),
        }
    }
}

/// Where and how proofs are persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub root: PathBuf,
    pub backend: Backend,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(DEFAULT_ROOT),
            backend: Backend::default(),
        }
    }
}

impl StoreConfig {
    pub fn new(root: impl Into<PathBuf>, backend: Backend) -> Self {
        Self {
            root: root.into(),
            backend,
        }
    }

    /// Open the configured backend.
    pub fn open(&self) -> Result<Box<dyn ProofStore>> {
        tracing::debug!(root = %self.root.display(), backend = %self.backend, "opening proof store");
        Ok(match self.backend {
            Backend::Json => Box::new(JsonStore::open(&self.root)?),
            Backend::Sqlite => Box::new(SqliteStore::open_dir(&self.root)?),
        })
    }
}
