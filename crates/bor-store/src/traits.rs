//! ProofStore trait: the abstract interface for proof persistence.
//!
//! Implementations include a JSON directory, SQLite, and in-memory (for tests).

use std::fmt;
use std::path::PathBuf;

use bor_core::{Fingerprint, Proof};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

/// Where a saved proof ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredLocation {
    /// A file written by the JSON store.
    File(PathBuf),
    /// A row in the SQLite `proofs` table.
    Row { path: PathBuf, id: i64 },
    /// In-memory entry.
    Memory { label: String },
}

impl fmt::Display for StoredLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoredLocation::File(path) => write!(f, "{}", path.display()),
            StoredLocation::Row { path, id } => write!(f, "{}#{}", path.display(), id),
            StoredLocation::Memory { label } => write!(f, "memory:{}", label),
        }
    }
}

/// On-disk record of a saved proof.
///
/// `master` and `stage_hashes` duplicate the proof body so that stored
/// files can be inspected without decoding the proof; [`ProofRecord::into_proof`]
/// rejects a record whose copies disagree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProofRecord {
    pub label: String,
    pub master: Fingerprint,
    pub stage_hashes: Vec<Fingerprint>,
    /// Unix milliseconds.
    pub saved_at: i64,
    pub proof: Proof,
}

impl ProofRecord {
    pub fn new(label: &str, proof: &Proof) -> Self {
        Self {
            label: label.to_string(),
            master: proof.master,
            stage_hashes: proof.stage_hashes.clone(),
            saved_at: now_millis(),
            proof: proof.clone(),
        }
    }

    /// Unwrap the proof after cross-checking the denormalized fields.
    pub fn into_proof(self) -> Result<Proof> {
        if self.master != self.proof.master {
            return Err(StoreError::InvalidData(format!(
                "{}: record master {} does not match proof master {}",
                self.label, self.master, self.proof.master
            )));
        }
        if self.stage_hashes != self.proof.stage_hashes {
            return Err(StoreError::InvalidData(format!(
                "{}: record stage hashes do not match proof",
                self.label
            )));
        }
        Ok(self.proof)
    }
}

/// The ProofStore trait: synchronous interface for proof persistence.
///
/// Labels name proofs. Saving under an existing label keeps the older
/// entries where the backend can (SQLite) but `load` always returns the
/// most recent one.
pub trait ProofStore: Send + Sync {
    /// Persist a proof under `label`.
    fn save(&self, label: &str, proof: &Proof) -> Result<StoredLocation>;

    /// Load the most recently saved proof for `label`.
    ///
    /// Returns `StoreError::NotFound` if nothing was saved under it.
    fn load(&self, label: &str) -> Result<Proof>;

    /// All labels, newest first.
    fn list(&self) -> Result<Vec<String>>;

    /// Check if a proof exists under `label`.
    fn contains(&self, label: &str) -> Result<bool> {
        match self.load(label) {
            Ok(_) => Ok(true),
            Err(StoreError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// serde_json rejects documents nested this many containers deep.
const JSON_RECURSION_LIMIT: usize = 128;

/// JSON containers a stored record adds around a value: the record object
/// and the proof body.
const RECORD_NESTING: usize = 2;

// Any value a proof can hold must load back from its record.
const _: () = assert!(bor_core::canonical::MAX_DEPTH + RECORD_NESTING < JSON_RECURSION_LIMIT);

/// Reject labels that are empty, are path navigation, or contain anything
/// outside `[A-Za-z0-9._-]`.
pub fn validate_label(label: &str) -> Result<()> {
    let valid = !label.is_empty()
        && label != "."
        && label != ".."
        && label
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-'));
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidLabel(label.to_string()))
    }
}

/// Get current time in milliseconds.
pub(crate) fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
