//! In-memory implementation of the ProofStore trait.
//!
//! This is primarily for testing. It has the same semantics as the
//! persistent backends but keeps everything in memory.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use bor_core::Proof;

use crate::error::{Result, StoreError};
use crate::traits::{validate_label, ProofStore, StoredLocation};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Debug, Default)]
struct MemoryStoreInner {
    /// Latest proof per label, with its save sequence number.
    proofs: HashMap<String, (u64, Proof)>,
    /// Monotonic save counter; orders `list`.
    next_seq: u64,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct labels.
    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .proofs
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ProofStore for MemoryStore {
    fn save(&self, label: &str, proof: &Proof) -> Result<StoredLocation> {
        validate_label(label)?;
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.proofs.insert(label.to_string(), (seq, proof.clone()));
        tracing::debug!(label, master = %proof.master, "proof saved in memory");
        Ok(StoredLocation::Memory {
            label: label.to_string(),
        })
    }

    fn load(&self, label: &str) -> Result<Proof> {
        validate_label(label)?;
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner
            .proofs
            .get(label)
            .map(|(_, proof)| proof.clone())
            .ok_or_else(|| StoreError::NotFound(label.to_string()))
    }

    fn list(&self) -> Result<Vec<String>> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let mut entries: Vec<(u64, &String)> = inner
            .proofs
            .iter()
            .map(|(label, (seq, _))| (*seq, label))
            .collect();
        entries.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(entries.into_iter().map(|(_, label)| label.clone()).collect())
    }
}
