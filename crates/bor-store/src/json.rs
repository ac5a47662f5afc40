//! JSON directory implementation of the ProofStore trait.
//!
//! One pretty-printed `<label>.json` file per label. Saving again under the
//! same label replaces the file atomically: the record is written to a
//! temporary file in the store root and renamed over the old one.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use bor_core::Proof;
use tempfile::NamedTempFile;

use crate::error::{Result, StoreError};
use crate::traits::{validate_label, ProofRecord, ProofStore, StoredLocation};

const EXTENSION: &str = "json";

/// Directory of JSON proof records.
#[derive(Debug, Clone)]
pub struct JsonStore {
    root: PathBuf,
}

impl JsonStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, label: &str) -> PathBuf {
        self.root.join(format!("{}.{}", label, EXTENSION))
    }

    fn read_record(&self, path: &Path, label: &str) -> Result<ProofRecord> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::NotFound(label.to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        let record: ProofRecord = serde_json::from_str(&text)?;
        if record.label != label {
            return Err(StoreError::InvalidData(format!(
                "{} holds label {:?}",
                path.display(),
                record.label
            )));
        }
        Ok(record)
    }
}

impl ProofStore for JsonStore {
    fn save(&self, label: &str, proof: &Proof) -> Result<StoredLocation> {
        validate_label(label)?;
        let record = ProofRecord::new(label, proof);
        let path = self.path_for(label);
        let text = serde_json::to_string_pretty(&record)?;

        let mut tmp = NamedTempFile::new_in(&self.root)?;
        tmp.write_all(text.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| StoreError::Io(e.error))?;
        tracing::debug!(label, path = %path.display(), master = %proof.master, "proof saved");
        Ok(StoredLocation::File(path))
    }

    fn load(&self, label: &str) -> Result<Proof> {
        validate_label(label)?;
        let path = self.path_for(label);
        let proof = self.read_record(&path, label)?.into_proof()?;
        tracing::debug!(label, path = %path.display(), "proof loaded");
        Ok(proof)
    }

    fn list(&self) -> Result<Vec<String>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            let label = match path.file_stem().and_then(|s| s.to_str()) {
                Some(stem) if validate_label(stem).is_ok() => stem.to_string(),
                _ => continue,
            };
            // Other JSON files may share the directory; they are not proofs.
            match self.read_record(&path, &label) {
                Ok(record) => entries.push((record.saved_at, label)),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping unreadable record");
                }
            }
        }
        entries.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
        Ok(entries.into_iter().map(|(_, label)| label).collect())
    }
}
