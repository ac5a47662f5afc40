//! SQLite implementation of the ProofStore trait.
//!
//! Every save appends a row; `load` returns the newest row for a label, so
//! the history of a label stays queryable from the database.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};

use bor_core::{Fingerprint, Proof};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{validate_label, ProofRecord, ProofStore, StoredLocation};

/// Database file name inside the store root.
pub const DB_FILE: &str = "proofs.db";

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex.
pub struct SqliteStore {
    /// The SQLite connection, protected by a mutex.
    conn: Mutex<Connection>,
    /// Database path, or `:memory:`.
    path: PathBuf,
}

impl SqliteStore {
    /// Open (or create) `proofs.db` inside `root`.
    pub fn open_dir(root: impl AsRef<Path>) -> Result<Self> {
        std::fs::create_dir_all(root.as_ref())?;
        Self::open(root.as_ref().join(DB_FILE))
    }

    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path.as_ref())?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: path.as_ref().to_path_buf(),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: PathBuf::from(":memory:"),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Execute a blocking operation on the connection.
    fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.lock().map_err(|e| {
            StoreError::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_LOCKED),
                Some(format!("mutex poisoned: {}", e)),
            ))
        })?;
        f(&conn)
    }

    /// Number of rows saved under `label`, including superseded ones.
    pub fn history_len(&self, label: &str) -> Result<usize> {
        validate_label(label)?;
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM proofs WHERE label = ?1",
                params![label],
                |row| row.get(0),
            )?;
            Ok(count as usize)
        })
    }
}

// Helper to convert a row to a stored record
fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<(String, String, String, String, i64)> {
    Ok((
        row.get("label")?,
        row.get("master")?,
        row.get("stage_hashes")?,
        row.get("proof")?,
        row.get("saved_at")?,
    ))
}

fn decode_record(
    (label, master, stage_hashes, proof, saved_at): (String, String, String, String, i64),
) -> Result<ProofRecord> {
    let master = Fingerprint::from_hex(&master)
        .map_err(|e| StoreError::InvalidData(format!("{}: {}", label, e)))?;
    let stage_hashes: Vec<Fingerprint> = serde_json::from_str(&stage_hashes)?;
    let proof: Proof = serde_json::from_str(&proof)?;
    Ok(ProofRecord {
        label,
        master,
        stage_hashes,
        saved_at,
        proof,
    })
}

impl ProofStore for SqliteStore {
    fn save(&self, label: &str, proof: &Proof) -> Result<StoredLocation> {
        validate_label(label)?;
        let record = ProofRecord::new(label, proof);
        let stage_hashes = serde_json::to_string(&record.stage_hashes)?;
        let body = serde_json::to_string(&record.proof)?;

        let id = self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO proofs (label, master, stage_hashes, proof, saved_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    record.label,
                    record.master.to_hex(),
                    stage_hashes,
                    body,
                    record.saved_at
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })?;

        tracing::debug!(label, id, master = %proof.master, "proof saved");
        Ok(StoredLocation::Row {
            path: self.path.clone(),
            id,
        })
    }

    fn load(&self, label: &str) -> Result<Proof> {
        validate_label(label)?;
        let row = self.with_conn(|conn| {
            Ok(conn
                .query_row(
                    "SELECT label, master, stage_hashes, proof, saved_at FROM proofs
                     WHERE label = ?1
                     ORDER BY saved_at DESC, id DESC
                     LIMIT 1",
                    params![label],
                    row_to_record,
                )
                .optional()?)
        })?;

        let row = row.ok_or_else(|| StoreError::NotFound(label.to_string()))?;
        let proof = decode_record(row)?.into_proof()?;
        tracing::debug!(label, "proof loaded");
        Ok(proof)
    }

    fn list(&self) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT label FROM proofs
                 GROUP BY label
                 ORDER BY MAX(saved_at) DESC, MAX(id) DESC",
            )?;
            let labels = stmt
                .query_map([], |row| row.get(0))?
                .collect::<std::result::Result<Vec<String>, _>>()?;
            Ok(labels)
        })
    }

    fn contains(&self, label: &str) -> Result<bool> {
        Ok(self.history_len(label)? > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bor_core::canonical::MAX_DEPTH;
    use bor_core::{prove, Mapping, RunDescriptor, Step, Value};
    use tempfile::TempDir;

    fn make_proof(initial: i64) -> Proof {
        let square = Step::infallible("square", |x, _, _| {
            let n = x.as_i64().unwrap_or(0);
            Value::Int(n * n)
        });
        let run = RunDescriptor::new(Value::Int(initial), Mapping::new(), "v1", vec![square]);
        prove(&run).unwrap().1
    }

    #[test]
    fn test_save_and_load() {
        let store = SqliteStore::open_memory().unwrap();
        let proof = make_proof(5);

        let loc = store.save("demo", &proof).unwrap();
        assert!(matches!(loc, StoredLocation::Row { id: 1, .. }));
        assert_eq!(store.load("demo").unwrap(), proof);
    }

    #[test]
    fn test_newest_row_wins() {
        let store = SqliteStore::open_memory().unwrap();
        store.save("demo", &make_proof(1)).unwrap();
        store.save("demo", &make_proof(2)).unwrap();
        store.save("demo", &make_proof(3)).unwrap();

        assert_eq!(store.load("demo").unwrap(), make_proof(3));
        assert_eq!(store.history_len("demo").unwrap(), 3);
        assert_eq!(store.list().unwrap(), vec!["demo"]);
    }

    #[test]
    fn test_list_newest_first() {
        let store = SqliteStore::open_memory().unwrap();
        store.save("a", &make_proof(1)).unwrap();
        store.save("b", &make_proof(2)).unwrap();
        store.save("a", &make_proof(3)).unwrap();

        assert_eq!(store.list().unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn test_not_found() {
        let store = SqliteStore::open_memory().unwrap();
        assert!(matches!(store.load("missing"), Err(StoreError::NotFound(_))));
        assert!(!store.contains("missing").unwrap());
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let proof = make_proof(7);
        {
            let store = SqliteStore::open_dir(dir.path()).unwrap();
            store.save("kept", &proof).unwrap();
        }
        let store = SqliteStore::open_dir(dir.path()).unwrap();
        assert_eq!(store.path(), dir.path().join(DB_FILE));
        assert_eq!(store.load("kept").unwrap(), proof);
    }

    #[test]
    fn test_tampered_row_rejected() {
        let store = SqliteStore::open_memory().unwrap();
        let proof = make_proof(4);
        store.save("demo", &proof).unwrap();

        store
            .with_conn(|conn| {
                conn.execute(
                    "UPDATE proofs SET master = ?1 WHERE label = 'demo'",
                    params![proof.master.with_bit_flipped(9).to_hex()],
                )?;
                Ok(())
            })
            .unwrap();

        assert!(matches!(store.load("demo"), Err(StoreError::InvalidData(_))));
    }

    #[test]
    fn test_deepest_value_round_trips() {
        let deepest = (0..MAX_DEPTH).fold(Value::from("leaf"), |v, i| {
            if i % 2 == 0 {
                Value::map([("k", v)])
            } else {
                Value::Seq(vec![v])
            }
        });
        let identity = Step::infallible("identity", |x, _, _| x.clone());
        let run = RunDescriptor::new(deepest, Mapping::new(), "v1", vec![identity]);
        let proof = prove(&run).unwrap().1;

        let store = SqliteStore::open_memory().unwrap();
        store.save("deep", &proof).unwrap();
        assert_eq!(store.load("deep").unwrap(), proof);
    }
}
