//! SQLite schema migrations.
//!
//! Migrations are numbered from 1 and applied in order inside one
//! transaction; `schema_migrations` records which ones have run.

use rusqlite::{params, Connection};

use crate::error::{Result, StoreError};
use crate::traits::now_millis;

/// Migration `i + 1` is `MIGRATIONS[i]`.
const MIGRATIONS: &[&str] = &[
    // v1: one row per save; the newest row per label wins on load
    r#"
    CREATE TABLE proofs (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        label TEXT NOT NULL,
        master TEXT NOT NULL,          -- hex master fingerprint
        stage_hashes TEXT NOT NULL,    -- JSON array of hex fingerprints
        proof TEXT NOT NULL,           -- JSON proof body
        saved_at INTEGER NOT NULL      -- Unix ms
    );
    CREATE INDEX idx_proofs_label ON proofs(label, saved_at);
    CREATE INDEX idx_proofs_master ON proofs(master);
    "#,
];

/// Schema version this build writes.
pub const CURRENT_VERSION: u32 = MIGRATIONS.len() as u32;

/// Highest applied migration, or 0 on a fresh database.
pub fn schema_version(conn: &Connection) -> Result<u32> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
    )?;
    Ok(conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?)
}

/// Bring the schema up to [`CURRENT_VERSION`]. Safe to call on every open.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    let current = schema_version(conn)?;
    if current > CURRENT_VERSION {
        return Err(StoreError::Migration(format!(
            "database schema version {} is newer than supported version {}",
            current, CURRENT_VERSION
        )));
    }
    if current == CURRENT_VERSION {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for (version, sql) in (1u32..).zip(MIGRATIONS).skip(current as usize) {
        tx.execute_batch(sql)
            .map_err(|e| StoreError::Migration(format!("v{}: {}", version, e)))?;
        tx.execute(
            "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
            params![version, now_millis()],
        )?;
        tracing::debug!(version, "applied schema migration");
    }
    tx.commit()?;
    Ok(())
}
