//! # BoR Store
//!
//! Proof persistence for the BoR proof engine. Provides a trait-based
//! interface with JSON, SQLite, and in-memory implementations.
//!
//! ## Key Types
//!
//! - [`ProofStore`] - The trait for all storage operations
//! - [`JsonStore`] - One pretty-printed JSON file per label
//! - [`SqliteStore`] - SQLite-based storage that keeps every save
//! - [`MemoryStore`] - In-memory storage for tests
//! - [`StoreConfig`] - Root directory plus backend selection
//!
//! ## Usage
//!
//! ```rust,no_run
//! use bor_store::{Backend, ProofStore, StoreConfig};
//!
//! let store = StoreConfig::new(".bor_store", Backend::Sqlite).open().unwrap();
//! for label in store.list().unwrap() {
//!     let proof = store.load(&label).unwrap();
//!     println!("{}: {}", label, proof.master);
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Latest wins**: `load` returns the most recent save for a label
//! - **Label hygiene**: labels are restricted to `[A-Za-z0-9._-]`
//! - **Cross-checked records**: stored master and stage hashes must match the proof body

pub mod config;
pub mod error;
pub mod json;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use config::{Backend, StoreConfig, DEFAULT_ROOT};
pub use error::{Result, StoreError};
pub use json::JsonStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{validate_label, ProofRecord, ProofStore, StoredLocation};
