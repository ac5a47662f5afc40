//! # BoR
//!
//! The unified API for the BoR proof engine: run a chain of deterministic
//! steps, get a proof, and let anyone holding the same steps replay it.
//!
//! ## Overview
//!
//! - **Stage fingerprints**: each step's name, input, output, configuration,
//!   and version are canonically encoded and hashed
//! - **Master fingerprint**: one hash committing to the whole run
//! - **Replay verification**: re-execution detects any change to inputs,
//!   steps, or stored hashes, and reports the first stage that differs
//! - **Persistence**: proofs saved to a JSON directory or SQLite
//!
//! ## Usage
//!
//! ```rust
//! use bor::{Mapping, Run, Step, Value};
//!
//! let add = Step::infallible("add", |x, c, _| {
//!     let offset = c.get("offset").and_then(Value::as_i64).unwrap_or(0);
//!     Value::Int(x.as_i64().unwrap_or(0) + offset)
//! });
//! let square = Step::infallible("square", |x, _, _| {
//!     let n = x.as_i64().unwrap_or(0);
//!     Value::Int(n * n)
//! });
//!
//! let config: Mapping = [("offset".to_string(), Value::Int(2))].into_iter().collect();
//! let mut run = Run::new(3, config, "v1.0").add_step(add).add_step(square);
//!
//! let proof = run.finalize().unwrap();
//! println!("master: {}", proof.master);
//! assert_eq!(run.output(), Some(&Value::Int(25)));
//! run.verify().unwrap();
//! ```
//!
//! ## Re-exports
//!
//! - `bor::core` - Canonicalization, fingerprints, executor, verifier
//! - `bor::store` - Proof persistence

pub mod error;
pub mod run;

// Re-export component crates
pub use bor_core as core;
pub use bor_store as store;

// Re-export main types for convenience
pub use error::{BorError, Result};
pub use run::{verify_stored, Run, RunSummary};

// Re-export commonly used core types
pub use bor_core::{
    canonicalize, guard, prove, prove_guarded, verify, verify_replay, FailureKind, Fingerprint,
    Mapping, Proof, RunDescriptor, Step, StepRegistry, Value, VerifyError, VerifyOptions,
};
pub use bor_store::{Backend, ProofStore, StoreConfig, StoredLocation};
