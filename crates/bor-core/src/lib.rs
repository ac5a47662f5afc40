//! # BoR Core
//!
//! Pure primitives of the BoR proof engine: canonical encoding, stage
//! fingerprints, master proofs, and replay verification.
//!
//! This crate performs no I/O. Everything here is deterministic computation
//! over [`Value`] trees and caller-supplied [`Step`] functions.
//!
//! ## Key Types
//!
//! - [`Value`] - The data model steps consume and produce
//! - [`Step`] - A named, pure function `(input, config, version) -> output`
//! - [`Proof`] - Stage fingerprints plus the master fingerprint of a run
//! - [`Fingerprint`] - A 32-byte Blake3 digest
//!
//! ## Example
//!
//! ```rust
//! use bor_core::{prove, verify, Mapping, RunDescriptor, Step, Value};
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
//! let steps = vec![add, square];
//! let run = RunDescriptor::new(Value::Int(3), config.clone(), "v1.0", steps.clone());
//!
//! let (output, proof) = prove(&run).unwrap();
//! assert_eq!(output, Value::Int(25));
//! verify(&proof, &Value::Int(3), &config, "v1.0", &steps).unwrap();
//! ```
//!
//! ## Canonicalization
//!
//! Fingerprints are Blake3 over deterministic CBOR. See [`canonical`] module.

pub mod canonical;
pub mod error;
pub mod executor;
pub mod fingerprint;
pub mod proof;
pub mod step;
pub mod value;
pub mod verify;

pub use canonical::{canonical_hex, canonicalize};
pub use error::{CoreError, FailureKind, StepFailure, VerifyError};
pub use executor::{execute, execute_steps, Chain, Execution, RunDescriptor, StageRecord};
pub use fingerprint::{Fingerprint, FINGERPRINT_LEN};
pub use proof::{build, master_fingerprint, prove, stage_fingerprint, Proof};
pub use step::{Step, StepFn, StepRegistry};
pub use value::{from_json_str, mapping_from_json_str, Mapping, Value};
pub use verify::{
    guard, prove_guarded, verify, verify_replay, verify_replay_with, verify_with, VerifyOptions,
};
