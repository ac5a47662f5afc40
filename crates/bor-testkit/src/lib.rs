//! # BoR Testkit
//!
//! Testing utilities for the BoR proof engine.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Known runs with expected fingerprints for cross-platform verification
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: Reference steps, a registry, and a memory store for test scenarios
//!
//! ## Golden Vectors
//!
//! ```rust
//! use bor_testkit::vectors::{all_vectors, check_vector};
//!
//! for vector in all_vectors() {
//!     let proof = check_vector(&vector).unwrap();
//!     println!("{}: {}", vector.name, proof.master);
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use bor_testkit::generators::{proof_from_params, RunParams};
//!
//! proptest! {
//!     #[test]
//!     fn master_is_deterministic(params: RunParams) {
//!         prop_assert_eq!(proof_from_params(&params).master, proof_from_params(&params).master);
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use bor_testkit::fixtures::TestFixture;
//!
//! let fixture = TestFixture::new();
//! let proof = fixture.save_worked_example("demo");
//! assert_eq!(proof.len(), 2);
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{noisy_step, tamper_stage, TestFixture};
pub use generators::{proof_from_params, run_from_params, RunParams};
pub use vectors::{all_vectors, check_vector, verify_all_vectors, GoldenVector};
