//! Golden test vectors for deterministic verification.
//!
//! These vectors pin canonical encoding and fingerprinting so that every
//! implementation produces identical proofs for identical runs.

use bor::core::{canonicalize, from_json_str, mapping_from_json_str};
use bor::{Proof, Run};

use crate::fixtures::TestFixture;

/// A golden test vector.
#[derive(Debug, Clone)]
pub struct GoldenVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// Initial value as JSON.
    pub initial: &'static str,
    /// Configuration as a JSON object.
    pub config: &'static str,
    pub version: &'static str,
    /// Step names; all are registered in [`TestFixture`].
    pub steps: &'static [&'static str],
    /// Expected canonical bytes of the initial value (hex).
    pub expected_initial_cbor: &'static str,
    /// Expected stage fingerprints (hex).
    pub expected_stage_hashes: &'static [&'static str],
    /// Expected master fingerprint (hex).
    pub expected_master: &'static str,
}

/// Get all golden test vectors.
pub fn all_vectors() -> Vec<GoldenVector> {
    vec![
        GoldenVector {
            name: "add then square",
            initial: "3",
            config: r#"{"offset": 2}"#,
            version: "v1.0",
            steps: &["add", "square"],
            expected_initial_cbor: "03",
            expected_stage_hashes: &[
                "652712180e1e33325e57ff4dc1b311340675e48730aebf3dd30e2e69d6c8b64f",
                "3c33913d286a69010e6dd86dc80a03da3f936b424c47dc7630a2c2deebc01358",
            ],
            expected_master: "82ae621bd6fc543b1320949cb839939e5a7be0c1af9a4260b53718bec1453b72",
        },
        GoldenVector {
            name: "square alone",
            initial: "7",
            config: "{}",
            version: "v1",
            steps: &["square"],
            expected_initial_cbor: "07",
            expected_stage_hashes: &[
                "268d479c0e078584bad3cecc2145c91da9ae7d8a1e38501ebb8bf9959a5c72ab",
            ],
            expected_master: "eb8a407e51090dc88e99d56d5c42cb47435638e0710505383c5eada79ad8e126",
        },
    ]
}

/// Build and finalize the run described by a vector.
pub fn generate_run_from_vector(vector: &GoldenVector) -> Result<Run, String> {
    let initial = from_json_str(vector.initial).map_err(|e| e.to_string())?;
    let config = mapping_from_json_str(vector.config).map_err(|e| e.to_string())?;
    let mut run = TestFixture::new().run(initial, config, vector.version, vector.steps);
    run.finalize().map_err(|e| e.to_string())?;
    Ok(run)
}

/// Check one vector; returns a description of the first difference.
pub fn check_vector(vector: &GoldenVector) -> Result<Proof, String> {
    let run = generate_run_from_vector(vector)?;
    let cbor = canonicalize(run.initial()).map_err(|e| e.to_string())?;
    if hex::encode(cbor) != vector.expected_initial_cbor {
        return Err(format!("{}: initial encoding differs", vector.name));
    }

    let proof = run
        .proof()
        .cloned()
        .ok_or_else(|| format!("{}: not finalized", vector.name))?;
    let hashes: Vec<String> = proof.stage_hashes.iter().map(|h| h.to_hex()).collect();
    if hashes != vector.expected_stage_hashes {
        return Err(format!("{}: stage hashes differ: {:?}", vector.name, hashes));
    }
    if proof.master.to_hex() != vector.expected_master {
        return Err(format!("{}: master differs: {}", vector.name, proof.master));
    }
    Ok(proof)
}

/// Check every vector.
pub fn verify_all_vectors() -> Result<(), Vec<String>> {
    let failures: Vec<String> = all_vectors()
        .iter()
        .filter_map(|v| check_vector(v).err())
        .collect();
    if failures.is_empty() {
        Ok(())
    } else {
        Err(failures)
    }
}
