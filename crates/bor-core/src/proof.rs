//! Proof builder: stage fingerprints folded into a master fingerprint.
//!
//! ```text
//! stage_hash[i] = H(canonical({step_i, input_i, config, version, output_i}))
//! master        = H(canonical({initial, config, version, [stage_hash_0 .. stage_hash_n-1]}))
//! ```
//!
//! Configuration and version are bound into every stage, not only the
//! master, so a per-stage comparison already detects a context change.

use serde::{Deserialize, Serialize};

use crate::canonical::{canonical_master_bytes, canonical_stage_bytes};
use crate::error::CoreError;
use crate::executor::{execute, RunDescriptor, StageRecord};
use crate::fingerprint::Fingerprint;
use crate::value::{Mapping, Value};

/// An immutable proof of one run, with enough provenance to replay it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proof {
    /// Initial value `S0`.
    pub initial: Value,
    /// Configuration `C`.
    pub config: Mapping,
    /// Version label `V`.
    pub version: String,
    /// Step names in execution order.
    pub steps: Vec<String>,
    /// One fingerprint per executed step, in order.
    pub stage_hashes: Vec<Fingerprint>,
    /// HMASTER.
    pub master: Fingerprint,
}

impl Proof {
    /// Number of stages in the proof.
    pub fn len(&self) -> usize {
        self.stage_hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stage_hashes.is_empty()
    }

    /// Recompute the master fingerprint from this proof's own fields.
    ///
    /// Matches `self.master` for any proof produced by [`build`].
    pub fn recompute_master(&self) -> Result<Fingerprint, CoreError> {
        master_fingerprint(&self.initial, &self.config, &self.version, &self.stage_hashes)
    }

    /// Check that the proof is internally consistent: one step name per
    /// stage hash, and a master matching its own stage hashes.
    ///
    /// This says nothing about whether the steps really produce these hashes;
    /// that takes a replay.
    pub fn is_self_consistent(&self) -> Result<bool, CoreError> {
        if self.steps.len() != self.stage_hashes.len() {
            return Ok(false);
        }
        Ok(self.recompute_master()? == self.master)
    }
}

/// Fingerprint a single stage.
pub fn stage_fingerprint(
    step: &str,
    input: &Value,
    config: &Mapping,
    version: &str,
    output: &Value,
) -> Result<Fingerprint, CoreError> {
    let bytes = canonical_stage_bytes(step, input, config, version, output)?;
    Ok(Fingerprint::of(&bytes))
}

/// Fingerprint a stage record.
pub fn stage_record_fingerprint(
    record: &StageRecord,
    config: &Mapping,
    version: &str,
) -> Result<Fingerprint, CoreError> {
    stage_fingerprint(&record.step, &record.input, config, version, &record.output)
}

/// Compute HMASTER.
pub fn master_fingerprint(
    initial: &Value,
    config: &Mapping,
    version: &str,
    stage_hashes: &[Fingerprint],
) -> Result<Fingerprint, CoreError> {
    let bytes = canonical_master_bytes(initial, config, version, stage_hashes)?;
    Ok(Fingerprint::of(&bytes))
}

/// Build a proof from completed stage records.
///
/// Fails with [`CoreError::EmptyChain`] if there are no stages.
pub fn build(
    initial: &Value,
    config: &Mapping,
    version: &str,
    stages: &[StageRecord],
) -> Result<Proof, CoreError> {
    if stages.is_empty() {
        return Err(CoreError::EmptyChain);
    }

    let stage_hashes = stages
        .iter()
        .map(|record| stage_record_fingerprint(record, config, version))
        .collect::<Result<Vec<_>, _>>()?;
    let master = master_fingerprint(initial, config, version, &stage_hashes)?;

    Ok(Proof {
        initial: initial.clone(),
        config: config.clone(),
        version: version.to_string(),
        steps: stages.iter().map(|s| s.step.clone()).collect(),
        stage_hashes,
        master,
    })
}

/// Execute a run and build its proof. Returns the final value and the proof.
pub fn prove(run: &RunDescriptor) -> Result<(Value, Proof), CoreError> {
    if run.steps().is_empty() {
        return Err(CoreError::EmptyChain);
    }
    let execution = execute(run)?;
    let proof = build(run.initial(), run.config(), run.version(), &execution.stages)?;
    tracing::debug!(stages = proof.len(), master = %proof.master, "proof built");
    Ok((execution.output, proof))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::Step;

    fn add() -> Step {
        Step::infallible("add", |x, c, _| {
            let offset = c.get("offset").and_then(Value::as_i64).unwrap_or(0);
            Value::Int(x.as_i64().unwrap_or(0) + offset)
        })
    }

    fn square() -> Step {
        Step::infallible("square", |x, _, _| {
            let n = x.as_i64().unwrap_or(0);
            Value::Int(n * n)
        })
    }

    fn config(offset: i64) -> Mapping {
        [("offset".to_string(), Value::Int(offset))]
            .into_iter()
            .collect()
    }

    fn worked_example() -> RunDescriptor {
        RunDescriptor::new(Value::Int(3), config(2), "v1.0", vec![add(), square()])
    }

    #[test]
    fn test_prove_worked_example() {
        let (output, proof) = prove(&worked_example()).unwrap();
        assert_eq!(output, Value::Int(25));
        assert_eq!(proof.len(), 2);
        assert_eq!(proof.steps, vec!["add", "square"]);
        assert_eq!(proof.master.to_hex().len(), 64);
        assert!(proof.is_self_consistent().unwrap());
    }

    #[test]
    fn test_proof_deterministic() {
        let (_, p1) = prove(&worked_example()).unwrap();
        let (_, p2) = prove(&worked_example()).unwrap();
        assert_eq!(p1, p2);
    }

    #[test]
    fn test_empty_chain_rejected() {
        let run = RunDescriptor::new(Value::Int(3), config(2), "v1.0", vec![]);
        assert!(matches!(prove(&run), Err(CoreError::EmptyChain)));
        assert!(matches!(
            build(&Value::Int(3), &config(2), "v1.0", &[]),
            Err(CoreError::EmptyChain)
        ));
    }

    #[test]
    fn test_step_identity_bound() {
        // Same behavior, different name.
        let plus = Step::infallible("plus", |x, c, _| {
            let offset = c.get("offset").and_then(Value::as_i64).unwrap_or(0);
            Value::Int(x.as_i64().unwrap_or(0) + offset)
        });
        let (_, a) = prove(&RunDescriptor::new(Value::Int(3), config(2), "v1.0", vec![add()])).unwrap();
        let (_, b) = prove(&RunDescriptor::new(Value::Int(3), config(2), "v1.0", vec![plus])).unwrap();
        assert_ne!(a.stage_hashes[0], b.stage_hashes[0]);
        assert_ne!(a.master, b.master);
    }

    #[test]
    fn test_context_bound_per_stage() {
        // square ignores config and version, yet its stage hash still changes.
        let run = |c: Mapping, v: &str| {
            prove(&RunDescriptor::new(Value::Int(5), c, v, vec![square()]))
                .unwrap()
                .1
        };
        let base = run(config(2), "v1.0");
        assert_ne!(base.stage_hashes[0], run(config(3), "v1.0").stage_hashes[0]);
        assert_ne!(base.stage_hashes[0], run(config(2), "v1.1").stage_hashes[0]);
    }

    #[test]
    fn test_master_binds_initial_value() {
        let (_, a) = prove(&RunDescriptor::new(Value::Int(3), config(2), "v1.0", vec![add()])).unwrap();
        let recomputed = master_fingerprint(&Value::Int(4), &a.config, &a.version, &a.stage_hashes).unwrap();
        assert_ne!(recomputed, a.master);
    }

    #[test]
    fn test_master_is_order_sensitive() {
        let h1 = Fingerprint::of(b"one");
        let h2 = Fingerprint::of(b"two");
        let c = config(0);
        let ab = master_fingerprint(&Value::Int(0), &c, "v", &[h1, h2]).unwrap();
        let ba = master_fingerprint(&Value::Int(0), &c, "v", &[h2, h1]).unwrap();
        assert_ne!(ab, ba);
    }

    #[test]
    fn test_unsupported_output_fails_build() {
        let nan = Step::infallible("nan", |_, _, _| Value::Float(f64::NAN));
        let run = RunDescriptor::new(Value::Int(0), Mapping::new(), "v1", vec![nan]);
        assert!(matches!(prove(&run), Err(CoreError::UnsupportedType(_))));
    }

    #[test]
    fn test_self_consistency_detects_edit() {
        let (_, mut proof) = prove(&worked_example()).unwrap();
        proof.stage_hashes[1] = proof.stage_hashes[1].with_bit_flipped(0);
        assert!(!proof.is_self_consistent().unwrap());

        let (_, mut proof) = prove(&worked_example()).unwrap();
        proof.steps.pop();
        assert!(!proof.is_self_consistent().unwrap());
    }

    #[test]
    fn test_proof_json_roundtrip() {
        let (_, proof) = prove(&worked_example()).unwrap();
        let json = serde_json::to_string(&proof).unwrap();
        let back: Proof = serde_json::from_str(&json).unwrap();
        assert_eq!(back, proof);
        assert_eq!(back.recompute_master().unwrap(), proof.master);
    }
}
