//! Replay verification.
//!
//! Verification re-executes the recorded steps from scratch and compares
//! fingerprints bit for bit. It trusts nothing in the proof except the
//! values it is asked to compare against, never mutates the proof, and never
//! retries: the first discrepancy is the answer.
//!
//! Order of checks:
//! 1. step count vs. stored stage count (`LengthMismatch`, no step runs)
//! 2. each stage hash as soon as that stage executes (`StageMismatch`)
//! 3. master fingerprint (`MasterMismatch`)
//!
//! The nondeterminism guard runs the same descriptor twice and compares the
//! two proofs. A divergence there is an authoring bug in a step, reported as
//! `NonDeterministicStep`, and kept distinct from tampering.

use crate::error::{CoreError, VerifyError};
use crate::executor::{Chain, RunDescriptor};
use crate::proof::{master_fingerprint, prove, stage_record_fingerprint, Proof};
use crate::step::{Step, StepRegistry};
use crate::value::{Mapping, Value};

/// Verification options.
#[derive(Debug, Clone, Default)]
pub struct VerifyOptions {
    /// Run the nondeterminism guard before comparing against the proof.
    pub guard: bool,
}

impl VerifyOptions {
    pub fn with_guard() -> Self {
        Self { guard: true }
    }
}

/// Verify `proof` by replaying `steps` over `initial` with `config` and `version`.
pub fn verify(
    proof: &Proof,
    initial: &Value,
    config: &Mapping,
    version: &str,
    steps: &[Step],
) -> Result<(), VerifyError> {
    if steps.len() != proof.stage_hashes.len() {
        tracing::warn!(
            expected = proof.stage_hashes.len(),
            actual = steps.len(),
            "length mismatch"
        );
        return Err(VerifyError::LengthMismatch {
            expected: proof.stage_hashes.len(),
            actual: steps.len(),
        });
    }

    let mut recomputed = Vec::with_capacity(steps.len());
    for (record, stored) in Chain::new(initial, config, version, steps).zip(&proof.stage_hashes) {
        let record = record?;
        let hash = stage_record_fingerprint(&record, config, version)?;
        if hash != *stored {
            tracing::warn!(index = record.index, step = %record.step, "stage hash mismatch");
            return Err(VerifyError::StageMismatch {
                index: record.index,
            });
        }
        recomputed.push(hash);
    }

    if recomputed.is_empty() {
        return Err(CoreError::EmptyChain.into());
    }

    let master = master_fingerprint(initial, config, version, &recomputed)?;
    if master != proof.master {
        tracing::warn!(stored = %proof.master, recomputed = %master, "master hash mismatch");
        return Err(VerifyError::MasterMismatch {
            expected: proof.master,
            actual: master,
        });
    }

    tracing::debug!(stages = recomputed.len(), master = %master, "proof verified");
    Ok(())
}

/// Verify with options. With `guard` set, the run is first executed twice
/// to rule out nondeterministic steps.
pub fn verify_with(
    proof: &Proof,
    initial: &Value,
    config: &Mapping,
    version: &str,
    steps: &[Step],
    options: &VerifyOptions,
) -> Result<(), VerifyError> {
    if options.guard && steps.len() == proof.stage_hashes.len() {
        let run = RunDescriptor::new(initial.clone(), config.clone(), version, steps.to_vec());
        guard(&run)?;
    }
    verify(proof, initial, config, version, steps)
}

/// Replay a proof using its own provenance, resolving step names through
/// `registry`.
pub fn verify_replay(proof: &Proof, registry: &StepRegistry) -> Result<(), VerifyError> {
    verify_replay_with(proof, registry, &VerifyOptions::default())
}

/// [`verify_replay`] with options.
pub fn verify_replay_with(
    proof: &Proof,
    registry: &StepRegistry,
    options: &VerifyOptions,
) -> Result<(), VerifyError> {
    if proof.steps.len() != proof.stage_hashes.len() {
        return Err(VerifyError::LengthMismatch {
            expected: proof.stage_hashes.len(),
            actual: proof.steps.len(),
        });
    }
    let steps = registry.resolve(&proof.steps)?;
    verify_with(
        proof,
        &proof.initial,
        &proof.config,
        &proof.version,
        &steps,
        options,
    )
}

/// Nondeterminism guard: execute `run` twice, independently, and require
/// identical proofs. Returns the proof on success.
pub fn guard(run: &RunDescriptor) -> Result<Proof, VerifyError> {
    prove_guarded(run).map(|(_, proof)| proof)
}

/// [`prove`] under the nondeterminism guard. The returned output and proof
/// come from the first of the two executions.
pub fn prove_guarded(run: &RunDescriptor) -> Result<(Value, Proof), VerifyError> {
    let (output, first) = prove(run)?;
    let (_, second) = prove(run)?;

    if first == second {
        return Ok((output, first));
    }

    let stage = first
        .stage_hashes
        .iter()
        .zip(&second.stage_hashes)
        .position(|(a, b)| a != b);
    tracing::warn!(?stage, "non-deterministic step detected");
    Err(VerifyError::NonDeterministicStep { stage })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
    use std::sync::Arc;

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

    fn config() -> Mapping {
        [("offset".to_string(), Value::Int(2))].into_iter().collect()
    }

    fn proof() -> Proof {
        let run = RunDescriptor::new(Value::Int(3), config(), "v1.0", vec![add(), square()]);
        prove(&run).unwrap().1
    }

    #[test]
    fn test_replay_soundness() {
        let p = proof();
        verify(&p, &Value::Int(3), &config(), "v1.0", &[add(), square()]).unwrap();
    }

    #[test]
    fn test_tamper_any_stage_bit() {
        let p = proof();
        for index in 0..p.len() {
            for bit in [0, 7, 100, 255] {
                let mut tampered = p.clone();
                tampered.stage_hashes[index] = tampered.stage_hashes[index].with_bit_flipped(bit);
                let err = verify(&tampered, &Value::Int(3), &config(), "v1.0", &[add(), square()])
                    .unwrap_err();
                assert!(
                    matches!(err, VerifyError::StageMismatch { index: i } if i == index),
                    "bit {bit} of stage {index}: {err:?}"
                );
            }
        }
    }

    #[test]
    fn test_stage_mismatch_stops_replay() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counting_square = {
            let calls = calls.clone();
            Step::infallible("square", move |x, _, _| {
                calls.fetch_add(1, Ordering::SeqCst);
                let n = x.as_i64().unwrap_or(0);
                Value::Int(n * n)
            })
        };
        let mut tampered = proof();
        tampered.stage_hashes[0] = tampered.stage_hashes[0].with_bit_flipped(3);

        let err = verify(&tampered, &Value::Int(3), &config(), "v1.0", &[add(), counting_square])
            .unwrap_err();
        assert!(matches!(err, VerifyError::StageMismatch { index: 0 }));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_master_tamper() {
        let mut p = proof();
        let original = p.master;
        p.master = p.master.with_bit_flipped(42);
        let err = verify(&p, &Value::Int(3), &config(), "v1.0", &[add(), square()]).unwrap_err();
        match err {
            VerifyError::MasterMismatch { expected, actual } => {
                assert_eq!(expected, p.master);
                assert_eq!(actual, original);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_changed_inputs_detected_at_first_stage() {
        let p = proof();
        let err = verify(&p, &Value::Int(4), &config(), "v1.0", &[add(), square()]).unwrap_err();
        assert!(matches!(err, VerifyError::StageMismatch { index: 0 }));

        let err = verify(&p, &Value::Int(3), &config(), "v2.0", &[add(), square()]).unwrap_err();
        assert!(matches!(err, VerifyError::StageMismatch { index: 0 }));
    }

    #[test]
    fn test_length_mismatch_runs_nothing() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counting = {
            let calls = calls.clone();
            Step::infallible("add", move |x, _, _| {
                calls.fetch_add(1, Ordering::SeqCst);
                x.clone()
            })
        };
        let p = proof();
        let err = verify(&p, &Value::Int(3), &config(), "v1.0", &[counting.clone()]).unwrap_err();
        assert!(matches!(
            err,
            VerifyError::LengthMismatch {
                expected: 2,
                actual: 1
            }
        ));

        let err = verify(
            &p,
            &Value::Int(3),
            &config(),
            "v1.0",
            &[counting.clone(), counting.clone(), counting],
        )
        .unwrap_err();
        assert_eq!(err.kind(), FailureKind::LengthMismatch);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_step_failure_during_replay() {
        let p = proof();
        let broken = Step::new("square", |_, _, _| Err("disk on fire".into()));
        let err = verify(&p, &Value::Int(3), &config(), "v1.0", &[add(), broken]).unwrap_err();
        assert!(matches!(
            err,
            VerifyError::Core(CoreError::StepExecution { index: 1, .. })
        ));
        assert_eq!(err.kind(), FailureKind::Execution);
    }

    #[test]
    fn test_verify_replay_uses_provenance() {
        let p = proof();
        let registry = StepRegistry::from_steps([add(), square()]).unwrap();
        verify_replay(&p, &registry).unwrap();

        let missing = StepRegistry::from_steps([add()]).unwrap();
        let err = verify_replay(&p, &missing).unwrap_err();
        assert!(matches!(err, VerifyError::Core(CoreError::UnknownStep(name)) if name == "square"));
    }

    #[test]
    fn test_verify_replay_detects_provenance_edit() {
        let registry = StepRegistry::from_steps([add(), square()]).unwrap();

        let mut p = proof();
        p.config.insert("offset".into(), Value::Int(9));
        let err = verify_replay(&p, &registry).unwrap_err();
        assert!(matches!(err, VerifyError::StageMismatch { index: 0 }));

        let mut p = proof();
        p.steps.push("add".into());
        let err = verify_replay(&p, &registry).unwrap_err();
        assert_eq!(err.kind(), FailureKind::LengthMismatch);
    }

    #[test]
    fn test_guard_passes_pure_steps() {
        let run = RunDescriptor::new(Value::Int(3), config(), "v1.0", vec![add(), square()]);
        let guarded = guard(&run).unwrap();
        assert_eq!(guarded, proof());
    }

    #[test]
    fn test_prove_guarded_executes_twice() {
        let calls = Arc::new(AtomicI64::new(0));
        let counted = {
            let calls = calls.clone();
            Step::infallible("square", move |x, _, _| {
                calls.fetch_add(1, Ordering::SeqCst);
                let n = x.as_i64().unwrap_or(0);
                Value::Int(n * n)
            })
        };
        let run = RunDescriptor::new(Value::Int(3), config(), "v1.0", vec![add(), counted]);
        let (output, guarded) = prove_guarded(&run).unwrap();
        assert_eq!(output, Value::Int(25));
        assert_eq!(guarded, proof());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_guard_detects_hidden_state() {
        let counter = Arc::new(AtomicI64::new(0));
        let drifting = {
            let counter = counter.clone();
            Step::infallible("drift", move |x, _, _| {
                let bump = counter.fetch_add(1, Ordering::SeqCst);
                Value::Int(x.as_i64().unwrap_or(0) + bump)
            })
        };
        let run = RunDescriptor::new(Value::Int(1), config(), "v1.0", vec![add(), drifting]);
        let err = guard(&run).unwrap_err();
        assert!(matches!(err, VerifyError::NonDeterministicStep { stage: Some(1) }));
        assert_eq!(err.kind(), FailureKind::NonDeterministicStep);
    }

    #[test]
    fn test_verify_with_guard_reports_nondeterminism_first() {
        let counter = Arc::new(AtomicI64::new(0));
        let drifting = {
            let counter = counter.clone();
            Step::infallible("drift", move |x, _, _| {
                let bump = counter.fetch_add(1, Ordering::SeqCst);
                Value::Int(x.as_i64().unwrap_or(0) + bump)
            })
        };
        let run = RunDescriptor::new(Value::Int(1), config(), "v1.0", vec![drifting.clone()]);
        let p = prove(&run).unwrap().1;

        let plain = verify(&p, &Value::Int(1), &config(), "v1.0", &[drifting.clone()]).unwrap_err();
        assert_eq!(plain.kind(), FailureKind::StageMismatch);

        let guarded = verify_with(
            &p,
            &Value::Int(1),
            &config(),
            "v1.0",
            &[drifting],
            &VerifyOptions::with_guard(),
        )
        .unwrap_err();
        assert_eq!(guarded.kind(), FailureKind::NonDeterministicStep);
    }
}
