//! The Run builder: one proof-carrying execution of a step chain.
//!
//! A run is described once (initial value, configuration, version, steps),
//! finalized into a [`Proof`], and can then be re-verified or persisted.

use bor_core::{
    prove, prove_guarded, verify_with, Fingerprint, Mapping, Proof, RunDescriptor, Step,
    StepRegistry, Value, VerifyOptions,
};
use bor_store::{ProofStore, StoredLocation};
use serde::{Deserialize, Serialize};

use crate::error::{BorError, Result};

/// Serializable overview of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub initial_state: Value,
    pub num_steps: usize,
    /// Stage fingerprints; empty before finalize.
    pub fingerprints: Vec<Fingerprint>,
    /// Master fingerprint; `None` before finalize.
    pub master: Option<Fingerprint>,
}

/// A single run of a step chain.
///
/// ```rust
/// use bor::{Mapping, Run, Step, Value};
///
/// let double = Step::infallible("double", |x, _, _| Value::Int(x.as_i64().unwrap_or(0) * 2));
/// let mut run = Run::new(Value::Int(21), Mapping::new(), "v1").add_step(double);
///
/// let master = run.finalize().unwrap().master;
/// assert_eq!(run.output(), Some(&Value::Int(42)));
/// run.verify().unwrap();
/// assert_eq!(run.summary().master, Some(master));
/// ```
#[derive(Debug, Clone)]
pub struct Run {
    initial: Value,
    config: Mapping,
    version: String,
    steps: Vec<Step>,
    options: VerifyOptions,
    output: Option<Value>,
    proof: Option<Proof>,
}

impl Run {
    pub fn new(initial: impl Into<Value>, config: Mapping, version: impl Into<String>) -> Self {
        Self {
            initial: initial.into(),
            config,
            version: version.into(),
            steps: Vec::new(),
            options: VerifyOptions::default(),
            output: None,
            proof: None,
        }
    }

    /// Rebuild a run from a stored proof, resolving its steps by name.
    pub fn from_proof(proof: &Proof, registry: &StepRegistry) -> Result<Self> {
        let steps = registry.resolve(&proof.steps)?;
        let mut run = Self::new(proof.initial.clone(), proof.config.clone(), proof.version.clone());
        run.steps = steps;
        Ok(run)
    }

    /// Append a step. Any previous proof is discarded.
    pub fn add_step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self.output = None;
        self.proof = None;
        self
    }

    /// Append several steps.
    pub fn add_steps(self, steps: impl IntoIterator<Item = Step>) -> Self {
        steps.into_iter().fold(self, Run::add_step)
    }

    pub fn with_options(mut self, options: VerifyOptions) -> Self {
        self.options = options;
        self
    }

    pub fn initial(&self) -> &Value {
        &self.initial
    }

    pub fn config(&self) -> &Mapping {
        &self.config
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Immutable descriptor of this run.
    pub fn descriptor(&self) -> RunDescriptor {
        RunDescriptor::new(
            self.initial.clone(),
            self.config.clone(),
            self.version.clone(),
            self.steps.clone(),
        )
    }

    /// Execute all steps and build the proof.
    ///
    /// With the guard option set, the chain is executed twice and a
    /// nondeterministic step fails the run.
    pub fn finalize(&mut self) -> Result<&Proof> {
        let run = self.descriptor();
        let (output, proof) = if self.options.guard {
            prove_guarded(&run)?
        } else {
            prove(&run)?
        };
        tracing::info!(
            steps = proof.len(),
            master = %proof.master,
            "run finalized"
        );
        self.output = Some(output);
        Ok(self.proof.insert(proof))
    }

    /// Replay the chain and compare against the finalized proof.
    pub fn verify(&self) -> Result<()> {
        let proof = self.proof.as_ref().ok_or(BorError::NotFinalized)?;
        verify_with(
            proof,
            &self.initial,
            &self.config,
            &self.version,
            &self.steps,
            &self.options,
        )?;
        Ok(())
    }

    /// The finalized proof.
    pub fn proof(&self) -> Option<&Proof> {
        self.proof.as_ref()
    }

    /// Output of the last step, once finalized.
    pub fn output(&self) -> Option<&Value> {
        self.output.as_ref()
    }

    pub fn is_finalized(&self) -> bool {
        self.proof.is_some()
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            initial_state: self.initial.clone(),
            num_steps: self.steps.len(),
            fingerprints: self
                .proof
                .as_ref()
                .map(|p| p.stage_hashes.clone())
                .unwrap_or_default(),
            master: self.proof.as_ref().map(|p| p.master),
        }
    }

    /// Persist the finalized proof under `label`.
    pub fn save(&self, store: &dyn ProofStore, label: &str) -> Result<StoredLocation> {
        let proof = self.proof.as_ref().ok_or(BorError::NotFinalized)?;
        Ok(store.save(label, proof)?)
    }
}

/// Load the proof saved under `label` and replay it with steps from `registry`.
pub fn verify_stored(
    store: &dyn ProofStore,
    label: &str,
    registry: &StepRegistry,
    options: &VerifyOptions,
) -> Result<Proof> {
    let proof = store.load(label)?;
    bor_core::verify_replay_with(&proof, registry, options)?;
    tracing::info!(label, master = %proof.master, "stored proof verified");
    Ok(proof)
}
