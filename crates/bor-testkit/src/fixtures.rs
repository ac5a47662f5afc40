//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use bor::{Mapping, Proof, Run, Step, StepRegistry, Value};
use bor_store::MemoryStore;
use rand::Rng;

fn offset(config: &Mapping) -> i64 {
    config.get("offset").and_then(Value::as_i64).unwrap_or(0)
}

/// `x + config["offset"]`, default offset 0.
pub fn add_step() -> Step {
    Step::new("add", |x, c, _| {
        let n = x.as_i64().ok_or_else(|| format!("add: expected int, got {}", x.type_name()))?;
        n.checked_add(offset(c))
            .map(Value::Int)
            .ok_or_else(|| "add: overflow".into())
    })
}

/// `x * x`.
pub fn square_step() -> Step {
    Step::new("square", |x, _, _| {
        let n = x.as_i64().ok_or_else(|| format!("square: expected int, got {}", x.type_name()))?;
        n.checked_mul(n)
            .map(Value::Int)
            .ok_or_else(|| "square: overflow".into())
    })
}

/// `x * 2`.
pub fn double_step() -> Step {
    Step::new("double", |x, _, _| {
        let n = x.as_i64().ok_or_else(|| format!("double: expected int, got {}", x.type_name()))?;
        n.checked_mul(2)
            .map(Value::Int)
            .ok_or_else(|| "double: overflow".into())
    })
}

/// Pairs its input with a fresh random number, so two runs never agree.
pub fn noisy_step() -> Step {
    Step::infallible("noisy", |x, _, _| {
        let noise: i64 = rand::thread_rng().gen();
        Value::Seq(vec![x.clone(), Value::Int(noise)])
    })
}

/// Always fails.
pub fn failing_step() -> Step {
    Step::new("fail", |_, _, _| Err("fixture step failure".into()))
}

/// The reference configuration `{"offset": 2}`.
pub fn offset_config(offset: i64) -> Mapping {
    [("offset".to_string(), Value::Int(offset))].into_iter().collect()
}

/// A test fixture with a step registry and a memory store.
pub struct TestFixture {
    pub registry: StepRegistry,
    pub store: MemoryStore,
}

impl TestFixture {
    /// Create a fixture with `add`, `square`, and `double` registered.
    pub fn new() -> Self {
        let registry = StepRegistry::from_steps([add_step(), square_step(), double_step()])
            .expect("fixture step names are unique");
        Self {
            registry,
            store: MemoryStore::new(),
        }
    }

    /// Build an unfinalized run from registered step names.
    ///
    /// Panics on an unknown name.
    pub fn run(&self, initial: Value, config: Mapping, version: &str, steps: &[&str]) -> Run {
        let steps = self.registry.resolve(steps).expect("fixture step is registered");
        Run::new(initial, config, version).add_steps(steps)
    }

    /// The finalized reference run: `3 -> add(offset 2) -> square`.
    pub fn worked_example(&self) -> Run {
        let mut run = self.run(Value::Int(3), offset_config(2), "v1.0", &["add", "square"]);
        run.finalize().expect("worked example finalizes");
        run
    }

    /// Finalize the worked example and save it under `label`.
    pub fn save_worked_example(&self, label: &str) -> Proof {
        let run = self.worked_example();
        run.save(&self.store, label).expect("memory store accepts label");
        run.proof().cloned().expect("run is finalized")
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Copy of `proof` with one bit of one stage hash flipped.
pub fn tamper_stage(proof: &Proof, index: usize, bit: usize) -> Proof {
    let mut tampered = proof.clone();
    tampered.stage_hashes[index] = tampered.stage_hashes[index].with_bit_flipped(bit);
    tampered
}
