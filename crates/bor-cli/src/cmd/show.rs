use anyhow::{Context, Result};
use serde::Serialize;

use bor::{Proof, ProofStore, StoreConfig};

use crate::output;

#[derive(Debug, Serialize)]
pub struct ShowOut<'a> {
    pub label: &'a str,
    pub proof: &'a Proof,
}

pub fn run(config: &StoreConfig, label: &str) -> Result<()> {
    let proof = super::open(config)?
        .load(label)
        .with_context(|| format!("cannot load proof {label}"))?;

    output::print(&ShowOut { label, proof: &proof }, || render(label, &proof))
}

fn render(label: &str, proof: &Proof) -> String {
    let mut lines = vec![
        format!("label:   {label}"),
        format!("initial: {}", proof.initial),
        format!("config:  {}", bor::Value::Map(proof.config.clone())),
        format!("version: {}", proof.version),
    ];
    for (i, (step, hash)) in proof.steps.iter().zip(&proof.stage_hashes).enumerate() {
        lines.push(format!("stage {i}: {step} {hash}"));
    }
    lines.push(format!("master:  {}", proof.master));
    lines.join("\n")
}
