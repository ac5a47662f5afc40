use anyhow::{Context, Result};
use serde::Serialize;

use bor::core::{from_json_str, mapping_from_json_str, verify_replay_with};
use bor::{verify_stored, Fingerprint, ProofStore, StoreConfig, VerifyOptions};

use crate::{output, steps};

/// Replacement provenance for a stored proof.
#[derive(Debug, Default)]
pub struct Overrides {
    pub initial: Option<String>,
    pub config: Option<String>,
    pub version: Option<String>,
    pub stages: Option<Vec<String>>,
}

impl Overrides {
    fn is_empty(&self) -> bool {
        self.initial.is_none()
            && self.config.is_none()
            && self.version.is_none()
            && self.stages.is_none()
    }
}

#[derive(Debug, Serialize)]
pub struct VerifyOut<'a> {
    pub ok: bool,
    pub label: &'a str,
    pub stages: usize,
    pub master: Fingerprint,
}

pub fn run(config: &StoreConfig, label: &str, overrides: Overrides, guard: bool) -> Result<()> {
    let store = super::open(config)?;
    let registry = steps::registry()?;
    let options = if guard {
        VerifyOptions::with_guard()
    } else {
        VerifyOptions::default()
    };

    let proof = if overrides.is_empty() {
        verify_stored(store.as_ref(), label, &registry, &options)?
    } else {
        let mut proof = store
            .load(label)
            .with_context(|| format!("cannot load proof {label}"))?;
        if let Some(initial) = &overrides.initial {
            proof.initial = from_json_str(initial).context("invalid --initial")?;
        }
        if let Some(config) = &overrides.config {
            proof.config = mapping_from_json_str(config).context("invalid --config")?;
        }
        if let Some(version) = overrides.version {
            proof.version = version;
        }
        if let Some(stages) = overrides.stages {
            proof.steps = stages;
        }
        verify_replay_with(&proof, &registry, &options)?;
        proof
    };

    let out = VerifyOut {
        ok: true,
        label,
        stages: proof.len(),
        master: proof.master,
    };
    output::print(&out, || format!("ok: {label} ({} stages, master {})", out.stages, out.master))
}
