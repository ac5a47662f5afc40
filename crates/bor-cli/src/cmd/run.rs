use anyhow::{Context, Result};
use serde::Serialize;

use bor::core::{from_json_str, mapping_from_json_str};
use bor::{Run, RunSummary, StoreConfig, Value, VerifyOptions};

use crate::{output, steps};

#[derive(Debug, Serialize)]
pub struct RunOut {
    #[serde(flatten)]
    pub summary: RunSummary,
    pub output: Option<Value>,
    pub saved: Option<String>,
}

pub fn run(
    store: &StoreConfig,
    initial: &str,
    config: &str,
    version: &str,
    stages: &[String],
    label: Option<&str>,
    guard: bool,
) -> Result<()> {
    let initial = from_json_str(initial).context("invalid --initial")?;
    let config = mapping_from_json_str(config).context("invalid --config")?;
    let steps = steps::registry()?.resolve(stages)?;

    let options = if guard {
        VerifyOptions::with_guard()
    } else {
        VerifyOptions::default()
    };
    let mut run = Run::new(initial, config, version)
        .add_steps(steps)
        .with_options(options);
    run.finalize()?;

    let saved = match label {
        Some(label) => {
            let location = run.save(super::open(store)?.as_ref(), label)?;
            tracing::info!(%location, "proof saved");
            Some(location.to_string())
        }
        None => None,
    };

    let out = RunOut {
        summary: run.summary(),
        output: run.output().cloned(),
        saved,
    };
    output::print(&out, || render(&out))
}

fn render(out: &RunOut) -> String {
    let mut lines = Vec::new();
    if let Some(value) = &out.output {
        lines.push(format!("output: {value}"));
    }
    for (i, hash) in out.summary.fingerprints.iter().enumerate() {
        lines.push(format!("stage {i}: {hash}"));
    }
    if let Some(master) = &out.summary.master {
        lines.push(format!("master: {master}"));
    }
    if let Some(location) = &out.saved {
        lines.push(format!("saved:  {location}"));
    }
    lines.join("\n")
}
