use anyhow::Result;
use serde::Serialize;

use crate::output;
use crate::steps::BUILTIN;

#[derive(Debug, Serialize)]
pub struct StepsOut {
    pub steps: &'static [&'static str],
}

pub fn run() -> Result<()> {
    output::print(&StepsOut { steps: BUILTIN }, || BUILTIN.join("\n"))
}
