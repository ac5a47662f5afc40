use anyhow::Result;
use serde::Serialize;

use bor::{ProofStore, StoreConfig};

use crate::output;

#[derive(Debug, Serialize)]
pub struct ListOut {
    pub labels: Vec<String>,
}

pub fn run(config: &StoreConfig) -> Result<()> {
    let labels = super::open(config)?.list()?;
    let text = labels.join("\n");
    output::print(&ListOut { labels }, || text)
}
