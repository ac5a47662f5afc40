use anyhow::Result;

use bor::{ProofStore, StoreConfig};

use crate::args::{Cli, Command};

mod list;
mod run;
mod show;
mod steps;
mod verify;

pub fn dispatch(cli: Cli) -> Result<()> {
    let store = StoreConfig::new(&cli.store_root, cli.backend.into());
    match cli.command {
        Command::Steps => steps::run(),
        Command::Run {
            initial,
            config,
            version,
            stages,
            label,
            guard,
        } => run::run(&store, &initial, &config, &version, &stages, label.as_deref(), guard),
        Command::Verify {
            label,
            initial,
            config,
            version,
            stages,
            guard,
        } => verify::run(
            &store,
            &label,
            verify::Overrides {
                initial,
                config,
                version,
                stages,
            },
            guard,
        ),
        Command::Show { label } => show::run(&store, &label),
        Command::List => list::run(&store),
    }
}

fn open(config: &StoreConfig) -> Result<Box<dyn ProofStore>> {
    config.open().map_err(|e| {
        anyhow::Error::new(e).context(format!("cannot open store at {}", config.root.display()))
    })
}
