use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};

use bor::Backend;

#[derive(Parser, Debug, Clone)]
#[command(name = "bor", version, about = "BoR proof engine CLI")]
pub struct Cli {
    /// Emit JSON output on stdout.
    #[arg(long, global = true)]
    pub json: bool,

    /// Store root directory.
    #[arg(long, global = true, default_value = bor::store::DEFAULT_ROOT)]
    pub store_root: PathBuf,

    /// Persistence backend.
    #[arg(long, global = true, value_enum, default_value_t = BackendArg::Json)]
    pub backend: BackendArg,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendArg {
    Json,
    Sqlite,
}

impl From<BackendArg> for Backend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Json => Backend::Json,
            BackendArg::Sqlite => Backend::Sqlite,
        }
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List built-in step names.
    Steps,

    /// Execute built-in steps and build a proof.
    Run {
        /// Initial value as JSON.
        #[arg(long)]
        initial: String,

        /// Configuration as a JSON object.
        #[arg(long, default_value = "{}")]
        config: String,

        /// Version label bound into every fingerprint.
        #[arg(long, default_value = "v1.0")]
        version: String,

        /// Step names, in execution order.
        #[arg(long, num_args = 1.., required = true)]
        stages: Vec<String>,

        /// Save the proof under this label.
        #[arg(long)]
        label: Option<String>,

        /// Execute twice and fail on any nondeterministic step.
        #[arg(long)]
        guard: bool,
    },

    /// Replay a stored proof.
    Verify {
        label: String,

        /// Override the stored initial value (JSON).
        #[arg(long)]
        initial: Option<String>,

        /// Override the stored configuration (JSON object).
        #[arg(long)]
        config: Option<String>,

        /// Override the stored version label.
        #[arg(long)]
        version: Option<String>,

        /// Override the stored step names.
        #[arg(long, num_args = 1..)]
        stages: Option<Vec<String>>,

        /// Execute twice first and fail on any nondeterministic step.
        #[arg(long)]
        guard: bool,
    },

    /// Print a stored proof.
    Show { label: String },

    /// List stored labels, newest first.
    List,
}
