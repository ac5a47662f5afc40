use std::process::ExitCode;

use bor::{BorError, FailureKind, VerifyError};
use clap::Parser;
use tracing::Level;

mod args;
mod cmd;
mod output;
mod steps;

fn main() -> ExitCode {
    let cli = args::Cli::parse();
    init_logging(cli.verbose);
    output::init(cli.json);

    match cmd::dispatch(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let kind = failure_kind(&err);
            output::error(kind_name(kind), &err);
            ExitCode::from(exit_code(kind))
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Find the verification failure class anywhere in the error chain.
fn failure_kind(err: &anyhow::Error) -> Option<FailureKind> {
    err.chain().find_map(|cause| {
        if let Some(e) = cause.downcast_ref::<BorError>() {
            e.failure_kind()
        } else {
            cause.downcast_ref::<VerifyError>().map(VerifyError::kind)
        }
    })
}

fn exit_code(kind: Option<FailureKind>) -> u8 {
    match kind {
        Some(FailureKind::LengthMismatch) => 2,
        Some(FailureKind::StageMismatch) => 3,
        Some(FailureKind::MasterMismatch) => 4,
        Some(FailureKind::NonDeterministicStep) => 5,
        Some(FailureKind::Execution) | None => 1,
    }
}

fn kind_name(kind: Option<FailureKind>) -> &'static str {
    match kind {
        Some(FailureKind::LengthMismatch) => "length_mismatch",
        Some(FailureKind::StageMismatch) => "stage_mismatch",
        Some(FailureKind::MasterMismatch) => "master_mismatch",
        Some(FailureKind::NonDeterministicStep) => "non_deterministic_step",
        Some(FailureKind::Execution) => "execution",
        None => "error",
    }
}
