//! Error types for the BoR proof engine.

use thiserror::Error;

use crate::fingerprint::Fingerprint;

/// Error returned by a step function.
///
/// Steps are caller-supplied, so any error type is accepted.
pub type StepFailure = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised while canonicalizing, executing, or building a proof.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unsupported value: {0}")]
    UnsupportedType(String),

    #[error("step {index} ({step}) failed: {source}")]
    StepExecution {
        index: usize,
        step: String,
        #[source]
        source: StepFailure,
    },

    #[error("chain has no steps")]
    EmptyChain,

    #[error("unknown step: {0}")]
    UnknownStep(String),

    #[error("step already registered: {0}")]
    DuplicateStep(String),

    #[error("invalid fingerprint: {0}")]
    InvalidFingerprint(String),
}

/// Coarse classification of a verification failure.
///
/// Each kind is a distinct, user-visible outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    LengthMismatch,
    StageMismatch,
    MasterMismatch,
    NonDeterministicStep,
    /// Execution or canonicalization failed before any comparison could finish.
    Execution,
}

/// Verification errors. A failed verification is terminal for the call.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("length mismatch: proof has {expected} stage hashes, {actual} steps supplied")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("stage hash mismatch at stage {index}")]
    StageMismatch { index: usize },

    #[error("master hash mismatch: stored {expected}, recomputed {actual}")]
    MasterMismatch {
        expected: Fingerprint,
        actual: Fingerprint,
    },

    #[error("non-deterministic step detected{}", stage_suffix(.stage))]
    NonDeterministicStep { stage: Option<usize> },

    #[error(transparent)]
    Core(#[from] CoreError),
}

fn stage_suffix(stage: &Option<usize>) -> String {
    match stage {
        Some(i) => format!(" at stage {}", i),
        None => String::new(),
    }
}

impl VerifyError {
    /// The failure class of this error.
    pub fn kind(&self) -> FailureKind {
        match self {
            VerifyError::LengthMismatch { .. } => FailureKind::LengthMismatch,
            VerifyError::StageMismatch { .. } => FailureKind::StageMismatch,
            VerifyError::MasterMismatch { .. } => FailureKind::MasterMismatch,
            VerifyError::NonDeterministicStep { .. } => FailureKind::NonDeterministicStep,
            VerifyError::Core(_) => FailureKind::Execution,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_execution_message() {
        let err = CoreError::StepExecution {
            index: 1,
            step: "square".into(),
            source: "overflow".into(),
        };
        assert_eq!(err.to_string(), "step 1 (square) failed: overflow");
    }

    #[test]
    fn test_non_deterministic_message() {
        let err = VerifyError::NonDeterministicStep { stage: Some(2) };
        assert_eq!(err.to_string(), "non-deterministic step detected at stage 2");

        let err = VerifyError::NonDeterministicStep { stage: None };
        assert_eq!(err.to_string(), "non-deterministic step detected");
    }

    #[test]
    fn test_kind_classification() {
        assert_eq!(
            VerifyError::StageMismatch { index: 0 }.kind(),
            FailureKind::StageMismatch
        );
        assert_eq!(
            VerifyError::from(CoreError::EmptyChain).kind(),
            FailureKind::Execution
        );
    }
}
