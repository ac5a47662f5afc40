//! Error types for the BoR facade.

use bor_core::{CoreError, FailureKind, VerifyError};
use bor_store::StoreError;
use thiserror::Error;

/// Errors that can occur during BoR operations.
#[derive(Debug, Error)]
pub enum BorError {
    /// Canonicalization, execution, or step resolution error.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Verification failed.
    #[error("verification failed: {0}")]
    Verify(#[from] VerifyError),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// `verify` called on a run that was never finalized.
    #[error("run has not been finalized")]
    NotFinalized,
}

impl BorError {
    /// The verification failure class, if this is a verification error.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            BorError::Verify(e) => Some(e.kind()),
            _ => None,
        }
    }
}

/// Result type for BoR operations.
pub type Result<T> = std::result::Result<T, BorError>;
