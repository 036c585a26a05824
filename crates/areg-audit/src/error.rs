use areg_crypto::ChainError;
use areg_types::AuditId;

/// Errors produced by the audit trail.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum AuditError {
    /// An entry id was not strictly greater than the last one appended.
    #[error("audit id {found} is not after {last}")]
    NonMonotonicId { last: AuditId, found: AuditId },

    #[error("audit chain broken: {0}")]
    Chain(#[from] ChainError),
}
