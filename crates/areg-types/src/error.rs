use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid byte length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("invalid digest: expected {expected} characters, got {actual}")]
    InvalidDigest { expected: usize, actual: usize },

    #[error("invalid principal: {0}")]
    InvalidPrincipal(String),
}
