use thiserror::Error;

use areg_acl::AclError;
use areg_audit::AuditError;
use areg_ledger::LedgerError;
use areg_types::TypeError;

#[derive(Debug, Error)]
pub enum RegistryError {
    /// Unknown asset, version, or session.
    #[error("not found: {0}")]
    NotFound(String),

    /// A field is out of bounds or the operation does not apply.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Read attempted without a live grant or ownership.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Write or administration attempted without authority.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("capacity exceeded: {0}")]
    CapacityExceeded(String),

    #[error("duplicate entry: {0}")]
    DuplicateEntry(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type RegistryResult<T> = Result<T, RegistryError>;

impl From<AclError> for RegistryError {
    fn from(err: AclError) -> Self {
        match err {
            AclError::NotGrantAuthority { .. } | AclError::NotOwner { .. } => {
                Self::Unauthorized(err.to_string())
            }
            AclError::ExpiryNotInFuture { .. } | AclError::OwnerGrantImmutable { .. } => {
                Self::Validation(err.to_string())
            }
        }
    }
}

impl From<LedgerError> for RegistryError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::DuplicateVersion { .. } => Self::DuplicateEntry(err.to_string()),
            LedgerError::OutOfOrder { .. } => Self::Internal(err.to_string()),
        }
    }
}

impl From<AuditError> for RegistryError {
    fn from(err: AuditError) -> Self {
        match err {
            AuditError::NonMonotonicId { .. } => Self::DuplicateEntry(err.to_string()),
            AuditError::Chain(_) => Self::Internal(err.to_string()),
        }
    }
}

impl From<TypeError> for RegistryError {
    fn from(err: TypeError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<serde_json::Error> for RegistryError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("snapshot encoding: {err}"))
    }
}

impl From<std::io::Error> for RegistryError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(format!("snapshot i/o: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use areg_types::{AssetId, Principal, Sequence};

    #[test]
    fn acl_errors_map_to_kinds() {
        let unauthorized: RegistryError = AclError::NotGrantAuthority {
            asset: AssetId::new(1),
            actor: Principal::named("x"),
        }
        .into();
        assert!(matches!(unauthorized, RegistryError::Unauthorized(_)));

        let invalid: RegistryError = AclError::ExpiryNotInFuture {
            expiry: Sequence::new(1),
            now: Sequence::new(2),
        }
        .into();
        assert!(matches!(invalid, RegistryError::Validation(_)));
    }

    #[test]
    fn duplicate_version_is_duplicate_entry() {
        let err: RegistryError = LedgerError::DuplicateVersion {
            asset: AssetId::new(1),
            version: areg_types::VersionNumber::new(1),
        }
        .into();
        assert!(matches!(err, RegistryError::DuplicateEntry(_)));
    }
}
