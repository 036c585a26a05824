use areg_types::{AssetId, Principal, Sequence};

/// Errors that can occur while modifying the access matrix.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AclError {
    /// The actor is neither the asset owner nor the system administrator.
    #[error("{actor} may not administer grants on {asset}")]
    NotGrantAuthority { asset: AssetId, actor: Principal },

    /// Only the current owner may transfer an asset.
    #[error("{actor} is not the owner of {asset}")]
    NotOwner { asset: AssetId, actor: Principal },

    /// The requested expiry is not strictly after the current sequence.
    #[error("grant expiry {expiry} must be after current sequence {now}")]
    ExpiryNotInFuture { expiry: Sequence, now: Sequence },

    /// The owner's full grant cannot be replaced or revoked.
    #[error("the owner's grant on {asset} cannot be modified")]
    OwnerGrantImmutable { asset: AssetId },
}

/// Convenience alias for matrix results.
pub type AclResult<T> = Result<T, AclError>;
