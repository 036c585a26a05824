use areg_types::{AssetId, VersionNumber};

/// Errors produced by ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("version {version} of {asset} already exists")]
    DuplicateVersion { asset: AssetId, version: VersionNumber },

    #[error("append out of order for {asset}: expected {expected}, got {found}")]
    OutOfOrder {
        asset: AssetId,
        expected: VersionNumber,
        found: VersionNumber,
    },
}
