use areg_types::{AssetId, VersionNumber};

use crate::error::LedgerError;
use crate::records::VersionRecord;

/// Write boundary for version appends.
pub trait VersionWriter {
    /// Insert `record` at (`record.asset`, `record.version`).
    ///
    /// Never overwrites: an occupied key is a [`LedgerError::DuplicateVersion`].
    fn append(&mut self, record: VersionRecord) -> Result<(), LedgerError>;
}

/// Read boundary for version queries.
pub trait VersionReader {
    fn get(&self, asset: AssetId, version: VersionNumber) -> Option<&VersionRecord>;

    /// All records for an asset in version order.
    fn history(&self, asset: AssetId) -> Vec<&VersionRecord>;

    fn version_count(&self, asset: AssetId) -> u64;
}
