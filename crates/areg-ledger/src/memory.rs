use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use areg_types::{AssetId, VersionNumber};

use crate::error::LedgerError;
use crate::records::VersionRecord;
use crate::traits::{VersionReader, VersionWriter};

/// Insert-only version store keyed by (asset, version).
///
/// The ledger is plain data: the registry keeps it inside its locked state
/// and serializes it as part of a snapshot.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionLedger {
    versions: BTreeMap<AssetId, BTreeMap<VersionNumber, VersionRecord>>,
}

impl VersionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total records across all assets.
    pub fn total_records(&self) -> u64 {
        self.versions.values().map(|v| v.len() as u64).sum()
    }
}

impl VersionWriter for VersionLedger {
    fn append(&mut self, record: VersionRecord) -> Result<(), LedgerError> {
        let stream = self.versions.entry(record.asset).or_default();
        if stream.contains_key(&record.version) {
            return Err(LedgerError::DuplicateVersion {
                asset: record.asset,
                version: record.version,
            });
        }

        let expected = VersionNumber::new(stream.len() as u64 + 1);
        if record.version != expected {
            return Err(LedgerError::OutOfOrder {
                asset: record.asset,
                expected,
                found: record.version,
            });
        }

        debug!(asset = %record.asset, version = %record.version, "version appended");
        stream.insert(record.version, record);
        Ok(())
    }
}

impl VersionReader for VersionLedger {
    fn get(&self, asset: AssetId, version: VersionNumber) -> Option<&VersionRecord> {
        self.versions.get(&asset).and_then(|s| s.get(&version))
    }

    fn history(&self, asset: AssetId) -> Vec<&VersionRecord> {
        self.versions
            .get(&asset)
            .map(|s| s.values().collect())
            .unwrap_or_default()
    }

    fn version_count(&self, asset: AssetId) -> u64 {
        self.versions.get(&asset).map_or(0, |s| s.len() as u64)
    }
}
