use std::collections::BTreeSet;

use areg_types::{AssetId, VersionNumber};

use crate::records::VersionRecord;
use crate::traits::VersionReader;

/// Result of validating one asset's version history.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryReport {
    pub asset: AssetId,
    pub record_count: u64,
    pub expected_total: u64,
    pub violations: Vec<Violation>,
}

impl HistoryReport {
    /// Returns `true` if all checks passed.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

/// A specific inconsistency found in a history.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Violation {
    pub version: VersionNumber,
    pub kind: ViolationKind,
    pub description: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViolationKind {
    /// A version number is missing from 1..n.
    Gap,
    /// The same version number appears twice.
    Repeat,
    /// A record filed under this asset names a different one.
    ForeignRecord,
    /// The asset's version total disagrees with the ledger.
    HeadMismatch,
}

/// Version history validator.
pub struct HistoryValidator;

impl HistoryValidator {
    /// Validate the history of `asset` against the asset's recorded total.
    pub fn validate<R: VersionReader>(reader: &R, asset: AssetId, expected_total: u64) -> HistoryReport {
        Self::validate_records(asset, &reader.history(asset), expected_total)
    }

    /// Validate an already-fetched list of records.
    pub fn validate_records(asset: AssetId, records: &[&VersionRecord], expected_total: u64) -> HistoryReport {
        let mut violations = Vec::new();
        let mut seen = BTreeSet::new();
        let mut expected = VersionNumber::INITIAL;

        for record in records {
            if record.asset != asset {
                violations.push(Violation {
                    version: record.version,
                    kind: ViolationKind::ForeignRecord,
                    description: format!("record belongs to {}", record.asset),
                });
            }

            if !seen.insert(record.version) {
                violations.push(Violation {
                    version: record.version,
                    kind: ViolationKind::Repeat,
                    description: format!("{} appears more than once", record.version),
                });
                continue;
            }

            if record.version != expected {
                violations.push(Violation {
                    version: record.version,
                    kind: ViolationKind::Gap,
                    description: format!("expected {expected}, got {}", record.version),
                });
            }
            expected = record.version.next();
        }

        let record_count = records.len() as u64;
        let head = records.last().map_or(0, |r| r.version.get());
        if head != expected_total || record_count != expected_total {
            violations.push(Violation {
                version: VersionNumber::new(head),
                kind: ViolationKind::HeadMismatch,
                description: format!(
                    "asset reports {expected_total} version(s), ledger holds {record_count} ending at v{head}"
                ),
            });
        }

        HistoryReport {
            asset,
            record_count,
            expected_total,
            violations,
        }
    }
}
