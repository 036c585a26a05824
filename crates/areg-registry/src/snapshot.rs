//! JSON snapshots of the full registry state.
//!
//! A snapshot carries a BLAKE3 digest of its state. Loading one re-verifies
//! the audit chain, every asset's version history, and the digest before any
//! of it is trusted.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use areg_crypto::{ContentHasher, HasherError};
use areg_ledger::HistoryValidator;
use areg_types::EntryHash;

use crate::error::{RegistryError, RegistryResult};
use crate::state::RegistryState;

/// Current snapshot layout.
pub const SNAPSHOT_FORMAT: u32 = 1;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    pub format: u32,
    pub state_hash: EntryHash,
    pub state: RegistryState,
}

impl From<HasherError> for RegistryError {
    fn from(err: HasherError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl RegistrySnapshot {
    pub(crate) fn capture(state: &RegistryState) -> RegistryResult<Self> {
        Ok(Self {
            format: SNAPSHOT_FORMAT,
            state_hash: ContentHasher::SNAPSHOT.hash_json(state)?,
            state: state.clone(),
        })
    }

    /// Check format, audit chain, version histories, and the state digest.
    pub fn verify(&self) -> RegistryResult<()> {
        if self.format != SNAPSHOT_FORMAT {
            return Err(RegistryError::Validation(format!(
                "unsupported snapshot format {} (expected {SNAPSHOT_FORMAT})",
                self.format
            )));
        }

        self.state.audit.verify()?;
        self.check_counters()?;

        for asset in self.state.assets.values() {
            if !asset.versions_consistent() {
                return Err(RegistryError::Internal(format!(
                    "{} reports version {} of {}",
                    asset.id, asset.current_version, asset.total_versions
                )));
            }
            let report = HistoryValidator::validate(&self.state.versions, asset.id, asset.total_versions);
            if let Some(violation) = report.violations.first() {
                return Err(RegistryError::Internal(format!(
                    "history of {} is inconsistent: {}",
                    asset.id, violation.description
                )));
            }
            if !self.state.analytics.contains_key(&asset.id) {
                return Err(RegistryError::Internal(format!("{} has no analytics record", asset.id)));
            }
        }

        let computed = ContentHasher::SNAPSHOT.hash_json(&self.state)?;
        if computed != self.state_hash {
            return Err(RegistryError::Internal(format!(
                "snapshot digest mismatch: stored {}, computed {}",
                self.state_hash.short_hex(),
                computed.short_hex()
            )));
        }
        Ok(())
    }

    /// No stored id may be ahead of the counter that issues it.
    fn check_counters(&self) -> RegistryResult<()> {
        let ids = &self.state.ids;
        let ahead = |what: &str, found: u64, issued: u64| {
            RegistryError::Internal(format!("{what} id {found} is ahead of its counter ({issued})"))
        };
        if let Some(last) = self.state.assets.keys().next_back() {
            if last.get() > ids.assets_issued() {
                return Err(ahead("asset", last.get(), ids.assets_issued()));
            }
        }
        if let Some(last) = self.state.audit.entries().last() {
            if last.id.get() > ids.audits_issued() {
                return Err(ahead("audit", last.id.get(), ids.audits_issued()));
            }
        }
        if let Some(last) = self.state.collab.last_session() {
            if last.get() > ids.sessions_issued() {
                return Err(ahead("session", last.get(), ids.sessions_issued()));
            }
        }
        Ok(())
    }

    pub fn to_json(&self) -> RegistryResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> RegistryResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn write_to(&self, path: &Path) -> RegistryResult<()> {
        let json = self.to_json()?;
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, path)?;
        debug!(path = %path.display(), "snapshot written");
        Ok(())
    }

    pub fn read_from(path: &Path) -> RegistryResult<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}
