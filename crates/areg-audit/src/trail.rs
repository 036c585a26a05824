use serde::{Deserialize, Serialize};
use tracing::debug;

use areg_crypto::HashChainVerifier;
use areg_types::{AssetId, AuditId, EntryHash, Principal, Sequence};

use crate::action::{sanitize_action, sanitize_detail};
use crate::entry::AuditEntry;
use crate::error::AuditError;

/// The global, append-only audit log.
///
/// Entries are kept in id order. Ids come from the registry's allocator,
/// which keeps them independent of asset and version numbering.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditTrail {
    entries: Vec<AuditEntry>,
}

impl AuditTrail {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry, coercing bad action or detail strings to sentinels.
    pub fn record(
        &mut self,
        id: AuditId,
        asset: AssetId,
        action: &str,
        detail: &str,
        actor: &Principal,
        now: Sequence,
    ) -> Result<&AuditEntry, AuditError> {
        if let Some(last) = self.entries.last() {
            if id <= last.id {
                return Err(AuditError::NonMonotonicId { last: last.id, found: id });
            }
        }

        let entry = AuditEntry::sealed(
            id,
            asset,
            sanitize_action(action),
            actor.clone(),
            now,
            sanitize_detail(detail),
            self.head_hash(),
        );
        debug!(audit_id = %entry.id, %asset, action = %entry.action, "audit entry appended");
        self.entries.push(entry);
        Ok(&self.entries[self.entries.len() - 1])
    }

    /// Hash of the most recent entry.
    pub fn head_hash(&self) -> Option<EntryHash> {
        self.entries.last().map(|e| e.context_hash)
    }

    pub fn get(&self, id: AuditId) -> Option<&AuditEntry> {
        self.entries
            .binary_search_by_key(&id, |e| e.id)
            .ok()
            .map(|index| &self.entries[index])
    }

    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }

    /// Entries touching `asset`, in id order.
    pub fn entries_for(&self, asset: AssetId) -> Vec<&AuditEntry> {
        self.entries.iter().filter(|e| e.asset == asset).collect()
    }

    /// Entries with `from <= id <= to`.
    pub fn range(&self, from: AuditId, to: AuditId) -> &[AuditEntry] {
        if from > to {
            return &[];
        }
        let start = self.entries.partition_point(|e| e.id < from);
        let end = self.entries.partition_point(|e| e.id <= to);
        &self.entries[start..end]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Recompute every link and hash.
    pub fn verify(&self) -> Result<(), AuditError> {
        HashChainVerifier::verify_chain(self.entries.as_slice())?;
        Ok(())
    }
}
