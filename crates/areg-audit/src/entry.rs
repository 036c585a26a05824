use serde::{Deserialize, Serialize};

use areg_crypto::{ChainLink, HashChainVerifier};
use areg_types::{AssetId, AuditId, EntryHash, Principal, Sequence};

/// One immutable record of a state-changing action.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: AuditId,
    pub asset: AssetId,
    pub action: String,
    pub actor: Principal,
    pub sequence: Sequence,
    pub detail: String,
    /// Hash of the preceding entry (`None` for the first entry).
    pub prev_hash: Option<EntryHash>,
    /// Chain hash over `prev_hash` and this entry's payload.
    pub context_hash: EntryHash,
}

impl AuditEntry {
    /// Build an entry and compute its chain hash.
    ///
    /// `action` and `detail` are stored as given; coercion happens in
    /// [`crate::AuditTrail::record`].
    pub fn sealed(
        id: AuditId,
        asset: AssetId,
        action: String,
        actor: Principal,
        sequence: Sequence,
        detail: String,
        prev_hash: Option<EntryHash>,
    ) -> Self {
        let mut entry = Self {
            id,
            asset,
            action,
            actor,
            sequence,
            detail,
            prev_hash,
            context_hash: EntryHash::null(),
        };
        entry.context_hash = HashChainVerifier::compute_hash(&entry.payload_bytes(), prev_hash);
        entry
    }

    /// Canonical bytes hashed into the chain.
    ///
    /// Variable-length fields are length-prefixed so that no two distinct
    /// entries share an encoding.
    fn canonical_payload(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(96 + self.action.len() + self.detail.len());
        out.extend_from_slice(&self.id.get().to_be_bytes());
        out.extend_from_slice(&self.asset.get().to_be_bytes());
        put_str(&mut out, &self.action);
        out.extend_from_slice(self.actor.as_bytes());
        out.extend_from_slice(&self.sequence.get().to_be_bytes());
        put_str(&mut out, &self.detail);
        out
    }
}

fn put_str(out: &mut Vec<u8>, s: &str) {
    out.extend_from_slice(&(s.len() as u64).to_be_bytes());
    out.extend_from_slice(s.as_bytes());
}

impl ChainLink for AuditEntry {
    fn entry_hash(&self) -> EntryHash {
        self.context_hash
    }

    fn prev_hash(&self) -> Option<EntryHash> {
        self.prev_hash
    }

    fn payload_bytes(&self) -> Vec<u8> {
        self.canonical_payload()
    }
}
