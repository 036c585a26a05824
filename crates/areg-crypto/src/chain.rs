use areg_types::EntryHash;

use crate::hasher::ContentHasher;

/// A record linked to its predecessor by hash.
pub trait ChainLink {
    /// Stored hash of this record.
    fn entry_hash(&self) -> EntryHash;
    /// Stored hash of the preceding record. Only the first record has none.
    fn prev_hash(&self) -> Option<EntryHash>;
    /// Canonical bytes the stored hash was computed over.
    fn payload_bytes(&self) -> Vec<u8>;
}

/// Recomputes a hash chain front to back and reports the first bad link.
pub struct HashChainVerifier;

impl HashChainVerifier {
    /// Walk `links` in order. Every record must point at the hash of the
    /// record before it, and its own hash must recompute from its payload.
    pub fn verify_chain(links: &[impl ChainLink]) -> Result<(), ChainError> {
        let mut expected: Option<EntryHash> = None;
        for (index, link) in links.iter().enumerate() {
            match (expected, link.prev_hash()) {
                (None, Some(_)) => return Err(ChainError::FirstEntryLinked),
                (Some(_), None) => return Err(ChainError::MissingPrevHash { index }),
                (Some(want), Some(found)) if want != found => {
                    return Err(ChainError::BrokenLink { index })
                }
                _ => {}
            }
            let stored = link.entry_hash();
            if Self::compute_hash(&link.payload_bytes(), expected) != stored {
                return Err(ChainError::HashMismatch { index });
            }
            expected = Some(stored);
        }
        Ok(())
    }

    /// Hash of `payload` chained onto `prev_hash`.
    pub fn compute_hash(payload: &[u8], prev_hash: Option<EntryHash>) -> EntryHash {
        ContentHasher::AUDIT.hash_linked(payload, prev_hash.as_ref())
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("first entry points at a predecessor")]
    FirstEntryLinked,

    #[error("entry {index} points at the wrong predecessor")]
    BrokenLink { index: usize },

    #[error("entry {index} has no predecessor hash")]
    MissingPrevHash { index: usize },

    #[error("entry {index} does not hash to its stored value")]
    HashMismatch { index: usize },
}

impl ChainError {
    /// Position of the first offending record.
    pub fn index(&self) -> usize {
        match self {
            Self::FirstEntryLinked => 0,
            Self::BrokenLink { index } | Self::MissingPrevHash { index } | Self::HashMismatch { index } => *index,
        }
    }
}
