use areg_types::EntryHash;

/// Domain-separated BLAKE3 content hasher.
///
/// Each hasher carries a domain tag that is prepended to every hash
/// computation, so an audit entry and a snapshot with identical bytes never
/// share a hash.
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Hasher for audit trail entries.
    pub const AUDIT: Self = Self {
        domain: "areg-audit-v1",
    };
    /// Hasher for registry snapshots.
    pub const SNAPSHOT: Self = Self {
        domain: "areg-snapshot-v1",
    };

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> EntryHash {
        self.hash_linked(data, None)
    }

    /// Hash raw bytes chained to an optional predecessor hash.
    pub fn hash_linked(&self, data: &[u8], prev: Option<&EntryHash>) -> EntryHash {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        if let Some(prev) = prev {
            hasher.update(prev.as_bytes());
        }
        hasher.update(data);
        EntryHash::from_hash(*hasher.finalize().as_bytes())
    }

    /// Hash a serializable value as JSON with domain separation.
    pub fn hash_json<T: serde::Serialize>(&self, value: &T) -> Result<EntryHash, HasherError> {
        let data =
            serde_json::to_vec(value).map_err(|e| HasherError::Serialization(e.to_string()))?;
        Ok(self.hash(&data))
    }
}

/// Errors from hashing operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HasherError {
    #[error("serialization error: {0}")]
    Serialization(String),
}
