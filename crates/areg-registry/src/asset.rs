use std::fmt;

use serde::{Deserialize, Serialize};

use areg_acl::AccessStatus;
use areg_types::{AssetId, ContentDigest, Principal, Sequence, VersionNumber};

use crate::analytics::AnalyticsRecord;

/// Lifecycle state. Transitions only from `Active` to `Deleted`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetStatus {
    #[default]
    Active,
    Deleted,
}

impl AssetStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

impl fmt::Display for AssetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => f.write_str("active"),
            Self::Deleted => f.write_str("deleted"),
        }
    }
}

/// The canonical record of one asset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub id: AssetId,
    pub name: String,
    pub owner: Principal,
    pub size: u64,
    pub created_at: Sequence,
    pub description: String,
    pub tags: Vec<String>,
    pub encrypted: bool,
    /// Hash of the encryption key, if any.
    pub key_hash: Option<ContentDigest>,
    pub current_version: VersionNumber,
    pub total_versions: u64,
    pub last_modified: Sequence,
    pub status: AssetStatus,
    pub content_hash: ContentDigest,
    pub metadata: String,
}

impl Asset {
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// `current_version == total_versions`, and at least one version exists.
    pub fn versions_consistent(&self) -> bool {
        self.total_versions >= 1 && self.current_version.get() == self.total_versions
    }
}

/// Denormalized read model returned by [`crate::Registry::read`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetView {
    pub asset: Asset,
    pub analytics: AnalyticsRecord,
    /// The reader's own access.
    pub access: AccessStatus,
}
