use serde::{Deserialize, Serialize};

use areg_types::{AssetId, ContentDigest, Principal, Sequence, VersionNumber};

/// Description stored on the version written at registration.
pub const INITIAL_VERSION_DESCRIPTION: &str = "Initial version";

/// Caller-supplied content of a new version, before it is numbered.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionDraft {
    pub description: String,
    pub size: u64,
    pub content_hash: ContentDigest,
    pub summary: String,
}

/// An immutable snapshot of one asset version.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRecord {
    pub asset: AssetId,
    pub version: VersionNumber,
    pub description: String,
    pub editor: Principal,
    pub sequence: Sequence,
    pub size: u64,
    pub content_hash: ContentDigest,
    pub summary: String,
}

impl VersionRecord {
    /// Number a draft as `version` of `asset`.
    pub fn from_draft(
        asset: AssetId,
        version: VersionNumber,
        draft: VersionDraft,
        editor: Principal,
        sequence: Sequence,
    ) -> Self {
        Self {
            asset,
            version,
            description: draft.description,
            editor,
            sequence,
            size: draft.size,
            content_hash: draft.content_hash,
            summary: draft.summary,
        }
    }
}
