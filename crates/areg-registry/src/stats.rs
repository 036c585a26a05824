use serde::{Deserialize, Serialize};

use areg_types::Sequence;

/// Registry-wide counts.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemStatistics {
    pub total_assets: u64,
    pub active_assets: u64,
    pub retired_assets: u64,
    pub total_versions: u64,
    pub total_grants: u64,
    pub audit_entries: u64,
    pub sessions: u64,
    pub subscriptions: u64,
    pub contributors: u64,
    pub last_sequence: Sequence,
}
