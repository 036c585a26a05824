use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use areg_types::Principal;

/// Per-principal contribution counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionProfile {
    pub assets_registered: u64,
    pub revisions: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileBook {
    profiles: BTreeMap<Principal, ContributionProfile>,
}

impl ProfileBook {
    pub fn get(&self, who: &Principal) -> ContributionProfile {
        self.profiles.get(who).copied().unwrap_or_default()
    }

    pub fn record_registration(&mut self, who: &Principal) {
        self.profiles.entry(who.clone()).or_default().assets_registered += 1;
    }

    pub fn record_revision(&mut self, who: &Principal) {
        self.profiles.entry(who.clone()).or_default().revisions += 1;
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}
