use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use areg_types::{Principal, Sequence};

use crate::entry::AuditEntry;

/// Aggregate view over a slice of audit entries.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditSummary {
    pub total: u64,
    pub by_action: BTreeMap<String, u64>,
    pub by_actor: BTreeMap<Principal, u64>,
    pub first_sequence: Option<Sequence>,
    pub last_sequence: Option<Sequence>,
}

impl AuditSummary {
    pub fn build<'a>(entries: impl IntoIterator<Item = &'a AuditEntry>) -> Self {
        let mut summary = Self::default();
        for entry in entries {
            summary.total += 1;
            *summary.by_action.entry(entry.action.clone()).or_default() += 1;
            *summary.by_actor.entry(entry.actor.clone()).or_default() += 1;
            summary.first_sequence.get_or_insert(entry.sequence);
            summary.last_sequence = Some(entry.sequence);
        }
        summary
    }
}
