use serde::{Deserialize, Serialize};

use crate::ids::{AssetId, AuditId, SessionId};

/// The three independent identifier counters.
///
/// Each counter stores the last identifier issued (0 = none yet). Allocation
/// is infallible and never decreases a counter; callers apply it inside the
/// same critical section as the insert that consumes the identifier.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdAllocator {
    last_asset: u64,
    last_audit: u64,
    last_session: u64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_asset(&mut self) -> AssetId {
        self.last_asset += 1;
        AssetId::new(self.last_asset)
    }

    pub fn next_audit(&mut self) -> AuditId {
        self.last_audit += 1;
        AuditId::new(self.last_audit)
    }

    pub fn next_session(&mut self) -> SessionId {
        self.last_session += 1;
        SessionId::new(self.last_session)
    }

    /// Number of asset ids issued so far.
    pub fn assets_issued(&self) -> u64 {
        self.last_asset
    }

    /// Number of audit ids issued so far.
    pub fn audits_issued(&self) -> u64 {
        self.last_audit
    }

    /// Number of session ids issued so far.
    pub fn sessions_issued(&self) -> u64 {
        self.last_session
    }

    /// The id the next asset allocation would return, without consuming it.
    pub fn peek_asset(&self) -> AssetId {
        AssetId::new(self.last_asset + 1)
    }

    /// The id the next audit allocation would return, without consuming it.
    pub fn peek_audit(&self) -> AuditId {
        AuditId::new(self.last_audit + 1)
    }

    /// The id the next session allocation would return, without consuming it.
    pub fn peek_session(&self) -> SessionId {
        SessionId::new(self.last_session + 1)
    }
}
