use serde::{Deserialize, Serialize};

use areg_types::{Principal, Sequence};

use crate::config::AccessConfig;
use crate::grant::AccessGrant;

/// Capabilities an actor holds over one asset at one sequence.
///
/// Grant-derived flags and ownership are kept apart: ownership implies every
/// capability, but a grant held by the owner does not make anyone else an
/// owner.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CapabilitySet {
    pub read: bool,
    pub write: bool,
    pub admin: bool,
    pub is_owner: bool,
}

impl CapabilitySet {
    pub fn can_view(&self) -> bool {
        self.read || self.is_owner
    }

    pub fn can_write(&self) -> bool {
        self.write || self.is_owner
    }
}

/// Evaluate the capability set for `actor`.
///
/// Expired grants contribute nothing to read and admin. Whether an expired
/// grant still contributes write depends on
/// [`AccessConfig::enforce_expiry_on_write`].
pub fn evaluate(
    owner: &Principal,
    grant: Option<&AccessGrant>,
    actor: &Principal,
    now: Sequence,
    config: &AccessConfig,
) -> CapabilitySet {
    let is_owner = owner == actor;
    let Some(grant) = grant else {
        return CapabilitySet {
            is_owner,
            ..Default::default()
        };
    };

    let expired = grant.is_expired_at(now);
    let live = !expired;
    let write_counts = live || !config.enforce_expiry_on_write;

    CapabilitySet {
        read: live && grant.permissions.read,
        write: write_counts && grant.permissions.write,
        admin: live && grant.permissions.admin,
        is_owner,
    }
}

/// Access summary reported to callers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessStatus {
    pub read: bool,
    pub write: bool,
    pub admin: bool,
    pub is_owner: bool,
    /// Stored expiry of the actor's grant, reported even once reached.
    pub expiry: Option<Sequence>,
    pub can_view: bool,
}

impl AccessStatus {
    /// Build a status from the actor's (possibly absent) grant.
    ///
    /// This is a read path: expired grants report no flags.
    pub fn from_grant(owner: &Principal, grant: Option<&AccessGrant>, actor: &Principal, now: Sequence) -> Self {
        let caps = evaluate(owner, grant, actor, now, &AccessConfig::default());
        Self {
            read: caps.read,
            write: caps.write,
            admin: caps.admin,
            is_owner: caps.is_owner,
            expiry: grant.and_then(|g| g.expires_at),
            can_view: caps.can_view(),
        }
    }
}
