use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use areg_acl::{AccessConfig, AccessMatrix, CapabilitySet};
use areg_audit::AuditTrail;
use areg_ledger::VersionLedger;
use areg_types::{AssetId, IdAllocator, Principal, Sequence};

use crate::analytics::AnalyticsRecord;
use crate::asset::Asset;
use crate::collab::CollaborationBook;
use crate::context::CallContext;
use crate::error::{RegistryError, RegistryResult};
use crate::profile::ProfileBook;

/// Everything the registry persists: three counters, the five keyed maps,
/// and the passthrough stores.
///
/// Operations receive `&mut RegistryState` while the registry holds its
/// lock, so a counter bump and the insert that consumes it are never
/// observed apart.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryState {
    pub(crate) ids: IdAllocator,
    pub(crate) assets: BTreeMap<AssetId, Asset>,
    pub(crate) access: AccessMatrix,
    pub(crate) versions: VersionLedger,
    pub(crate) audit: AuditTrail,
    pub(crate) analytics: BTreeMap<AssetId, AnalyticsRecord>,
    pub(crate) collab: CollaborationBook,
    pub(crate) profiles: ProfileBook,
    /// Highest sequence any operation has run at.
    pub(crate) last_sequence: Sequence,
}

impl RegistryState {
    pub(crate) fn asset(&self, id: AssetId) -> RegistryResult<&Asset> {
        self.assets
            .get(&id)
            .ok_or_else(|| RegistryError::NotFound(format!("{id} does not exist")))
    }

    pub(crate) fn asset_mut(&mut self, id: AssetId) -> RegistryResult<&mut Asset> {
        self.assets
            .get_mut(&id)
            .ok_or_else(|| RegistryError::NotFound(format!("{id} does not exist")))
    }

    pub(crate) fn analytics_mut(&mut self, id: AssetId) -> RegistryResult<&mut AnalyticsRecord> {
        self.analytics
            .get_mut(&id)
            .ok_or_else(|| RegistryError::NotFound(format!("no analytics for {id}")))
    }

    pub(crate) fn capabilities(
        &self,
        asset: &Asset,
        actor: &Principal,
        now: Sequence,
        config: &AccessConfig,
    ) -> CapabilitySet {
        self.access.capabilities(asset.id, &asset.owner, actor, now, config)
    }

    /// The context an operation runs with: unsequenced callers get the
    /// sequence after the highest one observed.
    pub(crate) fn stamp(&self, ctx: &CallContext) -> CallContext {
        ctx.stamped(self.last_sequence)
    }

    /// Reject a sequence below the highest one already observed.
    pub(crate) fn check_sequence(&self, now: Sequence) -> RegistryResult<()> {
        if now.is_before(&self.last_sequence) {
            return Err(RegistryError::Validation(format!(
                "sequence {now} regresses below {}",
                self.last_sequence
            )));
        }
        Ok(())
    }

    pub(crate) fn observe(&mut self, now: Sequence) {
        self.last_sequence = self.last_sequence.max(now);
    }

    /// Append the audit entry that closes a mutation.
    ///
    /// The mutation is already applied; a failed append is logged and left
    /// for consumers to notice as a missing entry. The audit id is only
    /// consumed by an entry that lands.
    pub(crate) fn audit(&mut self, asset: AssetId, action: &str, detail: &str, actor: &Principal, now: Sequence) {
        let id = self.ids.peek_audit();
        match self.audit.record(id, asset, action, detail, actor, now) {
            Ok(_) => {
                self.ids.next_audit();
            }
            Err(e) => error!(%asset, action, error = %e, "audit append failed"),
        }
    }
}

pub(crate) fn ensure_active(asset: &Asset) -> RegistryResult<()> {
    if asset.is_active() {
        Ok(())
    } else {
        Err(RegistryError::Validation(format!("{} is retired", asset.id)))
    }
}

pub(crate) fn ensure_write(caps: CapabilitySet, asset: &Asset, actor: &Principal) -> RegistryResult<()> {
    if caps.can_write() {
        Ok(())
    } else {
        warn!(asset = %asset.id, %actor, "write denied");
        Err(RegistryError::Unauthorized(format!("{actor} has no write access to {}", asset.id)))
    }
}

pub(crate) fn ensure_view(caps: CapabilitySet, asset: &Asset, actor: &Principal) -> RegistryResult<()> {
    if caps.can_view() {
        Ok(())
    } else {
        warn!(asset = %asset.id, %actor, "read denied");
        Err(RegistryError::Forbidden(format!("{actor} may not view {}", asset.id)))
    }
}

pub(crate) fn ensure_owner(asset: &Asset, actor: &Principal) -> RegistryResult<()> {
    if &asset.owner == actor {
        Ok(())
    } else {
        warn!(asset = %asset.id, %actor, "owner-only operation denied");
        Err(RegistryError::Unauthorized(format!("{actor} is not the owner of {}", asset.id)))
    }
}
