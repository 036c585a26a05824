use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info};

use areg_acl::{AccessGrant, AccessMatrix, AccessStatus, GrantRequest};
use areg_audit::{action, AuditEntry, AuditSummary};
use areg_ledger::{
    HistoryReport, HistoryValidator, VersionDraft, VersionReader, VersionRecord, VersionWriter,
    INITIAL_VERSION_DESCRIPTION,
};
use areg_types::{AssetId, AuditId, Principal, Sequence, SessionId, VersionNumber};

use crate::analytics::AnalyticsRecord;
use crate::asset::{Asset, AssetStatus, AssetView};
use crate::collab::{CollaborationSession, SessionRequest};
use crate::config::RegistryConfig;
use crate::context::CallContext;
use crate::error::{RegistryError, RegistryResult};
use crate::profile::ContributionProfile;
use crate::snapshot::RegistrySnapshot;
use crate::state::{ensure_active, ensure_owner, ensure_view, ensure_write, RegistryState};
use crate::stats::SystemStatistics;
use crate::validation::{check_rating, AssetDraft, MetadataUpdate, RevisionDraft};

/// The asset registry.
///
/// All state sits behind one lock. Each mutating operation takes the write
/// lock once, validates everything, applies its changes, and appends its
/// audit entry before releasing the lock, so operations are serialized and
/// a failed operation leaves no trace.
pub struct Registry {
    config: RegistryConfig,
    inner: RwLock<RegistryState>,
}

impl Registry {
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            config,
            inner: RwLock::new(RegistryState::default()),
        }
    }

    /// Rebuild a registry from a verified snapshot.
    pub fn from_snapshot(config: RegistryConfig, snapshot: RegistrySnapshot) -> RegistryResult<Self> {
        snapshot.verify()?;
        Ok(Self {
            config,
            inner: RwLock::new(snapshot.state),
        })
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    fn read_state(&self) -> RegistryResult<RwLockReadGuard<'_, RegistryState>> {
        self.inner
            .read()
            .map_err(|_| RegistryError::Internal("registry read lock poisoned".into()))
    }

    fn write_state(&self) -> RegistryResult<RwLockWriteGuard<'_, RegistryState>> {
        self.inner
            .write()
            .map_err(|_| RegistryError::Internal("registry write lock poisoned".into()))
    }

    // ---- Lifecycle ----

    /// Register a new asset. The caller becomes its owner.
    pub fn register(&self, draft: AssetDraft, ctx: &CallContext) -> RegistryResult<AssetId> {
        let valid = draft.validate()?;
        let mut guard = self.write_state()?;
        let state = &mut *guard;
        let ctx = &state.stamp(ctx);
        state.check_sequence(ctx.now)?;

        let id = state.ids.peek_asset();
        if state.assets.contains_key(&id) || state.versions.version_count(id) > 0 {
            return Err(RegistryError::DuplicateEntry(format!("{id} is already in use")));
        }

        let initial = VersionRecord::from_draft(
            id,
            VersionNumber::INITIAL,
            VersionDraft {
                description: INITIAL_VERSION_DESCRIPTION.into(),
                size: valid.size,
                content_hash: valid.content_hash.clone(),
                summary: valid.description.clone(),
            },
            ctx.caller.clone(),
            ctx.now,
        );
        state.versions.append(initial)?;
        let id = state.ids.next_asset();

        let detail = format!("registered '{}' ({} bytes)", valid.name, valid.size);
        state.assets.insert(
            id,
            Asset {
                id,
                name: valid.name,
                owner: ctx.caller.clone(),
                size: valid.size,
                created_at: ctx.now,
                description: valid.description,
                tags: valid.tags,
                encrypted: valid.encrypted,
                key_hash: valid.key_hash,
                current_version: VersionNumber::INITIAL,
                total_versions: 1,
                last_modified: ctx.now,
                status: AssetStatus::Active,
                content_hash: valid.content_hash,
                metadata: valid.metadata,
            },
        );
        state.access.install_owner(id, &ctx.caller, &ctx.caller, ctx.now);
        state.analytics.insert(id, AnalyticsRecord::default());
        state.profiles.record_registration(&ctx.caller);
        state.observe(ctx.now);
        state.audit(id, action::REGISTER, &detail, &ctx.caller, ctx.now);

        info!(asset = %id, actor = %ctx.caller, "asset registered");
        Ok(id)
    }

    /// Append a new content version and make it current.
    pub fn revise(&self, id: AssetId, draft: RevisionDraft, ctx: &CallContext) -> RegistryResult<VersionNumber> {
        let mut guard = self.write_state()?;
        let state = &mut *guard;
        let ctx = &state.stamp(ctx);
        state.check_sequence(ctx.now)?;

        let asset = state.asset(id)?;
        let caps = state.capabilities(asset, &ctx.caller, ctx.now, &self.config.access);
        ensure_write(caps, asset, &ctx.caller)?;
        ensure_active(asset)?;
        let draft = draft.validate()?;

        let version = VersionNumber::new(asset.total_versions + 1);
        let record = VersionRecord::from_draft(id, version, draft, ctx.caller.clone(), ctx.now);
        state.versions.append(record.clone())?;

        let asset = state.asset_mut(id)?;
        asset.current_version = version;
        asset.total_versions = version.get();
        asset.last_modified = ctx.now;
        asset.size = record.size;
        asset.content_hash = record.content_hash;

        state.profiles.record_revision(&ctx.caller);
        state.observe(ctx.now);
        state.audit(id, action::REVISE, &record.summary, &ctx.caller, ctx.now);

        info!(asset = %id, %version, actor = %ctx.caller, "asset revised");
        Ok(version)
    }

    /// Rewrite display fields without creating a version.
    pub fn update_metadata(&self, id: AssetId, update: MetadataUpdate, ctx: &CallContext) -> RegistryResult<()> {
        let mut guard = self.write_state()?;
        let state = &mut *guard;
        let ctx = &state.stamp(ctx);
        state.check_sequence(ctx.now)?;

        let asset = state.asset(id)?;
        let caps = state.capabilities(asset, &ctx.caller, ctx.now, &self.config.access);
        ensure_write(caps, asset, &ctx.caller)?;
        ensure_active(asset)?;
        update.validate()?;

        let asset = state.asset_mut(id)?;
        let detail = format!("renamed '{}' -> '{}'", asset.name, update.name);
        asset.name = update.name;
        asset.size = update.size;
        asset.description = update.description;
        asset.tags = update.tags;
        asset.last_modified = ctx.now;

        state.observe(ctx.now);
        state.audit(id, action::UPDATE_METADATA, &detail, &ctx.caller, ctx.now);

        info!(asset = %id, actor = %ctx.caller, "metadata updated");
        Ok(())
    }

    // ---- Access control ----

    /// Create or replace a user's grant. Returns the stored grant.
    pub fn grant_access(&self, id: AssetId, request: GrantRequest, ctx: &CallContext) -> RegistryResult<AccessGrant> {
        let mut guard = self.write_state()?;
        let state = &mut *guard;
        let ctx = &state.stamp(ctx);
        state.check_sequence(ctx.now)?;

        let asset = state.asset(id)?;
        let owner = asset.owner.clone();
        AccessMatrix::check_grant(id, &owner, &request, &ctx.caller, ctx.now, &self.config.access)?;
        ensure_active(asset)?;

        state
            .access
            .grant(id, &owner, &request, &ctx.caller, ctx.now, &self.config.access)?;
        let stored = state
            .access
            .stored_grant(id, &request.target)
            .cloned()
            .ok_or_else(|| RegistryError::Internal(format!("grant on {id} vanished after upsert")))?;

        let p = request.permissions;
        let detail = match request.expires_at {
            Some(expiry) => format!(
                "granted r={} w={} a={} to {} until {expiry}",
                p.read, p.write, p.admin, request.target
            ),
            None => format!("granted r={} w={} a={} to {}", p.read, p.write, p.admin, request.target),
        };
        state.observe(ctx.now);
        state.audit(id, action::GRANT_ACCESS, &detail, &ctx.caller, ctx.now);

        info!(asset = %id, target = %request.target, actor = %ctx.caller, "access granted");
        Ok(stored)
    }

    /// Remove a user's grant. Returns `false` if there was none.
    pub fn revoke_access(&self, id: AssetId, target: &Principal, ctx: &CallContext) -> RegistryResult<bool> {
        let mut guard = self.write_state()?;
        let state = &mut *guard;
        let ctx = &state.stamp(ctx);
        state.check_sequence(ctx.now)?;

        let asset = state.asset(id)?;
        let owner = asset.owner.clone();
        AccessMatrix::check_revoke(id, &owner, target, &ctx.caller, &self.config.access)?;
        ensure_active(asset)?;

        let removed = state
            .access
            .revoke(id, &owner, target, &ctx.caller, &self.config.access)?
            .is_some();
        state.observe(ctx.now);
        if removed {
            state.audit(id, action::REVOKE_ACCESS, &format!("revoked {target}"), &ctx.caller, ctx.now);
            info!(asset = %id, %target, actor = %ctx.caller, "access revoked");
        }
        Ok(removed)
    }

    /// Hand the asset to `new_owner`, who receives a full non-expiring grant.
    pub fn transfer_ownership(&self, id: AssetId, new_owner: &Principal, ctx: &CallContext) -> RegistryResult<()> {
        let mut guard = self.write_state()?;
        let state = &mut *guard;
        let ctx = &state.stamp(ctx);
        state.check_sequence(ctx.now)?;

        let asset = state.asset(id)?;
        let previous = asset.owner.clone();
        AccessMatrix::check_transfer(id, &previous, &ctx.caller)?;
        ensure_active(asset)?;
        if new_owner == &previous {
            return Err(RegistryError::Validation(format!("{new_owner} already owns {id}")));
        }

        let asset = state.asset_mut(id)?;
        asset.owner = new_owner.clone();
        asset.last_modified = ctx.now;
        state
            .access
            .transfer(id, &previous, new_owner, ctx.now, &self.config.access);

        state.observe(ctx.now);
        state.audit(
            id,
            action::TRANSFER,
            &format!("ownership {previous} -> {new_owner}"),
            &ctx.caller,
            ctx.now,
        );

        info!(asset = %id, from = %previous, to = %new_owner, "ownership transferred");
        Ok(())
    }

    /// Soft-delete: the record stays readable with status `deleted`.
    pub fn retire(&self, id: AssetId, ctx: &CallContext) -> RegistryResult<()> {
        let mut guard = self.write_state()?;
        let state = &mut *guard;
        let ctx = &state.stamp(ctx);
        state.check_sequence(ctx.now)?;

        let asset = state.asset(id)?;
        ensure_owner(asset, &ctx.caller)?;
        ensure_active(asset)?;

        let asset = state.asset_mut(id)?;
        asset.status = AssetStatus::Deleted;
        asset.last_modified = ctx.now;

        state.observe(ctx.now);
        state.audit(id, action::RETIRE, "asset retired", &ctx.caller, ctx.now);

        info!(asset = %id, actor = %ctx.caller, "asset retired");
        Ok(())
    }

    // ---- Passthroughs ----

    /// Schedule a collaboration session on an asset the caller can write.
    pub fn create_collaboration_session(
        &self,
        id: AssetId,
        request: SessionRequest,
        ctx: &CallContext,
    ) -> RegistryResult<SessionId> {
        let mut guard = self.write_state()?;
        let state = &mut *guard;
        let ctx = &state.stamp(ctx);
        state.check_sequence(ctx.now)?;

        let asset = state.asset(id)?;
        let caps = state.capabilities(asset, &ctx.caller, ctx.now, &self.config.access);
        ensure_write(caps, asset, &ctx.caller)?;
        ensure_active(asset)?;
        request.validate()?;

        let session_id = state.ids.peek_session();
        if state.collab.session(session_id).is_some() {
            return Err(RegistryError::DuplicateEntry(format!("{session_id} is already in use")));
        }
        let session_id = state.ids.next_session();
        let detail = format!("{session_id} '{}'", request.title);
        state.collab.insert_session(CollaborationSession {
            id: session_id,
            asset: id,
            title: request.title,
            organizer: ctx.caller.clone(),
            starts_at: request.starts_at,
            ends_at: request.ends_at,
            created_at: ctx.now,
        })?;
        state.analytics_mut(id)?.record_collaboration();

        state.observe(ctx.now);
        state.audit(id, action::COLLAB_SESSION, &detail, &ctx.caller, ctx.now);

        info!(asset = %id, session = %session_id, actor = %ctx.caller, "collaboration session created");
        Ok(session_id)
    }

    /// Subscribe the caller to an asset. Returns `false` if already subscribed.
    pub fn subscribe(&self, id: AssetId, ctx: &CallContext) -> RegistryResult<bool> {
        let mut guard = self.write_state()?;
        let state = &mut *guard;
        let ctx = &state.stamp(ctx);
        state.check_sequence(ctx.now)?;

        let asset = state.asset(id)?;
        let caps = state.capabilities(asset, &ctx.caller, ctx.now, &self.config.access);
        ensure_view(caps, asset, &ctx.caller)?;
        ensure_active(asset)?;

        let added = state.collab.subscribe(id, &ctx.caller);
        state.observe(ctx.now);
        if added {
            state.audit(id, action::SUBSCRIBE, "subscribed", &ctx.caller, ctx.now);
            info!(asset = %id, actor = %ctx.caller, "subscribed");
        }
        Ok(added)
    }

    // ---- Ratings and analytics ----

    /// Fold a rating into the asset's running mean.
    pub fn rate(&self, id: AssetId, rating: u8, ctx: &CallContext) -> RegistryResult<AnalyticsRecord> {
        let mut guard = self.write_state()?;
        let state = &mut *guard;
        let ctx = &state.stamp(ctx);
        state.check_sequence(ctx.now)?;

        let asset = state.asset(id)?;
        let caps = state.capabilities(asset, &ctx.caller, ctx.now, &self.config.access);
        ensure_view(caps, asset, &ctx.caller)?;
        ensure_active(asset)?;
        check_rating(rating)?;

        let record = state.analytics_mut(id)?;
        let average = record.apply_rating(rating);
        let snapshot = record.clone();

        state.observe(ctx.now);
        state.audit(
            id,
            action::RATE,
            &format!("rated {rating}; average {average} over {}", snapshot.rating_count),
            &ctx.caller,
            ctx.now,
        );

        info!(asset = %id, rating, average, actor = %ctx.caller, "asset rated");
        Ok(snapshot)
    }

    /// Full view of an asset for a caller who may see it. Counts as a view.
    pub fn read(&self, id: AssetId, ctx: &CallContext) -> RegistryResult<AssetView> {
        let mut guard = self.write_state()?;
        let state = &mut *guard;
        let ctx = &state.stamp(ctx);
        state.check_sequence(ctx.now)?;

        let asset = state.asset(id)?;
        let caps = state.capabilities(asset, &ctx.caller, ctx.now, &self.config.access);
        ensure_view(caps, asset, &ctx.caller)?;
        let asset = asset.clone();
        let access = state.access.status(id, &asset.owner, &ctx.caller, ctx.now);

        let analytics = state.analytics_mut(id)?;
        analytics.record_view(ctx.now);
        let analytics = analytics.clone();
        state.observe(ctx.now);

        debug!(asset = %id, actor = %ctx.caller, "asset read");
        Ok(AssetView {
            asset,
            analytics,
            access,
        })
    }

    /// Count a download by a caller who may see the asset.
    pub fn record_download(&self, id: AssetId, ctx: &CallContext) -> RegistryResult<AnalyticsRecord> {
        let mut guard = self.write_state()?;
        let state = &mut *guard;
        let ctx = &state.stamp(ctx);
        state.check_sequence(ctx.now)?;

        let asset = state.asset(id)?;
        let caps = state.capabilities(asset, &ctx.caller, ctx.now, &self.config.access);
        ensure_view(caps, asset, &ctx.caller)?;

        let analytics = state.analytics_mut(id)?;
        analytics.record_download(ctx.now);
        let analytics = analytics.clone();
        state.observe(ctx.now);
        Ok(analytics)
    }

    pub fn analytics(&self, id: AssetId) -> RegistryResult<AnalyticsRecord> {
        let state = self.read_state()?;
        state.asset(id)?;
        state
            .analytics
            .get(&id)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(format!("no analytics for {id}")))
    }

    // ---- Queries ----

    pub fn version_count(&self, id: AssetId) -> RegistryResult<u64> {
        Ok(self.read_state()?.asset(id)?.total_versions)
    }

    /// One version record, for a caller who may see the asset.
    pub fn version(&self, id: AssetId, version: VersionNumber, ctx: &CallContext) -> RegistryResult<VersionRecord> {
        let state = self.read_state()?;
        let ctx = &state.stamp(ctx);
        let asset = state.asset(id)?;
        ensure_view(
            state.capabilities(asset, &ctx.caller, ctx.now, &self.config.access),
            asset,
            &ctx.caller,
        )?;
        state
            .versions
            .get(id, version)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(format!("{version} of {id} does not exist")))
    }

    /// All version records, oldest first.
    pub fn history(&self, id: AssetId, ctx: &CallContext) -> RegistryResult<Vec<VersionRecord>> {
        let state = self.read_state()?;
        let ctx = &state.stamp(ctx);
        let asset = state.asset(id)?;
        ensure_view(
            state.capabilities(asset, &ctx.caller, ctx.now, &self.config.access),
            asset,
            &ctx.caller,
        )?;
        Ok(state.versions.history(id).into_iter().cloned().collect())
    }

    /// The sequence an unsequenced operation would run at right now.
    pub fn next_sequence(&self) -> RegistryResult<Sequence> {
        Ok(self.read_state()?.last_sequence.next())
    }

    pub fn access_status(&self, id: AssetId, user: &Principal, now: Sequence) -> RegistryResult<AccessStatus> {
        let state = self.read_state()?;
        let asset = state.asset(id)?;
        Ok(state.access.status(id, &asset.owner, user, now))
    }

    /// Stored grants on an asset, for a caller who may see it.
    pub fn grants(&self, id: AssetId, ctx: &CallContext) -> RegistryResult<Vec<(Principal, AccessGrant)>> {
        let state = self.read_state()?;
        let ctx = &state.stamp(ctx);
        let asset = state.asset(id)?;
        ensure_view(
            state.capabilities(asset, &ctx.caller, ctx.now, &self.config.access),
            asset,
            &ctx.caller,
        )?;
        Ok(state.access.grants_for(id))
    }

    /// Every registered asset id, retired ones included.
    pub fn asset_ids(&self) -> RegistryResult<Vec<AssetId>> {
        Ok(self.read_state()?.assets.keys().copied().collect())
    }

    pub fn owner(&self, id: AssetId) -> RegistryResult<Principal> {
        Ok(self.read_state()?.asset(id)?.owner.clone())
    }

    pub fn sessions(&self, id: AssetId) -> RegistryResult<Vec<CollaborationSession>> {
        let state = self.read_state()?;
        state.asset(id)?;
        Ok(state.collab.sessions_for(id).into_iter().cloned().collect())
    }

    pub fn subscribers(&self, id: AssetId) -> RegistryResult<Vec<Principal>> {
        let state = self.read_state()?;
        state.asset(id)?;
        Ok(state.collab.subscribers(id))
    }

    pub fn contributions(&self, who: &Principal) -> RegistryResult<ContributionProfile> {
        Ok(self.read_state()?.profiles.get(who))
    }

    // ---- Audit and integrity ----

    /// Audit entries in id order, optionally limited to one asset.
    pub fn audit_trail(&self, asset: Option<AssetId>) -> RegistryResult<Vec<AuditEntry>> {
        let state = self.read_state()?;
        Ok(match asset {
            Some(id) => state.audit.entries_for(id).into_iter().cloned().collect(),
            None => state.audit.entries().to_vec(),
        })
    }

    /// Global audit entries with `from <= id <= to`.
    pub fn audit_range(&self, from: AuditId, to: AuditId) -> RegistryResult<Vec<AuditEntry>> {
        Ok(self.read_state()?.audit.range(from, to).to_vec())
    }

    pub fn audit_summary(&self, asset: Option<AssetId>) -> RegistryResult<AuditSummary> {
        let state = self.read_state()?;
        Ok(match asset {
            Some(id) => AuditSummary::build(state.audit.entries_for(id)),
            None => AuditSummary::build(state.audit.entries()),
        })
    }

    /// Recompute the audit hash chain. Returns the number of entries checked.
    pub fn verify_audit_chain(&self) -> RegistryResult<u64> {
        let state = self.read_state()?;
        state.audit.verify()?;
        Ok(state.audit.len() as u64)
    }

    /// Check one asset's history against its recorded version total.
    pub fn validate_history(&self, id: AssetId) -> RegistryResult<HistoryReport> {
        let state = self.read_state()?;
        let asset = state.asset(id)?;
        Ok(HistoryValidator::validate(&state.versions, id, asset.total_versions))
    }

    pub fn system_statistics(&self) -> RegistryResult<SystemStatistics> {
        let state = self.read_state()?;
        let active = state.assets.values().filter(|a| a.is_active()).count() as u64;
        let total = state.assets.len() as u64;
        Ok(SystemStatistics {
            total_assets: total,
            active_assets: active,
            retired_assets: total - active,
            total_versions: state.versions.total_records(),
            total_grants: state.access.grant_count() as u64,
            audit_entries: state.audit.len() as u64,
            sessions: state.collab.session_count(),
            subscriptions: state.collab.subscription_count(),
            contributors: state.profiles.len() as u64,
            last_sequence: state.last_sequence,
        })
    }

    // ---- Persistence ----

    pub fn snapshot(&self) -> RegistryResult<RegistrySnapshot> {
        let state = self.read_state()?;
        RegistrySnapshot::capture(&state)
    }

    /// Replace all state with a verified snapshot.
    pub fn restore(&self, snapshot: RegistrySnapshot) -> RegistryResult<()> {
        snapshot.verify()?;
        let mut state = self.write_state()?;
        *state = snapshot.state;
        info!(assets = state.assets.len(), audit_entries = state.audit.len(), "registry restored");
        Ok(())
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(RegistryConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use areg_acl::{AccessConfig, Permissions};
    use areg_ledger::ViolationKind;
    use proptest::prelude::*;

    fn hash(c: char) -> String {
        c.to_string().repeat(64)
    }

    fn design_doc() -> AssetDraft {
        AssetDraft {
            name: "design.pdf".into(),
            size: 2048,
            description: "design doc".into(),
            tags: vec!["draft".into()],
            encrypted: false,
            key_hash: String::new(),
            content_hash: hash('a'),
            metadata: "{}".into(),
        }
    }

    fn typo_fix() -> RevisionDraft {
        RevisionDraft {
            description: "fix typo".into(),
            size: 2050,
            content_hash: hash('b'),
            summary: "typo fix".into(),
        }
    }

    fn owner(at: u64) -> CallContext {
        CallContext::named("owner", at)
    }

    fn as_user(name: &str, at: u64) -> CallContext {
        CallContext::named(name, at)
    }

    fn grant_read(registry: &Registry, id: AssetId, user: &str, at: u64) {
        let request = GrantRequest::new(Principal::named(user), Permissions::READ_ONLY, None);
        registry.grant_access(id, request, &owner(at)).unwrap();
    }

    fn registered() -> (Registry, AssetId) {
        let registry = Registry::default();
        let id = registry.register(design_doc(), &owner(1)).unwrap();
        (registry, id)
    }

    #[test]
    fn register_revise_grant_scenario() {
        let registry = Registry::default();
        let id = registry.register(design_doc(), &owner(1)).unwrap();
        assert_eq!(id, AssetId::new(1));
        assert_eq!(registry.version_count(id).unwrap(), 1);

        let version = registry.revise(id, typo_fix(), &owner(2)).unwrap();
        assert_eq!(version, VersionNumber::new(2));

        let view = registry.read(id, &owner(3)).unwrap();
        assert_eq!(view.asset.current_version, VersionNumber::new(2));
        assert_eq!(view.asset.total_versions, 2);
        assert_eq!(view.asset.content_hash.as_str(), hash('b'));
        assert_eq!(view.asset.description, "design doc");

        let record = registry.version(id, VersionNumber::new(2), &owner(3)).unwrap();
        assert_eq!(record.description, "fix typo");
        assert_eq!(record.content_hash.as_str(), hash('b'));
        assert_eq!(record.summary, "typo fix");

        grant_read(&registry, id, "userX", 4);
        assert!(registry.read(id, &as_user("userX", 5)).is_ok());
        let err = registry.revise(id, typo_fix(), &as_user("userX", 6)).unwrap_err();
        assert!(matches!(err, RegistryError::Unauthorized(_)));
    }

    #[test]
    fn ids_strictly_increase_and_start_at_version_one() {
        let registry = Registry::default();
        let mut last = AssetId::new(0);
        for at in 1..=5 {
            let id = registry.register(design_doc(), &owner(at)).unwrap();
            assert!(id > last);
            last = id;
            let view = registry.read(id, &owner(at)).unwrap();
            assert_eq!(view.asset.current_version, VersionNumber::INITIAL);
            assert_eq!(view.asset.total_versions, 1);
        }
    }

    #[test]
    fn initial_version_record_is_written() {
        let (registry, id) = registered();
        let record = registry.version(id, VersionNumber::INITIAL, &owner(2)).unwrap();
        assert_eq!(record.description, INITIAL_VERSION_DESCRIPTION);
        assert_eq!(record.editor, Principal::named("owner"));
        assert_eq!(record.size, 2048);
    }

    #[test]
    fn failed_registration_leaves_no_trace() {
        let registry = Registry::default();
        let mut bad = design_doc();
        bad.size = 0;
        assert!(matches!(registry.register(bad, &owner(1)), Err(RegistryError::Validation(_))));

        let mut huge = design_doc();
        huge.size = 2_000_000_000;
        assert!(matches!(registry.register(huge, &owner(1)), Err(RegistryError::CapacityExceeded(_))));

        let stats = registry.system_statistics().unwrap();
        assert_eq!(stats.total_assets, 0);
        assert_eq!(stats.audit_entries, 0);
        assert_eq!(stats.total_versions, 0);
        assert_eq!(registry.register(design_doc(), &owner(1)).unwrap(), AssetId::new(1));
    }

    #[test]
    fn read_requires_grant_or_ownership() {
        let (registry, id) = registered();
        let err = registry.read(id, &as_user("stranger", 2)).unwrap_err();
        assert!(matches!(err, RegistryError::Forbidden(_)));
        assert!(registry.read(id, &owner(2)).is_ok());
    }

    #[test]
    fn read_counts_views() {
        let (registry, id) = registered();
        registry.read(id, &owner(2)).unwrap();
        let view = registry.read(id, &owner(3)).unwrap();
        assert_eq!(view.analytics.views, 2);
        assert_eq!(view.analytics.last_access, Some(Sequence::new(3)));
        assert!(view.access.is_owner);
    }

    #[test]
    fn unknown_asset_is_not_found() {
        let registry = Registry::default();
        assert!(matches!(registry.read(AssetId::new(9), &owner(1)), Err(RegistryError::NotFound(_))));
        assert!(matches!(registry.version_count(AssetId::new(9)), Err(RegistryError::NotFound(_))));
        assert!(matches!(registry.owner(AssetId::new(9)), Err(RegistryError::NotFound(_))));
    }

    #[test]
    fn grant_by_non_owner_is_unauthorized() {
        let (registry, id) = registered();
        let request = GrantRequest::new(Principal::named("x"), Permissions::FULL, None);
        let err = registry.grant_access(id, request, &as_user("mallory", 2)).unwrap_err();
        assert!(matches!(err, RegistryError::Unauthorized(_)));
        assert_eq!(registry.audit_trail(Some(id)).unwrap().len(), 1);
    }

    #[test]
    fn system_admin_may_grant() {
        let admin = Principal::named("root");
        let config = RegistryConfig::with_access(AccessConfig::default().with_admin(admin));
        let registry = Registry::new(config);
        let id = registry.register(design_doc(), &owner(1)).unwrap();

        let request = GrantRequest::new(Principal::named("x"), Permissions::READ_ONLY, None);
        let grant = registry.grant_access(id, request, &as_user("root", 2)).unwrap();
        assert_eq!(grant.granter, Principal::named("root"));
        assert!(registry.read(id, &as_user("x", 3)).is_ok());
    }

    #[test]
    fn grant_expiry_must_be_in_the_future() {
        let (registry, id) = registered();
        let request = GrantRequest::new(Principal::named("x"), Permissions::READ_ONLY, Some(Sequence::new(2)));
        let err = registry.grant_access(id, request, &owner(5)).unwrap_err();
        assert!(matches!(err, RegistryError::Validation(_)));
    }

    #[test]
    fn expired_read_grant_is_forbidden() {
        let (registry, id) = registered();
        let request = GrantRequest::new(Principal::named("x"), Permissions::READ_ONLY, Some(Sequence::new(10)));
        registry.grant_access(id, request, &owner(2)).unwrap();

        assert!(registry.read(id, &as_user("x", 9)).is_ok());
        let err = registry.read(id, &as_user("x", 10)).unwrap_err();
        assert!(matches!(err, RegistryError::Forbidden(_)));

        let status = registry.access_status(id, &Principal::named("x"), Sequence::new(10)).unwrap();
        assert!(!status.read);
        assert_eq!(status.expiry, Some(Sequence::new(10)));
    }

    #[test]
    fn expired_write_grant_is_rejected_by_default() {
        let (registry, id) = registered();
        let request = GrantRequest::new(Principal::named("w"), Permissions::new(false, true, false), Some(Sequence::new(10)));
        registry.grant_access(id, request, &owner(2)).unwrap();

        assert!(registry.revise(id, typo_fix(), &as_user("w", 5)).is_ok());
        let err = registry.revise(id, typo_fix(), &as_user("w", 10)).unwrap_err();
        assert!(matches!(err, RegistryError::Unauthorized(_)));
    }

    #[test]
    fn legacy_mode_lets_expired_write_grant_through() {
        let registry = Registry::new(RegistryConfig::with_access(AccessConfig::legacy()));
        let id = registry.register(design_doc(), &owner(1)).unwrap();
        let request = GrantRequest::new(Principal::named("w"), Permissions::new(false, true, false), Some(Sequence::new(10)));
        registry.grant_access(id, request, &owner(2)).unwrap();

        assert_eq!(
            registry.revise(id, typo_fix(), &as_user("w", 50)).unwrap(),
            VersionNumber::new(2)
        );
    }

    #[test]
    fn revoke_removes_access() {
        let (registry, id) = registered();
        grant_read(&registry, id, "x", 2);
        assert!(registry.revoke_access(id, &Principal::named("x"), &owner(3)).unwrap());
        assert!(!registry.revoke_access(id, &Principal::named("x"), &owner(4)).unwrap());
        assert!(matches!(registry.read(id, &as_user("x", 5)), Err(RegistryError::Forbidden(_))));

        let err = registry.revoke_access(id, &Principal::named("owner"), &owner(6)).unwrap_err();
        assert!(matches!(err, RegistryError::Validation(_)));
    }

    #[test]
    fn transfer_installs_full_grant_and_keeps_previous_owner_grant() {
        let (registry, id) = registered();
        let heir = Principal::named("heir");
        registry.transfer_ownership(id, &heir, &owner(2)).unwrap();

        assert_eq!(registry.owner(id).unwrap(), heir);
        let status = registry.access_status(id, &heir, Sequence::new(3)).unwrap();
        assert!(status.read && status.write && status.admin && status.is_owner);
        assert_eq!(status.expiry, None);

        // The previous owner keeps a full grant as an ordinary user.
        let previous = registry.access_status(id, &Principal::named("owner"), Sequence::new(3)).unwrap();
        assert!(!previous.is_owner);
        assert!(previous.write);
        assert!(registry.revise(id, typo_fix(), &owner(4)).is_ok());
        assert!(matches!(registry.retire(id, &owner(5)), Err(RegistryError::Unauthorized(_))));
    }

    #[test]
    fn transfer_can_revoke_previous_owner() {
        let config = RegistryConfig::with_access(AccessConfig {
            revoke_previous_owner_on_transfer: true,
            ..Default::default()
        });
        let registry = Registry::new(config);
        let id = registry.register(design_doc(), &owner(1)).unwrap();
        registry.transfer_ownership(id, &Principal::named("heir"), &owner(2)).unwrap();

        assert!(matches!(registry.read(id, &owner(3)), Err(RegistryError::Forbidden(_))));
    }

    #[test]
    fn transfer_requires_owner() {
        let (registry, id) = registered();
        grant_read(&registry, id, "x", 2);
        let err = registry
            .transfer_ownership(id, &Principal::named("x"), &as_user("x", 3))
            .unwrap_err();
        assert!(matches!(err, RegistryError::Unauthorized(_)));
    }

    #[test]
    fn metadata_update_does_not_bump_version() {
        let (registry, id) = registered();
        let update = MetadataUpdate {
            name: "design-v2.pdf".into(),
            size: 4096,
            description: "renamed".into(),
            tags: vec!["final".into(), "docs".into()],
        };
        registry.update_metadata(id, update, &owner(2)).unwrap();

        let view = registry.read(id, &owner(3)).unwrap();
        assert_eq!(view.asset.name, "design-v2.pdf");
        assert_eq!(view.asset.tags.len(), 2);
        assert_eq!(view.asset.total_versions, 1);
        assert_eq!(view.asset.last_modified, Sequence::new(2));
    }

    #[test]
    fn retire_is_soft() {
        let (registry, id) = registered();
        registry.retire(id, &owner(2)).unwrap();

        let view = registry.read(id, &owner(3)).unwrap();
        assert_eq!(view.asset.status, AssetStatus::Deleted);
        assert_eq!(view.asset.status.to_string(), "deleted");

        assert!(matches!(registry.retire(id, &owner(4)), Err(RegistryError::Validation(_))));
        assert!(matches!(registry.revise(id, typo_fix(), &owner(4)), Err(RegistryError::Validation(_))));
        assert!(matches!(registry.rate(id, 3, &owner(4)), Err(RegistryError::Validation(_))));

        let stats = registry.system_statistics().unwrap();
        assert_eq!((stats.active_assets, stats.retired_assets), (0, 1));
    }

    #[test]
    fn retire_requires_owner() {
        let (registry, id) = registered();
        let request = GrantRequest::new(Principal::named("x"), Permissions::FULL, None);
        registry.grant_access(id, request, &owner(2)).unwrap();
        assert!(matches!(registry.retire(id, &as_user("x", 3)), Err(RegistryError::Unauthorized(_))));
    }

    #[test]
    fn rating_five_then_three() {
        let (registry, id) = registered();
        let first = registry.rate(id, 5, &owner(2)).unwrap();
        assert_eq!((first.average_rating, first.rating_count), (5, 1));
        let second = registry.rate(id, 3, &owner(3)).unwrap();
        assert_eq!((second.average_rating, second.rating_count), (4, 2));
        assert_eq!(registry.analytics(id).unwrap().average_rating, 4);
    }

    #[test]
    fn rating_bounds_and_access() {
        let (registry, id) = registered();
        assert!(matches!(registry.rate(id, 0, &owner(2)), Err(RegistryError::Validation(_))));
        assert!(matches!(registry.rate(id, 6, &owner(2)), Err(RegistryError::Validation(_))));
        assert!(matches!(registry.rate(id, 3, &as_user("x", 2)), Err(RegistryError::Forbidden(_))));

        grant_read(&registry, id, "x", 3);
        assert!(registry.rate(id, 3, &as_user("x", 4)).is_ok());
    }

    #[test]
    fn downloads_are_counted_but_not_audited() {
        let (registry, id) = registered();
        let before = registry.audit_trail(None).unwrap().len();
        let analytics = registry.record_download(id, &owner(2)).unwrap();
        assert_eq!(analytics.downloads, 1);
        assert_eq!(registry.audit_trail(None).unwrap().len(), before);
    }

    #[test]
    fn sessions_and_subscriptions() {
        let (registry, id) = registered();
        let request = SessionRequest {
            title: "review".into(),
            starts_at: Sequence::new(10),
            ends_at: Sequence::new(20),
        };
        let session = registry.create_collaboration_session(id, request.clone(), &owner(2)).unwrap();
        assert_eq!(session, SessionId::new(1));
        assert_eq!(registry.analytics(id).unwrap().collaborations, 1);
        assert_eq!(registry.sessions(id).unwrap().len(), 1);

        let err = registry
            .create_collaboration_session(id, request, &as_user("x", 3))
            .unwrap_err();
        assert!(matches!(err, RegistryError::Unauthorized(_)));

        grant_read(&registry, id, "x", 4);
        assert!(registry.subscribe(id, &as_user("x", 5)).unwrap());
        assert!(!registry.subscribe(id, &as_user("x", 6)).unwrap());
        assert_eq!(registry.subscribers(id).unwrap(), vec![Principal::named("x")]);

        let actions: Vec<String> = registry
            .audit_trail(Some(id))
            .unwrap()
            .into_iter()
            .map(|e| e.action)
            .collect();
        assert_eq!(actions, vec!["REGISTER", "COLLAB_SESSION", "GRANT_ACCESS", "SUBSCRIBE"]);
    }

    #[test]
    fn audit_ids_are_global_and_ordered() {
        let registry = Registry::default();
        let a = registry.register(design_doc(), &owner(1)).unwrap();
        let b = registry.register(design_doc(), &owner(2)).unwrap();
        registry.revise(a, typo_fix(), &owner(3)).unwrap();
        registry.rate(b, 4, &owner(4)).unwrap();

        let trail = registry.audit_trail(None).unwrap();
        let ids: Vec<u64> = trail.iter().map(|e| e.id.get()).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
        assert_eq!(trail[2].asset, a);
        assert_eq!(trail[2].action, "REVISE");
        assert_eq!(registry.verify_audit_chain().unwrap(), 4);

        let summary = registry.audit_summary(Some(a)).unwrap();
        assert_eq!(summary.total, 2);
    }

    #[test]
    fn sequence_may_not_regress() {
        let (registry, id) = registered();
        registry.revise(id, typo_fix(), &owner(10)).unwrap();
        let err = registry.revise(id, typo_fix(), &owner(9)).unwrap_err();
        assert!(matches!(err, RegistryError::Validation(_)));
        assert!(registry.revise(id, typo_fix(), &owner(10)).is_ok());
        assert_eq!(registry.system_statistics().unwrap().last_sequence, Sequence::new(10));
    }

    #[test]
    fn contributions_are_counted() {
        let (registry, id) = registered();
        registry.revise(id, typo_fix(), &owner(2)).unwrap();
        registry.revise(id, typo_fix(), &owner(3)).unwrap();
        let profile = registry.contributions(&Principal::named("owner")).unwrap();
        assert_eq!(profile.assets_registered, 1);
        assert_eq!(profile.revisions, 2);
    }

    #[test]
    fn restore_replaces_state() {
        let (source, id) = registered();
        source.revise(id, typo_fix(), &owner(2)).unwrap();
        let snapshot = source.snapshot().unwrap();

        let target = Registry::default();
        target.register(design_doc(), &as_user("someone", 1)).unwrap();
        target.register(design_doc(), &as_user("someone", 2)).unwrap();
        target.restore(snapshot).unwrap();

        assert_eq!(target.asset_ids().unwrap(), vec![id]);
        assert_eq!(target.owner(id).unwrap(), Principal::named("owner"));
        assert_eq!(target.version_count(id).unwrap(), 2);
        assert_eq!(target.verify_audit_chain().unwrap(), 2);
    }

    #[test]
    fn restore_rejects_bad_snapshot_and_keeps_state() {
        let (registry, id) = registered();
        let mut snapshot = registry.snapshot().unwrap();
        snapshot.format = 99;
        assert!(matches!(registry.restore(snapshot), Err(RegistryError::Validation(_))));
        assert_eq!(registry.asset_ids().unwrap(), vec![id]);
    }

    #[test]
    fn history_validates_clean() {
        let (registry, id) = registered();
        registry.revise(id, typo_fix(), &owner(2)).unwrap();
        let report = registry.validate_history(id).unwrap();
        assert!(report.is_valid());
        assert_eq!(report.record_count, 2);
        assert!(!report.violations.iter().any(|v| v.kind == ViolationKind::Gap));
    }

    #[test]
    fn version_records_are_stable_on_reread() {
        let (registry, id) = registered();
        registry.revise(id, typo_fix(), &owner(2)).unwrap();
        let first = registry.version(id, VersionNumber::new(2), &owner(3)).unwrap();
        registry
            .update_metadata(
                id,
                MetadataUpdate {
                    name: "other".into(),
                    size: 1,
                    description: "other".into(),
                    tags: vec!["t".into()],
                },
                &owner(4),
            )
            .unwrap();
        let second = registry.version(id, VersionNumber::new(2), &owner(5)).unwrap();
        assert_eq!(first, second);
        assert!(matches!(
            registry.version(id, VersionNumber::new(3), &owner(5)),
            Err(RegistryError::NotFound(_))
        ));
    }

    #[test]
    fn audit_range_spans_assets() {
        let (registry, id) = registered();
        let other = registry.register(design_doc(), &as_user("someone", 2)).unwrap();
        registry.revise(id, typo_fix(), &owner(3)).unwrap();
        registry.rate(other, 4, &as_user("someone", 4)).unwrap();

        let entries = registry.audit_range(AuditId::new(2), AuditId::new(3)).unwrap();
        let assets: Vec<AssetId> = entries.iter().map(|e| e.asset).collect();
        assert_eq!(assets, vec![other, id]);
        assert_eq!(entries[1].action, action::REVISE);
        assert!(registry.audit_range(AuditId::new(3), AuditId::new(2)).unwrap().is_empty());
        assert_eq!(registry.audit_range(AuditId::new(1), AuditId::new(u64::MAX)).unwrap().len(), 4);
    }

    #[test]
    fn unsequenced_calls_are_stamped_in_lock_order() {
        let registry = Registry::default();
        let alice = CallContext::unsequenced(Principal::named("alice"));
        let bob = CallContext::unsequenced(Principal::named("bob"));

        let second = registry.register(design_doc(), &bob).unwrap();
        let first = registry.register(design_doc(), &alice).unwrap();
        assert_eq!((second, first), (AssetId::new(1), AssetId::new(2)));

        let sequences: Vec<u64> = registry
            .audit_trail(None)
            .unwrap()
            .iter()
            .map(|e| e.sequence.get())
            .collect();
        assert_eq!(sequences, vec![1, 2]);
    }

    #[test]
    fn unsequenced_call_follows_explicit_sequence() {
        let (registry, id) = registered();
        registry.revise(id, typo_fix(), &owner(40)).unwrap();
        assert_eq!(registry.next_sequence().unwrap(), Sequence::new(41));

        registry
            .rate(id, 5, &CallContext::unsequenced(Principal::named("owner")))
            .unwrap();
        let last = registry.audit_trail(Some(id)).unwrap().pop().unwrap();
        assert_eq!(last.sequence, Sequence::new(41));
        assert!(registry.revise(id, typo_fix(), &owner(40)).is_err());
    }

    #[test]
    fn concurrent_registrations_get_distinct_contiguous_ids() {
        use std::sync::Arc;
        use std::thread;

        let registry = Arc::new(Registry::default());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    let ctx = CallContext::unsequenced(Principal::named(&format!("writer-{t}")));
                    (0..50)
                        .map(|_| registry.register(design_doc(), &ctx).unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut ids: Vec<u64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .map(|id| id.get())
            .collect();
        ids.sort_unstable();
        assert_eq!(ids, (1..=400).collect::<Vec<_>>());

        let stats = registry.system_statistics().unwrap();
        assert_eq!(stats.total_assets, 400);
        assert_eq!(stats.last_sequence, Sequence::new(400));
        assert_eq!(registry.verify_audit_chain().unwrap(), 400);
    }

    proptest! {
        #[test]
        fn versions_stay_contiguous(revisions in 0usize..12) {
            let (registry, id) = registered();
            for i in 0..revisions {
                registry.revise(id, typo_fix(), &owner(2 + i as u64)).unwrap();
            }
            let history = registry.history(id, &owner(100)).unwrap();
            let numbers: Vec<u64> = history.iter().map(|r| r.version.get()).collect();
            prop_assert_eq!(numbers, (1..=revisions as u64 + 1).collect::<Vec<_>>());
            prop_assert_eq!(registry.version_count(id).unwrap(), revisions as u64 + 1);
        }

        #[test]
        fn strangers_never_read(names in proptest::collection::vec("[a-z]{3,8}", 1..8)) {
            let (registry, id) = registered();
            for name in names.iter().filter(|n| n.as_str() != "owner") {
                let result = registry.read(id, &as_user(name, 2));
                prop_assert!(matches!(result, Err(RegistryError::Forbidden(_))));
            }
        }
    }
}
