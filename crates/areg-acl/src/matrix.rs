//! The per-(asset, user) grant table.
//!
//! [`AccessMatrix`] is a plain data structure: the registry owns it inside
//! its serialized state and passes the asset owner in on every call, since
//! ownership lives on the asset record rather than in the matrix.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use areg_types::{AssetId, Principal, Sequence};

use crate::capability::{evaluate, AccessStatus, CapabilitySet};
use crate::config::AccessConfig;
use crate::error::{AclError, AclResult};
use crate::grant::{AccessGrant, GrantRequest};

/// Grants keyed by asset, then by user.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessMatrix {
    grants: BTreeMap<AssetId, BTreeMap<Principal, AccessGrant>>,
}

impl AccessMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    /// The stored grant, expired or not.
    pub fn stored_grant(&self, asset: AssetId, user: &Principal) -> Option<&AccessGrant> {
        self.grants.get(&asset).and_then(|per_user| per_user.get(user))
    }

    /// Capability set of `actor` over `asset`.
    pub fn capabilities(
        &self,
        asset: AssetId,
        owner: &Principal,
        actor: &Principal,
        now: Sequence,
        config: &AccessConfig,
    ) -> CapabilitySet {
        evaluate(owner, self.stored_grant(asset, actor), actor, now, config)
    }

    /// Write check. An unknown asset (no owner) never grants access.
    pub fn has_write_access(
        &self,
        asset: AssetId,
        owner: Option<&Principal>,
        actor: &Principal,
        now: Sequence,
        config: &AccessConfig,
    ) -> bool {
        owner.is_some_and(|owner| self.capabilities(asset, owner, actor, now, config).can_write())
    }

    /// View check: owner, or a live read grant.
    pub fn can_view(&self, asset: AssetId, owner: Option<&Principal>, actor: &Principal, now: Sequence) -> bool {
        owner.is_some_and(|owner| {
            self.capabilities(asset, owner, actor, now, &AccessConfig::default())
                .can_view()
        })
    }

    /// Access summary for `actor`.
    pub fn status(&self, asset: AssetId, owner: &Principal, actor: &Principal, now: Sequence) -> AccessStatus {
        AccessStatus::from_grant(owner, self.stored_grant(asset, actor), actor, now)
    }

    /// Only the owner or the system administrator may change grants.
    pub fn authorize_grant(
        asset: AssetId,
        owner: &Principal,
        actor: &Principal,
        config: &AccessConfig,
    ) -> AclResult<()> {
        if actor == owner || config.is_system_admin(actor) {
            Ok(())
        } else {
            Err(AclError::NotGrantAuthority {
                asset,
                actor: actor.clone(),
            })
        }
    }

    /// Check a grant request without applying it.
    pub fn check_grant(
        asset: AssetId,
        owner: &Principal,
        request: &GrantRequest,
        actor: &Principal,
        now: Sequence,
        config: &AccessConfig,
    ) -> AclResult<()> {
        Self::authorize_grant(asset, owner, actor, config)?;
        if &request.target == owner {
            return Err(AclError::OwnerGrantImmutable { asset });
        }
        if let Some(expiry) = request.expires_at {
            if !expiry.is_after(&now) {
                return Err(AclError::ExpiryNotInFuture { expiry, now });
            }
        }
        Ok(())
    }

    /// Create or replace a grant. Returns the grant it replaced, if any.
    pub fn grant(
        &mut self,
        asset: AssetId,
        owner: &Principal,
        request: &GrantRequest,
        actor: &Principal,
        now: Sequence,
        config: &AccessConfig,
    ) -> AclResult<Option<AccessGrant>> {
        Self::check_grant(asset, owner, request, actor, now, config)?;
        let grant = AccessGrant::new(request.permissions, actor.clone(), now, request.expires_at);
        debug!(%asset, target = %request.target, ?grant.permissions, "grant upserted");
        Ok(self
            .grants
            .entry(asset)
            .or_default()
            .insert(request.target.clone(), grant))
    }

    /// Install the full, non-expiring owner grant.
    pub fn install_owner(&mut self, asset: AssetId, owner: &Principal, granter: &Principal, now: Sequence) {
        self.grants
            .entry(asset)
            .or_default()
            .insert(owner.clone(), AccessGrant::full(granter.clone(), now));
    }

    /// Check a revocation without applying it.
    pub fn check_revoke(
        asset: AssetId,
        owner: &Principal,
        target: &Principal,
        actor: &Principal,
        config: &AccessConfig,
    ) -> AclResult<()> {
        Self::authorize_grant(asset, owner, actor, config)?;
        if target == owner {
            return Err(AclError::OwnerGrantImmutable { asset });
        }
        Ok(())
    }

    /// Remove a user's grant. Returns the removed grant, if any.
    pub fn revoke(
        &mut self,
        asset: AssetId,
        owner: &Principal,
        target: &Principal,
        actor: &Principal,
        config: &AccessConfig,
    ) -> AclResult<Option<AccessGrant>> {
        Self::check_revoke(asset, owner, target, actor, config)?;
        Ok(self
            .grants
            .get_mut(&asset)
            .and_then(|per_user| per_user.remove(target)))
    }

    /// Only the current owner may transfer.
    pub fn check_transfer(asset: AssetId, owner: &Principal, actor: &Principal) -> AclResult<()> {
        if actor == owner {
            Ok(())
        } else {
            Err(AclError::NotOwner {
                asset,
                actor: actor.clone(),
            })
        }
    }

    /// Move the owner grant to `new_owner`. Authorization is the caller's
    /// job (see [`AccessMatrix::check_transfer`]).
    ///
    /// The previous owner's grant stays in place as an ordinary grant unless
    /// the configuration asks for it to be revoked.
    pub fn transfer(
        &mut self,
        asset: AssetId,
        previous_owner: &Principal,
        new_owner: &Principal,
        now: Sequence,
        config: &AccessConfig,
    ) {
        self.install_owner(asset, new_owner, previous_owner, now);
        if config.revoke_previous_owner_on_transfer && previous_owner != new_owner {
            if let Some(per_user) = self.grants.get_mut(&asset) {
                per_user.remove(previous_owner);
            }
        }
        debug!(%asset, from = %previous_owner, to = %new_owner, "owner grant moved");
    }

    /// All stored grants for an asset, ordered by user.
    pub fn grants_for(&self, asset: AssetId) -> Vec<(Principal, AccessGrant)> {
        self.grants
            .get(&asset)
            .map(|per_user| {
                per_user
                    .iter()
                    .map(|(user, grant)| (user.clone(), grant.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Total number of stored grants across all assets.
    pub fn grant_count(&self) -> usize {
        self.grants.values().map(BTreeMap::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grant::Permissions;

    const ASSET: AssetId = AssetId::new(1);

    fn owner() -> Principal {
        Principal::named("owner")
    }

    fn user(name: &str) -> Principal {
        Principal::named(name)
    }

    fn seeded() -> AccessMatrix {
        let mut m = AccessMatrix::new();
        m.install_owner(ASSET, &owner(), &owner(), Sequence::new(1));
        m
    }

    #[test]
    fn owner_grant_is_full_and_non_expiring() {
        let m = seeded();
        let grant = m.stored_grant(ASSET, &owner()).unwrap();
        assert!(grant.is_full());
        assert!(m.has_write_access(ASSET, Some(&owner()), &owner(), Sequence::new(99), &AccessConfig::default()));
    }

    #[test]
    fn unknown_asset_denies_write() {
        let m = seeded();
        assert!(!m.has_write_access(AssetId::new(2), None, &owner(), Sequence::new(1), &AccessConfig::default()));
        assert!(!m.can_view(AssetId::new(2), None, &owner(), Sequence::new(1)));
    }

    #[test]
    fn grant_by_non_owner_is_rejected() {
        let mut m = seeded();
        let request = GrantRequest::new(user("x"), Permissions::READ_ONLY, None);
        let err = m
            .grant(ASSET, &owner(), &request, &user("mallory"), Sequence::new(2), &AccessConfig::default())
            .unwrap_err();
        assert!(matches!(err, AclError::NotGrantAuthority { .. }));
        assert!(m.stored_grant(ASSET, &user("x")).is_none());
    }

    #[test]
    fn system_admin_may_grant() {
        let mut m = seeded();
        let config = AccessConfig::default().with_admin(user("root"));
        let request = GrantRequest::new(user("x"), Permissions::READ_ONLY, None);
        m.grant(ASSET, &owner(), &request, &user("root"), Sequence::new(2), &config)
            .unwrap();
        let grant = m.stored_grant(ASSET, &user("x")).unwrap();
        assert_eq!(grant.granter, user("root"));
        assert_eq!(grant.granted_at, Sequence::new(2));
    }

    #[test]
    fn grant_upserts_and_returns_previous() {
        let mut m = seeded();
        let config = AccessConfig::default();
        let first = GrantRequest::new(user("x"), Permissions::READ_ONLY, None);
        assert!(m.grant(ASSET, &owner(), &first, &owner(), Sequence::new(2), &config).unwrap().is_none());
        let second = GrantRequest::new(user("x"), Permissions::FULL, None);
        let replaced = m
            .grant(ASSET, &owner(), &second, &owner(), Sequence::new(3), &config)
            .unwrap()
            .expect("previous grant");
        assert_eq!(replaced.permissions, Permissions::READ_ONLY);
        assert_eq!(m.stored_grant(ASSET, &user("x")).unwrap().permissions, Permissions::FULL);
        assert_eq!(m.grant_count(), 2);
    }

    #[test]
    fn expiry_must_be_in_the_future() {
        let mut m = seeded();
        let request = GrantRequest::new(user("x"), Permissions::READ_ONLY, Some(Sequence::new(5)));
        let err = m
            .grant(ASSET, &owner(), &request, &owner(), Sequence::new(5), &AccessConfig::default())
            .unwrap_err();
        assert_eq!(
            err,
            AclError::ExpiryNotInFuture { expiry: Sequence::new(5), now: Sequence::new(5) }
        );
    }

    #[test]
    fn expired_grant_treated_as_absent() {
        let mut m = seeded();
        let config = AccessConfig::default();
        let request = GrantRequest::new(user("x"), Permissions::FULL, Some(Sequence::new(10)));
        m.grant(ASSET, &owner(), &request, &owner(), Sequence::new(2), &config).unwrap();

        assert!(m.can_view(ASSET, Some(&owner()), &user("x"), Sequence::new(9)));
        assert!(!m.can_view(ASSET, Some(&owner()), &user("x"), Sequence::new(10)));
        let stored = m.stored_grant(ASSET, &user("x")).expect("not eagerly purged");
        assert!(stored.is_expired_at(Sequence::new(10)));
        assert!(!m.has_write_access(ASSET, Some(&owner()), &user("x"), Sequence::new(10), &config));
    }

    #[test]
    fn legacy_mode_keeps_expired_write_grants_effective() {
        let mut m = seeded();
        let config = AccessConfig::legacy();
        let request = GrantRequest::new(user("x"), Permissions::new(false, true, false), Some(Sequence::new(10)));
        m.grant(ASSET, &owner(), &request, &owner(), Sequence::new(2), &config).unwrap();
        assert!(m.has_write_access(ASSET, Some(&owner()), &user("x"), Sequence::new(50), &config));
    }

    #[test]
    fn owner_grant_cannot_be_replaced() {
        let mut m = seeded();
        let request = GrantRequest::new(owner(), Permissions::READ_ONLY, None);
        let err = m
            .grant(ASSET, &owner(), &request, &owner(), Sequence::new(2), &AccessConfig::default())
            .unwrap_err();
        assert_eq!(err, AclError::OwnerGrantImmutable { asset: ASSET });
        assert!(m.stored_grant(ASSET, &owner()).unwrap().is_full());
    }

    #[test]
    fn revoke_removes_grant_but_not_owner() {
        let mut m = seeded();
        let config = AccessConfig::default();
        let request = GrantRequest::new(user("x"), Permissions::READ_ONLY, None);
        m.grant(ASSET, &owner(), &request, &owner(), Sequence::new(2), &config).unwrap();

        let removed = m.revoke(ASSET, &owner(), &user("x"), &owner(), &config).unwrap();
        assert!(removed.is_some());
        assert!(m.stored_grant(ASSET, &user("x")).is_none());

        let err = m.revoke(ASSET, &owner(), &owner(), &owner(), &config).unwrap_err();
        assert_eq!(err, AclError::OwnerGrantImmutable { asset: ASSET });
    }

    #[test]
    fn transfer_keeps_previous_owner_grant_by_default() {
        let mut m = seeded();
        let config = AccessConfig::default();
        m.transfer(ASSET, &owner(), &user("heir"), Sequence::new(3), &config);

        assert!(m.stored_grant(ASSET, &user("heir")).unwrap().is_full());
        assert!(
            m.stored_grant(ASSET, &owner()).is_some(),
            "previous owner's grant is intentionally retained"
        );
    }

    #[test]
    fn transfer_can_revoke_previous_owner() {
        let mut m = seeded();
        let config = AccessConfig {
            revoke_previous_owner_on_transfer: true,
            ..Default::default()
        };
        m.transfer(ASSET, &owner(), &user("heir"), Sequence::new(3), &config);
        assert!(m.stored_grant(ASSET, &owner()).is_none());
        assert_eq!(m.grants_for(ASSET).len(), 1);
    }

    #[test]
    fn check_transfer_requires_owner() {
        let err = AccessMatrix::check_transfer(ASSET, &owner(), &user("x")).unwrap_err();
        assert!(matches!(err, AclError::NotOwner { .. }));
    }

    #[test]
    fn serde_roundtrip_preserves_grants() {
        let mut m = seeded();
        let request = GrantRequest::new(user("x"), Permissions::READ_ONLY, Some(Sequence::new(40)));
        m.grant(ASSET, &owner(), &request, &owner(), Sequence::new(2), &AccessConfig::default())
            .unwrap();
        let json = serde_json::to_string(&m).unwrap();
        let parsed: AccessMatrix = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, m);
    }
}
