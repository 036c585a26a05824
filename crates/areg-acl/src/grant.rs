//! Access grants: records of delegated capability over one asset.

use serde::{Deserialize, Serialize};

use areg_types::{Principal, Sequence};

/// The capability flags carried by a grant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Permissions {
    pub read: bool,
    pub write: bool,
    pub admin: bool,
}

impl Permissions {
    /// Read, write, and admin.
    pub const FULL: Self = Self {
        read: true,
        write: true,
        admin: true,
    };
    pub const READ_ONLY: Self = Self {
        read: true,
        write: false,
        admin: false,
    };
    pub const NONE: Self = Self {
        read: false,
        write: false,
        admin: false,
    };

    pub const fn new(read: bool, write: bool, admin: bool) -> Self {
        Self { read, write, admin }
    }

    /// Returns `true` if no flag is set.
    pub fn is_empty(&self) -> bool {
        !(self.read || self.write || self.admin)
    }
}

/// A record of access granted over one asset to one user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessGrant {
    pub permissions: Permissions,
    /// Who issued (or last modified) the grant.
    pub granter: Principal,
    /// Sequence at which the grant was issued.
    pub granted_at: Sequence,
    /// Sequence at which the grant stops applying (`None` = never).
    pub expires_at: Option<Sequence>,
}

impl AccessGrant {
    pub fn new(
        permissions: Permissions,
        granter: Principal,
        granted_at: Sequence,
        expires_at: Option<Sequence>,
    ) -> Self {
        Self {
            permissions,
            granter,
            granted_at,
            expires_at,
        }
    }

    /// A full, non-expiring grant (the owner's grant).
    pub fn full(granter: Principal, granted_at: Sequence) -> Self {
        Self::new(Permissions::FULL, granter, granted_at, None)
    }

    /// Check if the grant has expired at `now`.
    pub fn is_expired_at(&self, now: Sequence) -> bool {
        self.expires_at
            .as_ref()
            .is_some_and(|expiry| now.has_reached(expiry))
    }

    /// Returns `true` for a full, non-expiring grant.
    pub fn is_full(&self) -> bool {
        self.permissions == Permissions::FULL && self.expires_at.is_none()
    }
}

/// A request to create or replace one user's grant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantRequest {
    pub target: Principal,
    pub permissions: Permissions,
    pub expires_at: Option<Sequence>,
}

impl GrantRequest {
    pub fn new(target: Principal, permissions: Permissions, expires_at: Option<Sequence>) -> Self {
        Self {
            target,
            permissions,
            expires_at,
        }
    }
}
