use serde::{Deserialize, Serialize};

use areg_types::Principal;

/// Configuration for access evaluation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    /// Identity allowed to administer grants on every asset.
    pub system_admin: Option<Principal>,
    /// When `true`, an expired grant no longer authorizes writes.
    ///
    /// Read paths always ignore expired grants. Setting this to `false`
    /// reproduces the legacy behavior where the write check looked only at
    /// the stored `write` flag.
    pub enforce_expiry_on_write: bool,
    /// When `true`, transferring ownership removes the previous owner's
    /// grant instead of leaving it in place as an ordinary grant.
    pub revoke_previous_owner_on_transfer: bool,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            system_admin: None,
            enforce_expiry_on_write: true,
            revoke_previous_owner_on_transfer: false,
        }
    }
}

impl AccessConfig {
    /// Legacy-compatible configuration: expired write grants still authorize
    /// writes.
    pub fn legacy() -> Self {
        Self {
            enforce_expiry_on_write: false,
            ..Default::default()
        }
    }

    /// Set the system administrator.
    pub fn with_admin(mut self, admin: Principal) -> Self {
        self.system_admin = Some(admin);
        self
    }

    /// Returns `true` if `actor` is the configured system administrator.
    pub fn is_system_admin(&self, actor: &Principal) -> bool {
        self.system_admin.as_ref() == Some(actor)
    }
}
