use serde::{Deserialize, Serialize};

use areg_acl::AccessConfig;

/// Registry configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub access: AccessConfig,
}

impl RegistryConfig {
    pub fn with_access(access: AccessConfig) -> Self {
        Self { access }
    }
}
