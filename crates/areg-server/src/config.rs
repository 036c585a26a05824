use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use areg_registry::RegistryConfig;

use crate::error::{ServerError, ServerResult};

pub const DEFAULT_CALLER_HEADER: &str = "x-areg-caller";
pub const DEFAULT_SEQUENCE_HEADER: &str = "x-areg-sequence";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Where to load state from at startup and persist it after each change.
    pub snapshot_path: Option<PathBuf>,
    /// Header carrying the pre-authenticated caller identity.
    pub caller_header: String,
    /// Header carrying the host-supplied sequence. Requests without it run
    /// at the sequence after the highest one the registry has seen.
    pub sequence_header: String,
    /// Seconds between snapshot writes for view and download counters.
    /// Zero writes a snapshot on every read.
    pub counter_flush_secs: u64,
    /// Browser origins allowed to call the API. Empty disables CORS.
    pub cors_origins: Vec<String>,
    pub registry: RegistryConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 8640)),
            snapshot_path: None,
            caller_header: DEFAULT_CALLER_HEADER.into(),
            sequence_header: DEFAULT_SEQUENCE_HEADER.into(),
            counter_flush_secs: 5,
            cors_origins: Vec::new(),
            registry: RegistryConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_toml_str(text: &str) -> ServerResult<Self> {
        toml::from_str(text).map_err(|e| ServerError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> ServerResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}
