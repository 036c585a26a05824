use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Longest handle accepted by [`Principal::parse`].
pub const MAX_HANDLE_CHARS: usize = 64;

/// Authenticated caller identity.
///
/// A `Principal` is the BLAKE3 hash of a host-assigned handle. The hosting
/// environment authenticates callers; the registry only compares principals
/// for equality.
///
/// Serialized as a 64-character hex string.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Principal {
    hash: [u8; 32],
}

impl Principal {
    /// Principal for a host-assigned handle (e.g. "alice", an address string).
    pub fn named(handle: &str) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"areg-principal-v1:handle:");
        hasher.update(handle.as_bytes());
        Self {
            hash: *hasher.finalize().as_bytes(),
        }
    }

    /// The raw 32-byte hash.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.hash
    }

    /// Full hex-encoded string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.hash)
    }

    /// Short identifier (first 8 hex characters).
    pub fn short_id(&self) -> String {
        format!("pr:{}", hex::encode(&self.hash[..4]))
    }

    /// Parse from a hex string (64 hex characters, optional `pr:` prefix).
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let s = s.strip_prefix("pr:").unwrap_or(s);
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        if bytes.len() != 32 {
            return Err(TypeError::InvalidLength {
                expected: 32,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self { hash: arr })
    }

    /// Parse a caller-supplied identity.
    ///
    /// A full 64-character hex string (optionally `pr:`-prefixed) is taken as
    /// an already-derived principal. Anything else is treated as a handle.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(TypeError::InvalidPrincipal("identity must not be empty".into()));
        }
        if let Some(rest) = trimmed.strip_prefix("pr:") {
            return Self::from_hex(rest);
        }
        if trimmed.len() == 64 && trimmed.chars().all(|c| c.is_ascii_hexdigit()) {
            return Self::from_hex(trimmed);
        }
        if trimmed.chars().count() > MAX_HANDLE_CHARS {
            return Err(TypeError::InvalidPrincipal(format!(
                "handle exceeds {MAX_HANDLE_CHARS} characters"
            )));
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(TypeError::InvalidPrincipal(
                "handle must not contain whitespace".into(),
            ));
        }
        Ok(Self::named(trimmed))
    }
}

impl FromStr for Principal {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Principal {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Principal> for String {
    fn from(value: Principal) -> Self {
        value.to_hex()
    }
}

impl fmt::Debug for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Principal({})", self.short_id())
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short_id())
    }
}
