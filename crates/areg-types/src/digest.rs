use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::limits::DIGEST_CHARS;

/// A 64-character content or key hash supplied by the caller.
///
/// The registry stores no bytes, only the digest the host computed. The
/// alphabet is not constrained; only the character count is.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentDigest(String);

impl ContentDigest {
    /// Parse a digest of exactly [`DIGEST_CHARS`] characters.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        let actual = s.chars().count();
        if actual != DIGEST_CHARS {
            return Err(TypeError::InvalidDigest {
                expected: DIGEST_CHARS,
                actual,
            });
        }
        Ok(Self(s.to_string()))
    }

    /// Parse an optional digest: empty input means "none".
    pub fn parse_optional(s: &str) -> Result<Option<Self>, TypeError> {
        if s.is_empty() {
            Ok(None)
        } else {
            Self::parse(s).map(Some)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First eight characters, for logs.
    pub fn short(&self) -> &str {
        let end = self.0.char_indices().nth(8).map(|(i, _)| i).unwrap_or(self.0.len());
        &self.0[..end]
    }
}

impl TryFrom<String> for ContentDigest {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ContentDigest> for String {
    fn from(value: ContentDigest) -> Self {
        value.0
    }
}

impl fmt::Debug for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentDigest({})", self.short())
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
