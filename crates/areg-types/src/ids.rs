use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! monotonic_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Wrap a raw value.
            pub const fn new(value: u64) -> Self {
                Self(value)
            }

            /// The raw value.
            pub const fn get(self) -> u64 {
                self.0
            }

            /// The identifier immediately after this one.
            pub const fn next(self) -> Self {
                Self(self.0 + 1)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

monotonic_id!(
    /// Identifier of a registered asset. Issued from 1 upward, never reused.
    AssetId,
    "asset#"
);

monotonic_id!(
    /// Globally unique audit entry identifier, independent of asset ids.
    AuditId,
    "audit#"
);

monotonic_id!(
    /// Collaboration session identifier (out-of-core passthrough).
    SessionId,
    "session#"
);

monotonic_id!(
    /// Version number within a single asset's history (1-based, contiguous).
    VersionNumber,
    "v"
);

impl VersionNumber {
    /// The version created at registration.
    pub const INITIAL: Self = Self(1);
}
