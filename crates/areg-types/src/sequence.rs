use std::fmt;

use serde::{Deserialize, Serialize};

/// Host-supplied logical clock value (e.g. block height).
///
/// The hosting environment guarantees monotonicity across calls; the registry
/// uses sequences for ordering, `last_modified` bookkeeping, and grant expiry.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sequence(u64);

impl Sequence {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// The genesis sequence.
    pub const fn zero() -> Self {
        Self(0)
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    /// The sequence immediately after this one (saturating).
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Returns `true` if this sequence is strictly after `other`.
    pub fn is_after(&self, other: &Self) -> bool {
        self > other
    }

    /// Returns `true` if this sequence is strictly before `other`.
    pub fn is_before(&self, other: &Self) -> bool {
        self < other
    }

    /// Returns `true` once a deadline at `expiry` has been reached.
    ///
    /// Expiry is inclusive: a grant expiring at sequence 10 is already
    /// expired when evaluated at sequence 10.
    pub fn has_reached(&self, expiry: &Self) -> bool {
        self >= expiry
    }
}

impl From<u64> for Sequence {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Debug for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sequence({})", self.0)
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}
