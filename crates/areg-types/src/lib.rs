//! Foundation types for the asset registry (AREG).
//!
//! This crate provides the identity, ordering, and structural types used
//! throughout AREG. Every other AREG crate depends on `areg-types`.
//!
//! # Key Types
//!
//! - [`Principal`]: Caller identity derived from a host-assigned handle
//! - [`AssetId`], [`VersionNumber`], [`AuditId`], [`SessionId`]: Monotonic identifiers
//! - [`IdAllocator`]: The three independent identifier counters
//! - [`Sequence`]: Host-supplied logical clock (e.g. block height)
//! - [`ContentDigest`]: 64-character content or key hash
//! - [`EntryHash`]: 32-byte chain hash for audit entries

pub mod allocator;
pub mod digest;
pub mod error;
pub mod hash;
pub mod ids;
pub mod identity;
pub mod limits;
pub mod sequence;

pub use allocator::IdAllocator;
pub use digest::ContentDigest;
pub use error::TypeError;
pub use hash::EntryHash;
pub use identity::Principal;
pub use ids::{AssetId, AuditId, SessionId, VersionNumber};
pub use sequence::Sequence;
