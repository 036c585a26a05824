//! Access control matrix for the asset registry.
//!
//! Every asset carries a map of per-user grants (read / write / admin, with
//! optional expiry). Access decisions are never cached: each check runs the
//! pure [`evaluate`] function over the asset owner, the caller's grant, and
//! the current sequence.
//!
//! # Quick Start
//!
//! ```rust
//! use areg_acl::{AccessConfig, AccessMatrix, GrantRequest, Permissions};
//! use areg_types::{AssetId, Principal, Sequence};
//!
//! let config = AccessConfig::default();
//! let mut matrix = AccessMatrix::new();
//! let owner = Principal::named("owner");
//! let reader = Principal::named("reader");
//! let asset = AssetId::new(1);
//! let now = Sequence::new(10);
//!
//! matrix.install_owner(asset, &owner, &owner, now);
//! let request = GrantRequest::new(reader.clone(), Permissions::READ_ONLY, None);
//! matrix.grant(asset, &owner, &request, &owner, now, &config).unwrap();
//! assert!(matrix.status(asset, &owner, &reader, now).can_view);
//! assert!(!matrix.has_write_access(asset, Some(&owner), &reader, now, &config));
//! ```

pub mod capability;
pub mod config;
pub mod error;
pub mod grant;
pub mod matrix;

pub use capability::{evaluate, AccessStatus, CapabilitySet};
pub use config::AccessConfig;
pub use error::{AclError, AclResult};
pub use grant::{AccessGrant, GrantRequest, Permissions};
pub use matrix::AccessMatrix;
