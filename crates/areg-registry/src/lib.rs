//! Permissioned asset registry.
//!
//! [`Registry`] is the single entry point. It composes the access matrix
//! (`areg-acl`), the version ledger (`areg-ledger`), and the audit trail
//! (`areg-audit`) over one locked [`RegistryState`], and exposes every
//! operation as a method taking a [`CallContext`].
//!
//! ```rust
//! use areg_registry::{AssetDraft, CallContext, Registry};
//!
//! let registry = Registry::default();
//! let owner = CallContext::named("alice", 1);
//! let id = registry
//!     .register(
//!         AssetDraft {
//!             name: "design.pdf".into(),
//!             size: 2048,
//!             description: "design doc".into(),
//!             tags: vec!["draft".into()],
//!             encrypted: false,
//!             key_hash: String::new(),
//!             content_hash: "a".repeat(64),
//!             metadata: "{}".into(),
//!         },
//!         &owner,
//!     )
//!     .unwrap();
//! assert_eq!(registry.version_count(id).unwrap(), 1);
//! ```

pub mod analytics;
pub mod asset;
pub mod collab;
pub mod config;
pub mod context;
pub mod error;
pub mod profile;
pub mod registry;
pub mod snapshot;
pub mod state;
pub mod stats;
pub mod validation;

pub use analytics::AnalyticsRecord;
pub use asset::{Asset, AssetStatus, AssetView};
pub use collab::{CollaborationSession, SessionRequest};
pub use config::RegistryConfig;
pub use context::CallContext;
pub use error::{RegistryError, RegistryResult};
pub use profile::ContributionProfile;
pub use registry::Registry;
pub use snapshot::{RegistrySnapshot, SNAPSHOT_FORMAT};
pub use state::RegistryState;
pub use stats::SystemStatistics;
pub use validation::{AssetDraft, MetadataUpdate, RevisionDraft};

// Re-export the types callers need to build requests and read results.
pub use areg_acl::{AccessConfig, AccessGrant, AccessStatus, GrantRequest, Permissions};
pub use areg_audit::{AuditEntry, AuditSummary};
pub use areg_ledger::{HistoryReport, VersionRecord};
pub use areg_types::{AssetId, AuditId, ContentDigest, Principal, Sequence, SessionId, VersionNumber};
