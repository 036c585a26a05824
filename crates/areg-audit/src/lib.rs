//! Append-only audit trail for the asset registry.
//!
//! Every state-changing registry operation ends by appending one
//! [`AuditEntry`]. Entries are ordered globally by [`AuditId`], never
//! mutated, and linked by BLAKE3 hashes so that a rewritten or dropped entry
//! is detectable with [`AuditTrail::verify`].
//!
//! Appending is best-effort with respect to content: an empty or over-long
//! action tag or detail is replaced with a sentinel rather than rejected.
//!
//! [`AuditId`]: areg_types::AuditId

pub mod action;
pub mod entry;
pub mod error;
pub mod projection;
pub mod trail;

pub use action::{sanitize_action, sanitize_detail, UNKNOWN_ACTION, NO_DETAIL};
pub use entry::AuditEntry;
pub use error::AuditError;
pub use projection::AuditSummary;
pub use trail::AuditTrail;
