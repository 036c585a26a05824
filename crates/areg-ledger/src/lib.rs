//! Append-only version ledger for the asset registry.
//!
//! This crate provides:
//! - `VersionRecord`, the immutable snapshot written for every revision
//! - `VersionReader` / `VersionWriter` trait boundaries
//! - `VersionLedger`, an insert-only store keyed by (asset, version)
//! - History validation (contiguity, attribution, head agreement)

pub mod error;
pub mod memory;
pub mod records;
pub mod traits;
pub mod validation;

pub use error::LedgerError;
pub use memory::VersionLedger;
pub use records::{VersionDraft, VersionRecord, INITIAL_VERSION_DESCRIPTION};
pub use traits::{VersionReader, VersionWriter};
pub use validation::{HistoryReport, HistoryValidator, Violation, ViolationKind};
