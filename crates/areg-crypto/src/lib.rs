//! Hashing primitives for the asset registry.
//!
//! Provides domain-separated BLAKE3 hashing and hash chain verification for
//! the append-only audit trail. All crypto operations wrap established
//! libraries; nothing here is custom cryptography.

pub mod chain;
pub mod hasher;

pub use chain::{ChainError, ChainLink, HashChainVerifier};
pub use hasher::{ContentHasher, HasherError};
