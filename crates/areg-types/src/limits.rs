//! Field bounds shared by validation and audit coercion.
//!
//! Lengths are measured in Unicode scalar values.

/// Maximum display-name length.
pub const MAX_NAME_CHARS: usize = 64;
/// Maximum asset or version description length.
pub const MAX_DESCRIPTION_CHARS: usize = 128;
/// Maximum free-form metadata length.
pub const MAX_METADATA_CHARS: usize = 256;
/// Maximum change-summary length for a revision.
pub const MAX_SUMMARY_CHARS: usize = 256;
/// Maximum number of category tags per asset.
pub const MAX_TAGS: usize = 10;
/// Maximum length of a single category tag.
pub const MAX_TAG_CHARS: usize = 32;
/// Smallest accepted asset size in bytes.
pub const MIN_SIZE_BYTES: u64 = 1;
/// Largest accepted asset size in bytes.
pub const MAX_SIZE_BYTES: u64 = 1_000_000_000;
/// Exact length of content and key digests.
pub const DIGEST_CHARS: usize = 64;
/// Maximum audit action-tag length.
pub const MAX_ACTION_CHARS: usize = 32;
/// Maximum audit detail length.
pub const MAX_DETAIL_CHARS: usize = 256;
/// Lowest accepted rating.
pub const MIN_RATING: u8 = 1;
/// Highest accepted rating.
pub const MAX_RATING: u8 = 5;
/// Maximum collaboration-session title length.
pub const MAX_SESSION_TITLE_CHARS: usize = 64;

/// Character count used by every length bound.
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}
