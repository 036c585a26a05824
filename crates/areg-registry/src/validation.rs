//! Input types and field validation.
//!
//! Every check here runs before any state is touched. Out-of-range sizes
//! above the maximum and oversized tag lists are capacity errors; every
//! other bound violation is a validation error.

use serde::{Deserialize, Serialize};

use areg_ledger::VersionDraft;
use areg_types::limits::{
    char_len, MAX_DESCRIPTION_CHARS, MAX_METADATA_CHARS, MAX_NAME_CHARS, MAX_RATING,
    MAX_SESSION_TITLE_CHARS, MAX_SIZE_BYTES, MAX_SUMMARY_CHARS, MAX_TAGS, MAX_TAG_CHARS,
    MIN_RATING, MIN_SIZE_BYTES,
};
use areg_types::ContentDigest;

use crate::error::{RegistryError, RegistryResult};

/// Fields supplied when registering an asset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetDraft {
    pub name: String,
    pub size: u64,
    pub description: String,
    pub tags: Vec<String>,
    #[serde(default)]
    pub encrypted: bool,
    /// Empty, or exactly 64 characters.
    #[serde(default)]
    pub key_hash: String,
    pub content_hash: String,
    #[serde(default)]
    pub metadata: String,
}

/// An [`AssetDraft`] that passed validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatedAsset {
    pub name: String,
    pub size: u64,
    pub description: String,
    pub tags: Vec<String>,
    pub encrypted: bool,
    pub key_hash: Option<ContentDigest>,
    pub content_hash: ContentDigest,
    pub metadata: String,
}

impl AssetDraft {
    pub fn validate(self) -> RegistryResult<ValidatedAsset> {
        check_text("name", &self.name, MAX_NAME_CHARS)?;
        check_size(self.size)?;
        check_text("description", &self.description, MAX_DESCRIPTION_CHARS)?;
        check_tags(&self.tags)?;
        check_metadata(&self.metadata)?;
        let key_hash = ContentDigest::parse_optional(&self.key_hash)
            .map_err(|e| RegistryError::Validation(format!("key hash: {e}")))?;
        let content_hash = parse_content_hash(&self.content_hash)?;

        Ok(ValidatedAsset {
            name: self.name,
            size: self.size,
            description: self.description,
            tags: self.tags,
            encrypted: self.encrypted,
            key_hash,
            content_hash,
            metadata: self.metadata,
        })
    }
}

/// Fields supplied when revising an asset's content.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionDraft {
    pub description: String,
    pub size: u64,
    pub content_hash: String,
    pub summary: String,
}

impl RevisionDraft {
    pub fn validate(self) -> RegistryResult<VersionDraft> {
        check_text("description", &self.description, MAX_DESCRIPTION_CHARS)?;
        check_size(self.size)?;
        let content_hash = parse_content_hash(&self.content_hash)?;
        check_text("summary", &self.summary, MAX_SUMMARY_CHARS)?;
        Ok(VersionDraft {
            description: self.description,
            size: self.size,
            content_hash,
            summary: self.summary,
        })
    }
}

/// Display fields rewritten by a metadata edit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataUpdate {
    pub name: String,
    pub size: u64,
    pub description: String,
    pub tags: Vec<String>,
}

impl MetadataUpdate {
    pub fn validate(&self) -> RegistryResult<()> {
        check_text("name", &self.name, MAX_NAME_CHARS)?;
        check_size(self.size)?;
        check_text("description", &self.description, MAX_DESCRIPTION_CHARS)?;
        check_tags(&self.tags)
    }
}

/// Non-empty and at most `max` characters.
pub fn check_text(field: &str, value: &str, max: usize) -> RegistryResult<()> {
    let len = char_len(value);
    if len == 0 {
        return Err(RegistryError::Validation(format!("{field} must not be empty")));
    }
    if len > max {
        return Err(RegistryError::Validation(format!(
            "{field} is {len} characters, limit is {max}"
        )));
    }
    Ok(())
}

/// Metadata may be empty.
pub fn check_metadata(value: &str) -> RegistryResult<()> {
    let len = char_len(value);
    if len > MAX_METADATA_CHARS {
        return Err(RegistryError::Validation(format!(
            "metadata is {len} characters, limit is {MAX_METADATA_CHARS}"
        )));
    }
    Ok(())
}

pub fn check_size(size: u64) -> RegistryResult<()> {
    if size < MIN_SIZE_BYTES {
        return Err(RegistryError::Validation("size must be at least 1 byte".into()));
    }
    if size > MAX_SIZE_BYTES {
        return Err(RegistryError::CapacityExceeded(format!(
            "size {size} exceeds {MAX_SIZE_BYTES} bytes"
        )));
    }
    Ok(())
}

pub fn check_tags(tags: &[String]) -> RegistryResult<()> {
    if tags.is_empty() {
        return Err(RegistryError::Validation("at least one tag is required".into()));
    }
    if tags.len() > MAX_TAGS {
        return Err(RegistryError::CapacityExceeded(format!(
            "{} tags given, limit is {MAX_TAGS}",
            tags.len()
        )));
    }
    tags.iter()
        .try_for_each(|tag| check_text("tag", tag, MAX_TAG_CHARS))
}

pub fn check_rating(rating: u8) -> RegistryResult<()> {
    if (MIN_RATING..=MAX_RATING).contains(&rating) {
        Ok(())
    } else {
        Err(RegistryError::Validation(format!(
            "rating {rating} outside {MIN_RATING}..={MAX_RATING}"
        )))
    }
}

pub fn check_session_title(title: &str) -> RegistryResult<()> {
    check_text("session title", title, MAX_SESSION_TITLE_CHARS)
}

fn parse_content_hash(value: &str) -> RegistryResult<ContentDigest> {
    ContentDigest::parse(value).map_err(|e| RegistryError::Validation(format!("content hash: {e}")))
}
