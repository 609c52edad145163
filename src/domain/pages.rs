use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::error::DomainError;

const MAX_SLUG_LEN: usize = 200;

/// URL-safe page identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PageSlug(String);

impl PageSlug {
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let raw = value.into();
        if raw.trim().is_empty() {
            return Err(DomainError::blank("slug"));
        }
        if raw.contains('/') || raw.chars().any(char::is_whitespace) {
            return Err(DomainError::validation(
                "slug must not contain `/` or whitespace",
            ));
        }
        if raw.chars().any(char::is_control) {
            return Err(DomainError::validation(
                "slug must not contain control characters",
            ));
        }
        if raw.len() > MAX_SLUG_LEN {
            return Err(DomainError::validation(format!(
                "slug must be at most {MAX_SLUG_LEN} bytes"
            )));
        }
        Ok(Self(raw))
    }

    /// Slug supplied on create, where an absent or blank value asks for derivation.
    pub fn optional(value: Option<&str>) -> Result<Option<Self>, DomainError> {
        match value {
            Some(raw) if !raw.trim().is_empty() => Self::new(raw).map(Some),
            _ => Ok(None),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PageSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageFields {
    pub title: String,
    pub href: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    pub slug: String,
    pub title: String,
    pub href: String,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}
