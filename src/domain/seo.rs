//! SEO metadata attached to an external entity.

use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::error::DomainError;

/// Composite identity of an SEO record: the owning entity's type name and primary key.
///
/// Both parts are kept verbatim; blank values and control characters are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SeoIdentity {
    name: String,
    pk: String,
}

impl SeoIdentity {
    pub fn parse(name: impl Into<String>, pk: impl Into<String>) -> Result<Self, DomainError> {
        let name = name.into();
        let pk = pk.into();
        if name.trim().is_empty() {
            return Err(DomainError::blank("name"));
        }
        if pk.trim().is_empty() {
            return Err(DomainError::blank("pk"));
        }
        if name.chars().any(char::is_control) {
            return Err(DomainError::validation(
                "name must not contain control characters",
            ));
        }
        if pk.chars().any(char::is_control) {
            return Err(DomainError::validation(
                "pk must not contain control characters",
            ));
        }
        Ok(Self { name, pk })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pk(&self) -> &str {
        &self.pk
    }
}

impl fmt::Display for SeoIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.pk)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeoFields {
    pub title: String,
    pub description: String,
    pub keywords: String,
    pub og_title: String,
    pub og_description: String,
    pub og_image: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeoRecord {
    pub name: String,
    pub pk: String,
    pub title: String,
    pub description: String,
    pub keywords: String,
    pub og_title: String,
    pub og_description: String,
    pub og_image: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl SeoRecord {
    pub fn fields(&self) -> SeoFields {
        SeoFields {
            title: self.title.clone(),
            description: self.description.clone(),
            keywords: self.keywords.clone(),
            og_title: self.og_title.clone(),
            og_description: self.og_description.clone(),
            og_image: self.og_image.clone(),
        }
    }
}
