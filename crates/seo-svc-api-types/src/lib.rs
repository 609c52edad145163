//! Wire types for the seo-svc HTTP API.
//!
//! Request payloads are deserialized by the server and serialized by clients;
//! the error envelope is shared so clients can decode failures uniformly.

use serde::{Deserialize, Serialize};

/// Body of `POST /api/seo`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeoCreateRequest {
    pub name: String,
    pub pk: String,
    #[serde(flatten)]
    pub fields: SeoFieldsPayload,
}

/// Body of `PUT /api/seo/{name}/{pk}`. Identity comes from the path.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeoUpdateRequest {
    #[serde(flatten)]
    pub fields: SeoFieldsPayload,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SeoFieldsPayload {
    pub title: String,
    pub description: String,
    pub keywords: String,
    pub og_title: String,
    pub og_description: String,
    pub og_image: String,
}

/// Body of `POST /api/page`. When `slug` is omitted one is derived from `title`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageCreateRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(flatten)]
    pub fields: PageFieldsPayload,
}

/// Body of `PUT /api/page/{slug}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageUpdateRequest {
    #[serde(flatten)]
    pub fields: PageFieldsPayload,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PageFieldsPayload {
    pub title: String,
    pub href: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiErrorBody {
    pub error: ApiErrorMessage,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiErrorMessage {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

/// Stable values of [`ApiErrorMessage::code`].
pub mod codes {
    pub const BAD_REQUEST: &str = "bad_request";
    pub const NOT_FOUND: &str = "not_found";
    pub const ALREADY_EXISTS: &str = "already_exists";
    pub const INTERNAL: &str = "internal";
    pub const METHOD_NOT_ALLOWED: &str = "method_not_allowed";
}
