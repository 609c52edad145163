//! Repository traits describing persistence adapters.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::pages::{PageFields, PageRecord, PageSlug};
use crate::domain::seo::{SeoFields, SeoIdentity, SeoRecord};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct CreateSeoParams {
    pub identity: SeoIdentity,
    pub fields: SeoFields,
}

#[derive(Debug, Clone)]
pub struct UpdateSeoParams {
    pub identity: SeoIdentity,
    pub fields: SeoFields,
}

#[derive(Debug, Clone)]
pub struct CreatePageParams {
    pub slug: PageSlug,
    pub fields: PageFields,
}

#[derive(Debug, Clone)]
pub struct UpdatePageParams {
    pub slug: PageSlug,
    pub fields: PageFields,
}

#[async_trait]
pub trait SeoRepo: Send + Sync {
    async fn find_seo(&self, identity: &SeoIdentity) -> Result<Option<SeoRecord>, RepoError>;
}

/// Write side of the SEO store.
///
/// `create_seo` fails with [`RepoError::Duplicate`] when the identity exists;
/// `update_seo` and `delete_seo` fail with [`RepoError::NotFound`] when it does not.
#[async_trait]
pub trait SeoWriteRepo: Send + Sync {
    async fn create_seo(&self, params: CreateSeoParams) -> Result<SeoRecord, RepoError>;

    async fn update_seo(&self, params: UpdateSeoParams) -> Result<SeoRecord, RepoError>;

    async fn delete_seo(&self, identity: &SeoIdentity) -> Result<(), RepoError>;
}

#[async_trait]
pub trait PagesRepo: Send + Sync {
    async fn list_pages(&self) -> Result<Vec<PageRecord>, RepoError>;

    async fn find_page(&self, slug: &PageSlug) -> Result<Option<PageRecord>, RepoError>;
}

/// Write side of the page store, with the same failure contract as [`SeoWriteRepo`].
#[async_trait]
pub trait PagesWriteRepo: Send + Sync {
    async fn create_page(&self, params: CreatePageParams) -> Result<PageRecord, RepoError>;

    async fn update_page(&self, params: UpdatePageParams) -> Result<PageRecord, RepoError>;

    async fn delete_page(&self, slug: &PageSlug) -> Result<(), RepoError>;
}

#[async_trait]
pub trait HealthRepo: Send + Sync {
    async fn ping(&self) -> Result<(), RepoError>;
}

/// Store handles injected into the controller.
#[derive(Clone)]
pub struct Stores {
    pub seo: Arc<dyn SeoRepo>,
    pub seo_write: Arc<dyn SeoWriteRepo>,
    pub pages: Arc<dyn PagesRepo>,
    pub pages_write: Arc<dyn PagesWriteRepo>,
}

impl Stores {
    /// Use one repository value for every store role.
    pub fn from_shared<R>(repo: Arc<R>) -> Self
    where
        R: SeoRepo + SeoWriteRepo + PagesRepo + PagesWriteRepo + 'static,
    {
        Self {
            seo: repo.clone(),
            seo_write: repo.clone(),
            pages: repo.clone(),
            pages_write: repo,
        }
    }
}
