//! In-process store used for local development and tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::application::repos::{
    CreatePageParams, CreateSeoParams, HealthRepo, PagesRepo, PagesWriteRepo, RepoError, SeoRepo,
    SeoWriteRepo, UpdatePageParams, UpdateSeoParams,
};
use crate::domain::pages::{PageRecord, PageSlug};
use crate::domain::seo::{SeoIdentity, SeoRecord};
use crate::util::lock;

/// Number of store round trips observed so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCalls {
    pub reads: usize,
    pub writes: usize,
}

#[derive(Debug, Default)]
pub struct InMemoryRepositories {
    seo: RwLock<HashMap<SeoIdentity, SeoRecord>>,
    pages: RwLock<BTreeMap<String, PageRecord>>,
    reads: AtomicUsize,
    writes: AtomicUsize,
    unavailable: AtomicBool,
}

impl InMemoryRepositories {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> StoreCalls {
        StoreCalls {
            reads: self.reads.load(Ordering::SeqCst),
            writes: self.writes.load(Ordering::SeqCst),
        }
    }

    /// Make every subsequent call fail with a persistence error.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn begin_read(&self) -> Result<(), RepoError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.check_available()
    }

    fn begin_write(&self) -> Result<(), RepoError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.check_available()
    }

    fn check_available(&self) -> Result<(), RepoError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(RepoError::from_persistence("in-memory store marked unavailable"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl SeoRepo for InMemoryRepositories {
    async fn find_seo(&self, identity: &SeoIdentity) -> Result<Option<SeoRecord>, RepoError> {
        self.begin_read()?;
        Ok(lock::read(&self.seo, "seo", "find_seo").get(identity).cloned())
    }
}

#[async_trait]
impl SeoWriteRepo for InMemoryRepositories {
    async fn create_seo(&self, params: CreateSeoParams) -> Result<SeoRecord, RepoError> {
        self.begin_write()?;
        let mut seo = lock::write(&self.seo, "seo", "create_seo");
        if seo.contains_key(&params.identity) {
            return Err(RepoError::Duplicate {
                constraint: "seo_pkey".to_string(),
            });
        }

        let now = OffsetDateTime::now_utc();
        let fields = params.fields;
        let record = SeoRecord {
            name: params.identity.name().to_string(),
            pk: params.identity.pk().to_string(),
            title: fields.title,
            description: fields.description,
            keywords: fields.keywords,
            og_title: fields.og_title,
            og_description: fields.og_description,
            og_image: fields.og_image,
            created_at: now,
            updated_at: now,
        };
        seo.insert(params.identity, record.clone());
        Ok(record)
    }

    async fn update_seo(&self, params: UpdateSeoParams) -> Result<SeoRecord, RepoError> {
        self.begin_write()?;
        let mut seo = lock::write(&self.seo, "seo", "update_seo");
        let record = seo.get_mut(&params.identity).ok_or(RepoError::NotFound)?;

        let fields = params.fields;
        record.title = fields.title;
        record.description = fields.description;
        record.keywords = fields.keywords;
        record.og_title = fields.og_title;
        record.og_description = fields.og_description;
        record.og_image = fields.og_image;
        record.updated_at = OffsetDateTime::now_utc();
        Ok(record.clone())
    }

    async fn delete_seo(&self, identity: &SeoIdentity) -> Result<(), RepoError> {
        self.begin_write()?;
        lock::write(&self.seo, "seo", "delete_seo")
            .remove(identity)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl PagesRepo for InMemoryRepositories {
    async fn list_pages(&self) -> Result<Vec<PageRecord>, RepoError> {
        self.begin_read()?;
        Ok(lock::read(&self.pages, "pages", "list_pages")
            .values()
            .cloned()
            .collect())
    }

    async fn find_page(&self, slug: &PageSlug) -> Result<Option<PageRecord>, RepoError> {
        self.begin_read()?;
        Ok(lock::read(&self.pages, "pages", "find_page")
            .get(slug.as_str())
            .cloned())
    }
}

#[async_trait]
impl PagesWriteRepo for InMemoryRepositories {
    async fn create_page(&self, params: CreatePageParams) -> Result<PageRecord, RepoError> {
        self.begin_write()?;
        let mut pages = lock::write(&self.pages, "pages", "create_page");
        if pages.contains_key(params.slug.as_str()) {
            return Err(RepoError::Duplicate {
                constraint: "pages_pkey".to_string(),
            });
        }

        let now = OffsetDateTime::now_utc();
        let record = PageRecord {
            slug: params.slug.as_str().to_string(),
            title: params.fields.title,
            href: params.fields.href,
            content: params.fields.content,
            created_at: now,
            updated_at: now,
        };
        pages.insert(record.slug.clone(), record.clone());
        Ok(record)
    }

    async fn update_page(&self, params: UpdatePageParams) -> Result<PageRecord, RepoError> {
        self.begin_write()?;
        let mut pages = lock::write(&self.pages, "pages", "update_page");
        let record = pages
            .get_mut(params.slug.as_str())
            .ok_or(RepoError::NotFound)?;

        record.title = params.fields.title;
        record.href = params.fields.href;
        record.content = params.fields.content;
        record.updated_at = OffsetDateTime::now_utc();
        Ok(record.clone())
    }

    async fn delete_page(&self, slug: &PageSlug) -> Result<(), RepoError> {
        self.begin_write()?;
        lock::write(&self.pages, "pages", "delete_page")
            .remove(slug.as_str())
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl HealthRepo for InMemoryRepositories {
    async fn ping(&self) -> Result<(), RepoError> {
        self.check_available()
    }
}
