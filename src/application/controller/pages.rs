use tracing::info;

use super::{Controller, OpContext};
use crate::application::error::{ControllerError, InternalCause};
use crate::application::repos::{CreatePageParams, RepoError, UpdatePageParams};
use crate::cache::ItemRef;
use crate::domain::ResourceKind;
use crate::domain::pages::{PageFields, PageRecord, PageSlug};
use crate::domain::slug::{SlugAsyncError, generate_unique_slug_async};

impl Controller {
    pub async fn list_pages(&self, ctx: &OpContext) -> Result<Vec<PageRecord>, ControllerError> {
        const OP: &str = "page.list";
        let key = self.keys.page_list();
        let pages = self.stores.pages.clone();

        let listed = self
            .read_through(ctx, OP, ResourceKind::Page, &key, async move {
                pages.list_pages().await.map(Some)
            })
            .await?;

        Ok(listed.unwrap_or_default())
    }

    pub async fn get_page(
        &self,
        ctx: &OpContext,
        slug: &PageSlug,
    ) -> Result<PageRecord, ControllerError> {
        const OP: &str = "page.get";
        let key = self.keys.page_item(slug);

        self.read_through(
            ctx,
            OP,
            ResourceKind::Page,
            &key,
            self.stores.pages.find_page(slug),
        )
        .await?
        .ok_or_else(|| ControllerError::not_found(ResourceKind::Page, slug))
    }

    /// Create a page. Without a caller-supplied slug one is derived from the title.
    pub async fn create_page(
        &self,
        ctx: &OpContext,
        slug: Option<PageSlug>,
        fields: PageFields,
    ) -> Result<PageRecord, ControllerError> {
        const OP: &str = "page.create";

        let slug = match slug {
            Some(slug) => slug,
            None => self.derive_free_slug(ctx, OP, &fields.title).await?,
        };
        let params = CreatePageParams {
            slug: slug.clone(),
            fields,
        };

        let created = match ctx.guard(OP, self.stores.pages_write.create_page(params)).await? {
            Ok(record) => record,
            Err(RepoError::Duplicate { .. }) => {
                return Err(ControllerError::already_exists(ResourceKind::Page, &slug));
            }
            Err(err) => return Err(ControllerError::store(OP, err)),
        };

        self.invalidate_after_write(ctx, OP, ItemRef::Page(&slug))
            .await?;
        info!(
            target = "seo_svc::controller",
            op = OP,
            slug = %slug,
            "page created"
        );
        Ok(created)
    }

    pub async fn update_page(
        &self,
        ctx: &OpContext,
        slug: PageSlug,
        fields: PageFields,
    ) -> Result<PageRecord, ControllerError> {
        const OP: &str = "page.update";
        let params = UpdatePageParams {
            slug: slug.clone(),
            fields,
        };

        let updated = match ctx.guard(OP, self.stores.pages_write.update_page(params)).await? {
            Ok(record) => record,
            Err(RepoError::NotFound) => {
                return Err(ControllerError::not_found(ResourceKind::Page, &slug));
            }
            Err(err) => return Err(ControllerError::store(OP, err)),
        };

        self.invalidate_after_write(ctx, OP, ItemRef::Page(&slug))
            .await?;
        info!(
            target = "seo_svc::controller",
            op = OP,
            slug = %slug,
            "page updated"
        );
        Ok(updated)
    }

    pub async fn delete_page(
        &self,
        ctx: &OpContext,
        slug: &PageSlug,
    ) -> Result<(), ControllerError> {
        const OP: &str = "page.delete";

        match ctx.guard(OP, self.stores.pages_write.delete_page(slug)).await? {
            Ok(()) => {}
            Err(RepoError::NotFound) => {
                return Err(ControllerError::not_found(ResourceKind::Page, slug));
            }
            Err(err) => return Err(ControllerError::store(OP, err)),
        }

        self.invalidate_after_write(ctx, OP, ItemRef::Page(slug))
            .await?;
        info!(
            target = "seo_svc::controller",
            op = OP,
            slug = %slug,
            "page deleted"
        );
        Ok(())
    }

    // Candidates are checked against the store, never the cache.
    async fn derive_free_slug(
        &self,
        ctx: &OpContext,
        op: &'static str,
        title: &str,
    ) -> Result<PageSlug, ControllerError> {
        let pages = self.stores.pages.clone();
        let derived = ctx
            .guard(
                op,
                generate_unique_slug_async(title, |candidate| {
                    let pages = pages.clone();
                    async move {
                        pages
                            .find_page(&candidate)
                            .await
                            .map(|found| found.is_none())
                    }
                }),
            )
            .await?;

        derived.map_err(|err| match err {
            SlugAsyncError::Predicate(err) => ControllerError::store(op, err),
            SlugAsyncError::Slug(err) => ControllerError::Internal {
                op,
                cause: InternalCause::Slug(err.to_string()),
            },
        })
    }
}
