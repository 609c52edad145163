use async_trait::async_trait;
use time::OffsetDateTime;

use crate::application::repos::{
    CreatePageParams, PagesRepo, PagesWriteRepo, RepoError, UpdatePageParams,
};
use crate::domain::pages::{PageRecord, PageSlug};

use super::{PostgresRepositories, map_sqlx_error};

const PAGE_COLUMNS: &str = "slug, title, href, content, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct PageRow {
    slug: String,
    title: String,
    href: String,
    content: String,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<PageRow> for PageRecord {
    fn from(row: PageRow) -> Self {
        Self {
            slug: row.slug,
            title: row.title,
            href: row.href,
            content: row.content,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl PagesRepo for PostgresRepositories {
    async fn list_pages(&self) -> Result<Vec<PageRecord>, RepoError> {
        let sql = format!("SELECT {PAGE_COLUMNS} FROM pages ORDER BY slug");
        let rows = sqlx::query_as::<_, PageRow>(&sql)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(PageRecord::from).collect())
    }

    async fn find_page(&self, slug: &PageSlug) -> Result<Option<PageRecord>, RepoError> {
        let sql = format!("SELECT {PAGE_COLUMNS} FROM pages WHERE slug = $1");
        let row = sqlx::query_as::<_, PageRow>(&sql)
            .bind(slug.as_str())
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(PageRecord::from))
    }
}

#[async_trait]
impl PagesWriteRepo for PostgresRepositories {
    async fn create_page(&self, params: CreatePageParams) -> Result<PageRecord, RepoError> {
        let CreatePageParams { slug, fields } = params;
        let sql = format!(
            "INSERT INTO pages (slug, title, href, content) VALUES ($1, $2, $3, $4) \
             RETURNING {PAGE_COLUMNS}"
        );

        let row = sqlx::query_as::<_, PageRow>(&sql)
            .bind(slug.as_str())
            .bind(fields.title)
            .bind(fields.href)
            .bind(fields.content)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn update_page(&self, params: UpdatePageParams) -> Result<PageRecord, RepoError> {
        let UpdatePageParams { slug, fields } = params;
        let sql = format!(
            "UPDATE pages SET title = $2, href = $3, content = $4, updated_at = now() \
             WHERE slug = $1 RETURNING {PAGE_COLUMNS}"
        );

        let row = sqlx::query_as::<_, PageRow>(&sql)
            .bind(slug.as_str())
            .bind(fields.title)
            .bind(fields.href)
            .bind(fields.content)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn delete_page(&self, slug: &PageSlug) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM pages WHERE slug = $1")
            .bind(slug.as_str())
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}
