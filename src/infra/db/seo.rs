use async_trait::async_trait;
use time::OffsetDateTime;

use crate::application::repos::{
    CreateSeoParams, RepoError, SeoRepo, SeoWriteRepo, UpdateSeoParams,
};
use crate::domain::seo::{SeoIdentity, SeoRecord};

use super::{PostgresRepositories, map_sqlx_error};

const SEO_COLUMNS: &str = "name, pk, title, description, keywords, og_title, og_description, \
     og_image, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct SeoRow {
    name: String,
    pk: String,
    title: String,
    description: String,
    keywords: String,
    og_title: String,
    og_description: String,
    og_image: String,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<SeoRow> for SeoRecord {
    fn from(row: SeoRow) -> Self {
        Self {
            name: row.name,
            pk: row.pk,
            title: row.title,
            description: row.description,
            keywords: row.keywords,
            og_title: row.og_title,
            og_description: row.og_description,
            og_image: row.og_image,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl SeoRepo for PostgresRepositories {
    async fn find_seo(&self, identity: &SeoIdentity) -> Result<Option<SeoRecord>, RepoError> {
        let sql = format!("SELECT {SEO_COLUMNS} FROM seo WHERE name = $1 AND pk = $2");
        let row = sqlx::query_as::<_, SeoRow>(&sql)
            .bind(identity.name())
            .bind(identity.pk())
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(SeoRecord::from))
    }
}

#[async_trait]
impl SeoWriteRepo for PostgresRepositories {
    async fn create_seo(&self, params: CreateSeoParams) -> Result<SeoRecord, RepoError> {
        let CreateSeoParams { identity, fields } = params;
        let sql = format!(
            "INSERT INTO seo (name, pk, title, description, keywords, og_title, og_description, og_image) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {SEO_COLUMNS}"
        );

        let row = sqlx::query_as::<_, SeoRow>(&sql)
            .bind(identity.name())
            .bind(identity.pk())
            .bind(fields.title)
            .bind(fields.description)
            .bind(fields.keywords)
            .bind(fields.og_title)
            .bind(fields.og_description)
            .bind(fields.og_image)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn update_seo(&self, params: UpdateSeoParams) -> Result<SeoRecord, RepoError> {
        let UpdateSeoParams { identity, fields } = params;
        let sql = format!(
            "UPDATE seo SET title = $3, description = $4, keywords = $5, og_title = $6, \
             og_description = $7, og_image = $8, updated_at = now() \
             WHERE name = $1 AND pk = $2 \
             RETURNING {SEO_COLUMNS}"
        );

        // No row back means no such record; `fetch_one` maps that to NotFound.
        let row = sqlx::query_as::<_, SeoRow>(&sql)
            .bind(identity.name())
            .bind(identity.pk())
            .bind(fields.title)
            .bind(fields.description)
            .bind(fields.keywords)
            .bind(fields.og_title)
            .bind(fields.og_description)
            .bind(fields.og_image)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn delete_seo(&self, identity: &SeoIdentity) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM seo WHERE name = $1 AND pk = $2")
            .bind(identity.name())
            .bind(identity.pk())
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}
