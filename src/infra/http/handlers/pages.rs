use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use seo_svc_api_types::{PageCreateRequest, PageUpdateRequest};

use super::{observed, page_fields};
use crate::domain::pages::{PageRecord, PageSlug};
use crate::infra::http::{ApiError, HttpState};

type SlugPath = Result<Path<String>, PathRejection>;

fn slug(path: SlugPath) -> Result<PageSlug, ApiError> {
    let Path(raw) = path?;
    Ok(PageSlug::new(raw)?)
}

pub async fn list_pages(State(state): State<HttpState>) -> Result<Json<Vec<PageRecord>>, ApiError> {
    observed("page.list", async {
        let pages = state.controller.list_pages(&state.op_context()).await?;
        Ok::<_, ApiError>(Json(pages))
    })
    .await
}

pub async fn get_page(
    State(state): State<HttpState>,
    path: SlugPath,
) -> Result<Json<PageRecord>, ApiError> {
    observed("page.get", async {
        let slug = slug(path)?;
        let page = state
            .controller
            .get_page(&state.op_context(), &slug)
            .await?;
        Ok::<_, ApiError>(Json(page))
    })
    .await
}

pub async fn create_page(
    State(state): State<HttpState>,
    payload: Result<Json<PageCreateRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PageRecord>), ApiError> {
    observed("page.create", async {
        let Json(body) = payload?;
        let slug = PageSlug::optional(body.slug.as_deref())?;
        let page = state
            .controller
            .create_page(&state.op_context(), slug, page_fields(body.fields))
            .await?;
        Ok::<_, ApiError>((StatusCode::CREATED, Json(page)))
    })
    .await
}

pub async fn update_page(
    State(state): State<HttpState>,
    path: SlugPath,
    payload: Result<Json<PageUpdateRequest>, JsonRejection>,
) -> Result<Json<PageRecord>, ApiError> {
    observed("page.update", async {
        let slug = slug(path)?;
        let Json(body) = payload?;
        let page = state
            .controller
            .update_page(&state.op_context(), slug, page_fields(body.fields))
            .await?;
        Ok::<_, ApiError>(Json(page))
    })
    .await
}

pub async fn delete_page(
    State(state): State<HttpState>,
    path: SlugPath,
) -> Result<StatusCode, ApiError> {
    observed("page.delete", async {
        let slug = slug(path)?;
        state
            .controller
            .delete_page(&state.op_context(), &slug)
            .await?;
        Ok::<_, ApiError>(StatusCode::NO_CONTENT)
    })
    .await
}
