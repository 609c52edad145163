use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use seo_svc_api_types::{SeoCreateRequest, SeoUpdateRequest};

use super::{observed, seo_fields};
use crate::domain::seo::{SeoIdentity, SeoRecord};
use crate::infra::http::{ApiError, HttpState};

type SeoPath = Result<Path<(String, String)>, PathRejection>;

fn identity(path: SeoPath) -> Result<SeoIdentity, ApiError> {
    let Path((name, pk)) = path?;
    Ok(SeoIdentity::parse(name, pk)?)
}

pub async fn create_seo(
    State(state): State<HttpState>,
    payload: Result<Json<SeoCreateRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SeoRecord>), ApiError> {
    observed("seo.create", async {
        let Json(body) = payload?;
        let identity = SeoIdentity::parse(body.name, body.pk)?;
        let record = state
            .controller
            .create_seo(&state.op_context(), identity, seo_fields(body.fields))
            .await?;
        Ok::<_, ApiError>((StatusCode::CREATED, Json(record)))
    })
    .await
}

pub async fn get_seo(
    State(state): State<HttpState>,
    path: SeoPath,
) -> Result<Json<SeoRecord>, ApiError> {
    observed("seo.get", async {
        let identity = identity(path)?;
        let record = state
            .controller
            .get_seo(&state.op_context(), &identity)
            .await?;
        Ok::<_, ApiError>(Json(record))
    })
    .await
}

pub async fn update_seo(
    State(state): State<HttpState>,
    path: SeoPath,
    payload: Result<Json<SeoUpdateRequest>, JsonRejection>,
) -> Result<Json<SeoRecord>, ApiError> {
    observed("seo.update", async {
        let identity = identity(path)?;
        let Json(body) = payload?;
        let record = state
            .controller
            .update_seo(&state.op_context(), identity, seo_fields(body.fields))
            .await?;
        Ok::<_, ApiError>(Json(record))
    })
    .await
}

pub async fn delete_seo(
    State(state): State<HttpState>,
    path: SeoPath,
) -> Result<StatusCode, ApiError> {
    observed("seo.delete", async {
        let identity = identity(path)?;
        state
            .controller
            .delete_seo(&state.op_context(), &identity)
            .await?;
        Ok::<_, ApiError>(StatusCode::NO_CONTENT)
    })
    .await
}
