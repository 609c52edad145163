//! HTTP adapter: JSON routes over the cache-aside controller.

pub mod error;
mod handlers;
mod middleware;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    middleware as axum_middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};

use crate::application::controller::{Controller, OpContext};
use crate::application::error::ErrorReport;
use crate::application::repos::{HealthRepo, RepoError};

pub use error::{ApiError, status_for};

#[derive(Clone)]
pub struct HttpState {
    pub controller: Controller,
    pub health: Arc<dyn HealthRepo>,
    pub request_timeout: Duration,
}

impl HttpState {
    /// Fresh operation context carrying the configured request deadline.
    pub fn op_context(&self) -> OpContext {
        OpContext::with_timeout(self.request_timeout)
    }
}

pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route("/api/seo", post(handlers::seo::create_seo))
        .route(
            "/api/seo/{name}/{pk}",
            get(handlers::seo::get_seo)
                .put(handlers::seo::update_seo)
                .delete(handlers::seo::delete_seo),
        )
        .route(
            "/api/page",
            get(handlers::pages::list_pages).post(handlers::pages::create_page),
        )
        .route(
            "/api/page/{slug}",
            get(handlers::pages::get_page)
                .put(handlers::pages::update_page)
                .delete(handlers::pages::delete_page),
        )
        .route("/health", get(health))
        .method_not_allowed_fallback(method_not_allowed)
        .fallback(route_not_found)
        .with_state(state)
        .layer(axum_middleware::from_fn(middleware::log_responses))
        .layer(axum_middleware::from_fn(middleware::set_request_id))
}

async fn health(State(state): State<HttpState>) -> Response {
    db_health_response(state.health.ping().await)
}

fn db_health_response(result: Result<(), RepoError>) -> Response {
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            ErrorReport::from_error(
                "infra::http::db_health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}

async fn method_not_allowed() -> ApiError {
    ApiError::method_not_allowed()
}

async fn route_not_found() -> ApiError {
    ApiError::not_found("route not found")
}
