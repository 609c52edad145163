use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use seo_svc::application::controller::Controller;
use seo_svc::application::error::Outcome;
use seo_svc::application::repos::Stores;
use seo_svc::cache::{CacheKeys, CachePolicy, MemoryCache};
use seo_svc::infra::grpc::proto::page_service_server::PageService;
use seo_svc::infra::grpc::proto::seo_service_server::SeoService;
use seo_svc::infra::grpc::proto::{
    Empty, PageKey, PageWriteRequest, SeoFields, SeoKey, SeoWriteRequest,
};
use seo_svc::infra::grpc::{GrpcState, PageGrpcService, SeoGrpcService, code_for, outcome_for};
use seo_svc::infra::http::{HttpState, build_router, status_for};
use seo_svc::infra::memory::InMemoryRepositories;
use tonic::Code;
use tower::ServiceExt;

struct Adapters {
    router: Router,
    seo: SeoGrpcService,
    pages: PageGrpcService,
    store: Arc<InMemoryRepositories>,
}

fn adapters() -> Adapters {
    let store = Arc::new(InMemoryRepositories::new());
    let controller = Controller::new(
        Stores::from_shared(store.clone()),
        Arc::new(MemoryCache::new()),
        CacheKeys::new("parity"),
        CachePolicy::default(),
    );
    let timeout = Duration::from_secs(5);
    let router = build_router(HttpState {
        controller: controller.clone(),
        health: store.clone(),
        request_timeout: timeout,
    });
    let state = GrpcState {
        controller,
        request_timeout: timeout,
    };
    Adapters {
        router,
        seo: SeoGrpcService::new(state.clone()),
        pages: PageGrpcService::new(state),
        store,
    }
}

async fn http_status(router: &Router, method: Method, uri: &str, body: Option<&str>) -> StatusCode {
    let mut builder = Request::builder().method(method).uri(uri);
    if body.is_some() {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
    }
    let body = body.map_or_else(Body::empty, |raw| Body::from(raw.to_string()));
    router
        .clone()
        .oneshot(builder.body(body).expect("request"))
        .await
        .expect("response")
        .status()
}

fn assert_parity(http: StatusCode, grpc: Code, expected: Outcome) {
    assert_eq!(http, status_for(expected), "http status for {expected:?}");
    assert_eq!(grpc, code_for(expected), "grpc code for {expected:?}");
    assert_eq!(outcome_for(grpc), expected);
}

#[tokio::test]
async fn missing_page_maps_to_not_found_on_both_transports() {
    let adapters = adapters();

    let http = http_status(&adapters.router, Method::GET, "/api/page/no-such-page", None).await;
    let grpc = adapters
        .pages
        .get_page(tonic::Request::new(PageKey {
            slug: "no-such-page".to_string(),
        }))
        .await
        .expect_err("missing page");

    assert_eq!(grpc.code(), Code::NotFound);
    assert_parity(http, grpc.code(), Outcome::NotFound);
}

#[tokio::test]
async fn blank_identity_is_invalid_on_both_transports() {
    let adapters = adapters();

    let http = http_status(
        &adapters.router,
        Method::POST,
        "/api/seo",
        Some(r#"{"name":"","pk":"1"}"#),
    )
    .await;
    let grpc = adapters
        .seo
        .create_seo(tonic::Request::new(SeoWriteRequest {
            name: String::new(),
            pk: "1".to_string(),
            fields: None,
        }))
        .await
        .expect_err("blank name");

    assert_eq!(grpc.code(), Code::InvalidArgument);
    assert_parity(http, grpc.code(), Outcome::InvalidArgument);
    assert_eq!(adapters.store.calls().writes, 0);
}

#[tokio::test]
async fn nul_in_identity_is_invalid_on_both_transports() {
    let adapters = adapters();

    let http = http_status(&adapters.router, Method::GET, "/api/seo/a%00/1", None).await;
    let grpc = adapters
        .seo
        .get_seo(tonic::Request::new(SeoKey {
            name: "a\0".to_string(),
            pk: "1".to_string(),
        }))
        .await
        .expect_err("nul in name");

    assert_eq!(grpc.code(), Code::InvalidArgument);
    assert_parity(http, grpc.code(), Outcome::InvalidArgument);
    assert_eq!(adapters.store.calls().reads, 0);
}

#[tokio::test]
async fn duplicate_create_conflicts_on_both_transports() {
    let adapters = adapters();
    let request = || SeoWriteRequest {
        name: "product".to_string(),
        pk: "9".to_string(),
        fields: Some(SeoFields {
            title: "Lamp".to_string(),
            ..Default::default()
        }),
    };

    adapters
        .seo
        .create_seo(tonic::Request::new(request()))
        .await
        .expect("first create");

    let grpc = adapters
        .seo
        .create_seo(tonic::Request::new(request()))
        .await
        .expect_err("duplicate");
    let http = http_status(
        &adapters.router,
        Method::POST,
        "/api/seo",
        Some(r#"{"name":"product","pk":"9"}"#),
    )
    .await;

    assert_parity(http, grpc.code(), Outcome::AlreadyExists);
}

#[tokio::test]
async fn writes_over_grpc_are_visible_over_http() {
    let adapters = adapters();

    let created = adapters
        .pages
        .create_page(tonic::Request::new(PageWriteRequest {
            slug: String::new(),
            title: "Terms of Service".to_string(),
            href: "/terms".to_string(),
            content: "be nice".to_string(),
        }))
        .await
        .expect("create")
        .into_inner();
    assert_eq!(created.slug, "terms-of-service");
    assert!(!created.created_at.is_empty());

    let status = http_status(&adapters.router, Method::GET, "/api/page/terms-of-service", None).await;
    assert_eq!(status, StatusCode::OK);

    let listed = adapters
        .pages
        .list_pages(tonic::Request::new(Empty {}))
        .await
        .expect("list")
        .into_inner();
    assert_eq!(listed.pages.len(), 1);

    adapters
        .pages
        .delete_page(tonic::Request::new(PageKey {
            slug: "terms-of-service".to_string(),
        }))
        .await
        .expect("delete");

    let status = http_status(&adapters.router, Method::GET, "/api/page/terms-of-service", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn store_outage_is_internal_on_both_transports() {
    let adapters = adapters();
    adapters.store.set_unavailable(true);

    let http = http_status(&adapters.router, Method::GET, "/api/seo/product/1", None).await;
    let grpc = adapters
        .seo
        .get_seo(tonic::Request::new(SeoKey {
            name: "product".to_string(),
            pk: "1".to_string(),
        }))
        .await
        .expect_err("store down");

    assert_parity(http, grpc.code(), Outcome::Internal);
    assert_eq!(grpc.message(), "internal error");
}

#[tokio::test]
async fn expired_grpc_timeout_is_internal() {
    let adapters = adapters();
    let mut request = tonic::Request::new(Empty {});
    request
        .metadata_mut()
        .insert("grpc-timeout", "0n".parse().expect("metadata value"));

    let status = adapters
        .pages
        .list_pages(request)
        .await
        .expect_err("deadline already passed");
    assert_eq!(status.code(), Code::Internal);
}
