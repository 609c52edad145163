use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use serde_json::{Value, json};
use seo_svc::application::controller::Controller;
use seo_svc::application::repos::Stores;
use seo_svc::cache::{CacheKeys, CachePolicy, MemoryCache};
use seo_svc::infra::http::{HttpState, build_router};
use seo_svc::infra::memory::InMemoryRepositories;
use seo_svc_api_types::{ApiErrorBody, codes};
use tower::ServiceExt;

struct TestApp {
    router: Router,
    store: Arc<InMemoryRepositories>,
    cache: Arc<MemoryCache>,
}

fn app() -> TestApp {
    let store = Arc::new(InMemoryRepositories::new());
    let cache = Arc::new(MemoryCache::new());
    let controller = Controller::new(
        Stores::from_shared(store.clone()),
        cache.clone(),
        CacheKeys::new("it"),
        CachePolicy::default(),
    );
    let router = build_router(HttpState {
        controller,
        health: store.clone(),
        request_timeout: Duration::from_secs(5),
    });
    TestApp {
        router,
        store,
        cache,
    }
}

async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };
    let response = router
        .clone()
        .oneshot(builder.body(body).expect("request"))
        .await
        .expect("router is infallible");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    (status, bytes.to_vec())
}

fn json_body(bytes: &[u8]) -> Value {
    serde_json::from_slice(bytes).expect("json body")
}

fn error_code(bytes: &[u8]) -> String {
    let body: ApiErrorBody = serde_json::from_slice(bytes).expect("error body");
    body.error.code
}

#[tokio::test]
async fn seo_crud_over_http() {
    let app = app();

    let (status, body) = send(
        &app.router,
        Method::POST,
        "/api/seo",
        Some(json!({ "name": "product", "pk": "42", "title": "Blue Mug" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let created = json_body(&body);
    assert_eq!(created["name"], "product");
    assert_eq!(created["title"], "Blue Mug");
    assert_eq!(created["description"], "");

    let (status, body) = send(&app.router, Method::GET, "/api/seo/product/42", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body)["title"], "Blue Mug");

    let (status, body) = send(
        &app.router,
        Method::PUT,
        "/api/seo/product/42",
        Some(json!({ "title": "Red Mug", "og_image": "/img/red.png" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body)["og_image"], "/img/red.png");

    let (status, body) = send(&app.router, Method::GET, "/api/seo/product/42", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body)["title"], "Red Mug");

    let (status, body) = send(&app.router, Method::DELETE, "/api/seo/product/42", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_empty());

    let (status, body) = send(&app.router, Method::GET, "/api/seo/product/42", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&body), codes::NOT_FOUND);
}

#[tokio::test]
async fn duplicate_seo_is_conflict() {
    let app = app();
    let payload = json!({ "name": "product", "pk": "7", "title": "First" });

    let (status, _) = send(&app.router, Method::POST, "/api/seo", Some(payload.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &app.router,
        Method::POST,
        "/api/seo",
        Some(json!({ "name": "product", "pk": "7", "title": "Second" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), codes::ALREADY_EXISTS);

    let (_, body) = send(&app.router, Method::GET, "/api/seo/product/7", None).await;
    assert_eq!(json_body(&body)["title"], "First");
}

#[tokio::test]
async fn blank_identity_and_bad_json_are_bad_requests() {
    let app = app();

    let (status, body) = send(
        &app.router,
        Method::POST,
        "/api/seo",
        Some(json!({ "name": "  ", "pk": "1" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), codes::BAD_REQUEST);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/page")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .expect("request");
    let response = app.router.clone().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    assert_eq!(error_code(&bytes), codes::BAD_REQUEST);

    assert_eq!(app.store.calls().writes, 0);
}

#[tokio::test]
async fn control_characters_in_path_are_bad_requests() {
    let app = app();

    for uri in ["/api/seo/a%00/1", "/api/seo/product/4%0A2", "/api/page/home%1B"] {
        let (status, body) = send(&app.router, Method::GET, uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(error_code(&body), codes::BAD_REQUEST, "{uri}");
    }

    let (status, _) = send(
        &app.router,
        Method::POST,
        "/api/page",
        Some(json!({ "slug": "nul\u{0}", "title": "Nul" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.store.calls().reads, 0);
    assert_eq!(app.store.calls().writes, 0);
}

#[tokio::test]
async fn pages_list_and_derived_slugs() {
    let app = app();

    let (status, body) = send(
        &app.router,
        Method::POST,
        "/api/page",
        Some(json!({ "title": "About Us", "href": "/about", "content": "hi" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json_body(&body)["slug"], "about-us");

    let (status, body) = send(
        &app.router,
        Method::POST,
        "/api/page",
        Some(json!({ "title": "About Us" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json_body(&body)["slug"], "about-us-2");

    let (status, body) = send(
        &app.router,
        Method::POST,
        "/api/page",
        Some(json!({ "slug": "contact", "title": "Contact" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json_body(&body)["slug"], "contact");

    let (status, body) = send(&app.router, Method::GET, "/api/page", None).await;
    assert_eq!(status, StatusCode::OK);
    let slugs: Vec<String> = json_body(&body)
        .as_array()
        .expect("array")
        .iter()
        .map(|page| page["slug"].as_str().expect("slug").to_string())
        .collect();
    assert_eq!(slugs, ["about-us", "about-us-2", "contact"]);
}

#[tokio::test]
async fn page_writes_drop_cached_list() {
    let app = app();

    send(
        &app.router,
        Method::POST,
        "/api/page",
        Some(json!({ "slug": "home", "title": "Home" })),
    )
    .await;
    let (status, _) = send(&app.router, Method::GET, "/api/page", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(app.cache.contains_key("it:page:list"));

    let (status, _) = send(
        &app.router,
        Method::PUT,
        "/api/page/home",
        Some(json!({ "title": "Welcome" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(!app.cache.contains_key("it:page:list"));

    let (_, body) = send(&app.router, Method::GET, "/api/page", None).await;
    assert_eq!(json_body(&body)[0]["title"], "Welcome");
}

#[tokio::test]
async fn missing_page_update_and_delete_are_not_found() {
    let app = app();

    let (status, body) = send(
        &app.router,
        Method::PUT,
        "/api/page/ghost",
        Some(json!({ "title": "Ghost" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let error: ApiErrorBody = serde_json::from_slice(&body).expect("error body");
    assert_eq!(error.error.code, codes::NOT_FOUND);
    assert_eq!(error.error.hint.as_deref(), Some("page ghost"));

    let (status, _) = send(&app.router, Method::DELETE, "/api/page/ghost", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unsupported_method_and_unknown_route() {
    let app = app();

    let (status, body) = send(&app.router, Method::PATCH, "/api/page/home", None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(error_code(&body), codes::METHOD_NOT_ALLOWED);

    let (status, body) = send(&app.router, Method::GET, "/api/nothing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&body), codes::NOT_FOUND);
}

#[tokio::test]
async fn store_outage_is_internal_and_health_degrades() {
    let app = app();

    let (status, _) = send(&app.router, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    app.store.set_unavailable(true);

    let (status, body) = send(&app.router, Method::GET, "/api/page/home", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let error: ApiErrorBody = serde_json::from_slice(&body).expect("error body");
    assert_eq!(error.error.code, codes::INTERNAL);
    assert!(!error.error.message.contains("unavailable"));

    let (status, _) = send(&app.router, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn request_id_is_echoed_or_minted() {
    let app = app();

    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "trace-abc")
        .body(Body::empty())
        .expect("request");
    let response = app.router.clone().oneshot(request).await.expect("response");
    assert_eq!(
        response.headers().get("x-request-id").map(|v| v.as_bytes()),
        Some(&b"trace-abc"[..])
    );

    let request = Request::builder()
        .uri("/api/page/missing")
        .body(Body::empty())
        .expect("request");
    let response = app.router.clone().oneshot(request).await.expect("response");
    let minted = response
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .expect("minted request id");
    assert!(uuid::Uuid::parse_str(minted).is_ok());
}
