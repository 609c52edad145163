//! Optional registration with an HTTP service registry.
//!
//! The registry speaks a small JSON protocol:
//! `POST {base}/register` and `POST {base}/deregister` with `{"name", "address"}`,
//! and `GET {base}/find/{name}` answering `{"address"}`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::DiscoverySettings;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("invalid registry url: {0}")]
    Url(#[from] url::ParseError),
    #[error("registry request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("registry answered {status}: {body}")]
    Registry { status: StatusCode, body: String },
    #[error("service `{0}` is not registered")]
    NotRegistered(String),
}

#[async_trait]
pub trait Discovery: Send + Sync {
    async fn register(&self) -> Result<(), DiscoveryError>;

    async fn deregister(&self) -> Result<(), DiscoveryError>;

    /// Resolve the advertised address of another service.
    async fn find_service_by_name(&self, name: &str) -> Result<String, DiscoveryError>;
}

/// Used when no registry is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDiscovery;

#[async_trait]
impl Discovery for NoopDiscovery {
    async fn register(&self) -> Result<(), DiscoveryError> {
        Ok(())
    }

    async fn deregister(&self) -> Result<(), DiscoveryError> {
        Ok(())
    }

    async fn find_service_by_name(&self, name: &str) -> Result<String, DiscoveryError> {
        Err(DiscoveryError::NotRegistered(name.to_string()))
    }
}

#[derive(Debug, Serialize)]
struct Registration<'a> {
    name: &'a str,
    address: &'a str,
}

#[derive(Debug, Deserialize)]
struct FoundService {
    address: String,
}

#[derive(Debug, Clone)]
pub struct HttpDiscovery {
    client: Client,
    base: Url,
    service_name: String,
    address: String,
}

impl HttpDiscovery {
    pub fn new(
        base: Url,
        service_name: impl Into<String>,
        address: impl Into<String>,
    ) -> Result<Self, DiscoveryError> {
        let client = Client::builder()
            .user_agent(concat!("seo-svc/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        // Trailing slash so `join` appends instead of replacing the last segment.
        let base = if base.path().ends_with('/') {
            base
        } else {
            Url::parse(&format!("{base}/"))?
        };

        Ok(Self {
            client,
            base,
            service_name: service_name.into(),
            address: address.into(),
        })
    }

    async fn post_registration(&self, path: &str) -> Result<(), DiscoveryError> {
        let url = self.base.join(path)?;
        let body = Registration {
            name: &self.service_name,
            address: &self.address,
        };
        let resp = self.client.post(url).json(&body).send().await?;
        ensure_success(resp).await.map(|_| ())
    }
}

async fn ensure_success(resp: reqwest::Response) -> Result<reqwest::Response, DiscoveryError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(DiscoveryError::Registry { status, body })
}

#[async_trait]
impl Discovery for HttpDiscovery {
    async fn register(&self) -> Result<(), DiscoveryError> {
        self.post_registration("register").await
    }

    async fn deregister(&self) -> Result<(), DiscoveryError> {
        self.post_registration("deregister").await
    }

    async fn find_service_by_name(&self, name: &str) -> Result<String, DiscoveryError> {
        let mut url = self.base.join("find/")?;
        url.path_segments_mut()
            .map_err(|()| DiscoveryError::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .push(name);

        let resp = self.client.get(url).send().await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Err(DiscoveryError::NotRegistered(name.to_string()));
        }
        let found: FoundService = ensure_success(resp).await?.json().await?;
        Ok(found.address)
    }
}

/// Build the discovery client described by the settings.
pub fn from_settings(settings: &DiscoverySettings) -> Result<Box<dyn Discovery>, DiscoveryError> {
    match settings.url.as_ref() {
        Some(url) => Ok(Box::new(HttpDiscovery::new(
            url.clone(),
            settings.service_name.clone(),
            settings.advertise_url.as_str(),
        )?)),
        None => Ok(Box::new(NoopDiscovery)),
    }
}

/// Register, logging instead of failing.
pub async fn register_best_effort(discovery: &dyn Discovery, service_name: &str) {
    match discovery.register().await {
        Ok(()) => info!(
            target = "seo_svc::infra::discovery",
            service = service_name,
            "registered with service registry"
        ),
        Err(err) => warn!(
            target = "seo_svc::infra::discovery",
            service = service_name,
            error = %err,
            "service registration failed"
        ),
    }
}

/// Deregister, logging instead of failing.
pub async fn deregister_best_effort(discovery: &dyn Discovery, service_name: &str) {
    if let Err(err) = discovery.deregister().await {
        warn!(
            target = "seo_svc::infra::discovery",
            service = service_name,
            error = %err,
            "service deregistration failed"
        );
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Json, Router,
        extract::{Path, State},
        http::StatusCode as AxumStatus,
        routing::{get, post},
    };
    use serde_json::{Value, json};
    use tokio::net::TcpListener;

    use super::*;

    type Seen = Arc<Mutex<Vec<(String, Value)>>>;

    async fn spawn_registry() -> (Url, Seen) {
        let seen: Seen = Arc::default();

        let record = |action: &'static str| {
            move |State(seen): State<Seen>, Json(body): Json<Value>| async move {
                seen.lock().expect("seen lock").push((action.to_string(), body));
                AxumStatus::OK
            }
        };

        let app = Router::new()
            .route("/registry/register", post(record("register")))
            .route("/registry/deregister", post(record("deregister")))
            .route(
                "/registry/find/{name}",
                get(|Path(name): Path<String>| async move {
                    if name == "seo-svc" {
                        Ok(Json(json!({ "address": "http://10.0.0.5:8080" })))
                    } else {
                        Err(AxumStatus::NOT_FOUND)
                    }
                }),
            )
            .with_state(seen.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve registry");
        });

        let base = Url::parse(&format!("http://{addr}/registry")).expect("url");
        (base, seen)
    }

    #[tokio::test]
    async fn registers_and_deregisters_with_address() {
        let (base, seen) = spawn_registry().await;
        let discovery =
            HttpDiscovery::new(base, "seo-svc", "http://127.0.0.1:8080").expect("client");

        discovery.register().await.expect("register");
        discovery.deregister().await.expect("deregister");

        let seen = seen.lock().expect("seen lock").clone();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].0, "register");
        assert_eq!(
            seen[0].1,
            json!({ "name": "seo-svc", "address": "http://127.0.0.1:8080" })
        );
        assert_eq!(seen[1].0, "deregister");
    }

    #[tokio::test]
    async fn finds_registered_services() {
        let (base, _) = spawn_registry().await;
        let discovery = HttpDiscovery::new(base, "seo-svc", "http://127.0.0.1:8080").expect("client");

        assert_eq!(
            discovery
                .find_service_by_name("seo-svc")
                .await
                .expect("found"),
            "http://10.0.0.5:8080"
        );
        assert!(matches!(
            discovery.find_service_by_name("billing").await,
            Err(DiscoveryError::NotRegistered(_))
        ));
    }

    #[tokio::test]
    async fn unreachable_registry_is_not_fatal() {
        let base = Url::parse("http://127.0.0.1:9/").expect("url");
        let discovery = HttpDiscovery::new(base, "seo-svc", "http://127.0.0.1:8080").expect("client");

        assert!(discovery.register().await.is_err());
        register_best_effort(&discovery, "seo-svc").await;
        deregister_best_effort(&discovery, "seo-svc").await;
    }
}
