//! Router-level tests: every verb on the auth mount point goes through a
//! freshly constructed per-request handler, and responses are marked
//! uncacheable.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, HeaderMap, Request, StatusCode},
};
use sqlx::postgres::PgPoolOptions;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};
use tower::ServiceExt;
use varco::auth::{
    AuthConfig, AuthFactory, AuthHandler, AuthOptions, LogEmailSender, NoopRateLimiter, Tier,
};

/// Counts constructions and remembers every handler it built, so tests can
/// prove the adapter never reuses one.
struct CountingFactory {
    constructions: AtomicUsize,
    handlers: Mutex<Vec<Arc<AuthHandler>>>,
}

impl CountingFactory {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            constructions: AtomicUsize::new(0),
            handlers: Mutex::new(Vec::new()),
        })
    }

    fn count(&self) -> usize {
        self.constructions.load(Ordering::SeqCst)
    }

    fn all_distinct(&self) -> bool {
        let handlers = self.handlers.lock().expect("lock");
        for (i, a) in handlers.iter().enumerate() {
            for b in handlers.iter().skip(i + 1) {
                if Arc::ptr_eq(a, b) {
                    return false;
                }
            }
        }
        true
    }
}

#[async_trait]
impl AuthFactory for CountingFactory {
    async fn for_request(&self, headers: &HeaderMap) -> Result<Arc<AuthHandler>> {
        self.constructions.fetch_add(1, Ordering::SeqCst);
        let pool = PgPoolOptions::new().connect_lazy("postgres://postgres@localhost/varco")?;
        let options = AuthOptions::for_request(Tier::Local, varco::auth::edge::edge_geo(headers));
        let handler = Arc::new(AuthHandler::new(
            pool,
            options,
            AuthConfig::new(Tier::Local),
            Arc::new(NoopRateLimiter),
            Arc::new(LogEmailSender),
        ));
        self.handlers.lock().expect("lock").push(handler.clone());
        Ok(handler)
    }
}

/// Always fails, standing in for an unresolvable database binding.
struct BrokenFactory;

#[async_trait]
impl AuthFactory for BrokenFactory {
    async fn for_request(&self, _headers: &HeaderMap) -> Result<Arc<AuthHandler>> {
        Err(anyhow!("missing database binding: HYPERDRIVE"))
    }
}

fn app(factory: Arc<dyn AuthFactory>) -> Result<axum::Router> {
    let pool = PgPoolOptions::new().connect_lazy("postgres://postgres@localhost/varco")?;
    Ok(varco::api::router(
        pool,
        factory,
        &AuthConfig::new(Tier::Local),
    ))
}

#[tokio::test]
async fn both_verbs_construct_a_fresh_handler() -> Result<()> {
    let factory = CountingFactory::new();
    let app = app(factory.clone())?;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/auth/get-session")
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(factory.count(), 1);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/send-code")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"email":"not-an-email"}"#))?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(factory.count(), 2);
    assert!(factory.all_distinct());

    Ok(())
}

#[tokio::test]
async fn auth_responses_are_never_cacheable() -> Result<()> {
    let factory = CountingFactory::new();
    let app = app(factory)?;

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/auth/get-session")
                .body(Body::empty())?,
        )
        .await?;

    assert_eq!(
        response
            .headers()
            .get(header::CACHE_CONTROL)
            .and_then(|value| value.to_str().ok()),
        Some("no-store")
    );
    Ok(())
}

#[tokio::test]
async fn factory_failure_surfaces_as_server_error() -> Result<()> {
    let app = app(Arc::new(BrokenFactory))?;

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/auth/get-session")
                .body(Body::empty())?,
        )
        .await?;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    Ok(())
}

#[tokio::test]
async fn cors_allows_only_trusted_origins() -> Result<()> {
    let factory = CountingFactory::new();
    let app = app(factory)?;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/auth/get-session")
                .header(header::ORIGIN, "http://localhost:3000")
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|value| value.to_str().ok()),
        Some("http://localhost:3000")
    );

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/auth/get-session")
                .header(header::ORIGIN, "https://evil.dev")
                .body(Body::empty())?,
        )
        .await?;
    assert!(response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());

    Ok(())
}

#[tokio::test]
async fn edge_headers_reach_the_per_request_options() -> Result<()> {
    let factory = CountingFactory::new();
    let app = app(factory.clone())?;

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/auth/get-session")
                .header("x-edge-colo", "MXP")
                .header("x-edge-country", "IT")
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let handlers = factory.handlers.lock().expect("lock");
    let geo = handlers[0].options().edge_geo.clone().expect("snapshot");
    assert_eq!(geo.colo.as_deref(), Some("MXP"));
    assert_eq!(geo.country.as_deref(), Some("IT"));
    Ok(())
}
