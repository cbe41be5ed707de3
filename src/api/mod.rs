//! HTTP surface: router assembly and server startup.

use crate::{
    auth::{origins, AuthConfig, AuthFactory, LogEmailSender, RequestScopedFactory},
    db::Database,
};
use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderName, HeaderValue, Method, Request,
    },
    routing::get,
    Extension, Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{info, info_span, Span};
use ulid::Ulid;
use utoipa_swagger_ui::SwaggerUi;

pub mod handlers;
mod openapi;

pub use openapi::openapi;

/// Build the application router.
///
/// Kept separate from `new` so tests can drive it with a mock factory and
/// a lazy pool.
#[must_use]
pub fn router(pool: PgPool, factory: Arc<dyn AuthFactory>, config: &AuthConfig) -> Router {
    let trusted = origins::trusted_origins(config.tier());
    let cors = CorsLayer::new()
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_methods([Method::GET, Method::POST])
        .allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _request_parts| {
                origin
                    .to_str()
                    .is_ok_and(|origin| origins::origin_allowed(&trusted, origin))
            },
        ))
        .allow_credentials(true);

    Router::new()
        .route("/health", get(handlers::health::health))
        .route(
            "/api/auth/*operation",
            get(handlers::auth_routes::forward).post(handlers::auth_routes::forward),
        )
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(cors)
                .layer(Extension(factory))
                .layer(Extension(pool)),
        )
}

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(port: u16, db: Database, config: AuthConfig) -> Result<()> {
    // Resolve the binding once at boot so a misconfigured deployment fails
    // fast instead of on the first request.
    let pool = db
        .handle()
        .await
        .context("Failed to prepare database pool")?;

    let factory: Arc<dyn AuthFactory> = Arc::new(RequestScopedFactory::new(
        db,
        config.clone(),
        Arc::new(LogEmailSender),
    ));

    let app = router(pool, factory, &config);

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Gracefully shutdown");
        })
        .await?;

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
