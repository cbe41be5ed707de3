//! The two handler construction paths.
//!
//! Per-request: a brand-new handler for every inbound request, built from
//! that request's edge metadata and a fresh pool handle. Reusing one
//! handler across requests would leak one caller's geolocation into
//! another caller's session tagging and rate-limit bucketing, so nothing
//! on this path is cached.
//!
//! Per-process: a single relaxed handler for invocations that have no
//! request context. First-use races are guarded; concurrent first callers
//! block on one construction instead of racing it.

use anyhow::Result;
use async_trait::async_trait;
use axum::http::HeaderMap;
use std::{sync::Arc, time::Duration};
use tokio::sync::OnceCell;

use super::{
    config::AuthConfig,
    edge::edge_geo,
    email::{EmailSender, LogEmailSender},
    handler::AuthHandler,
    options::AuthOptions,
    rate_limit::{FixedWindowLimiter, NoopRateLimiter},
};
use crate::db::Database;

/// Builds the handler that serves a single request.
///
/// The seam exists so the route adapter can be exercised with a mock
/// factory; the production implementation is `RequestScopedFactory`.
#[async_trait]
pub trait AuthFactory: Send + Sync {
    async fn for_request(&self, headers: &HeaderMap) -> Result<Arc<AuthHandler>>;
}

/// Production factory: fresh handler per request, strict configuration.
pub struct RequestScopedFactory {
    db: Database,
    config: AuthConfig,
    rate_limiter: Arc<FixedWindowLimiter>,
    email_sender: Arc<dyn EmailSender>,
}

impl RequestScopedFactory {
    #[must_use]
    pub fn new(db: Database, config: AuthConfig, email_sender: Arc<dyn EmailSender>) -> Self {
        // Bucket state outlives individual handlers; only the enabled flag
        // is request-scoped.
        let rate_limiter = Arc::new(FixedWindowLimiter::new(
            Duration::from_secs(config.rate_limit_window_seconds()),
            config.rate_limit_max_requests(),
        ));
        Self {
            db,
            config,
            rate_limiter,
            email_sender,
        }
    }
}

#[async_trait]
impl AuthFactory for RequestScopedFactory {
    async fn for_request(&self, headers: &HeaderMap) -> Result<Arc<AuthHandler>> {
        let pool = self.db.handle().await?;
        let options = AuthOptions::for_request(self.config.tier(), edge_geo(headers));
        Ok(Arc::new(AuthHandler::new(
            pool,
            options,
            self.config.clone(),
            self.rate_limiter.clone(),
            self.email_sender.clone(),
        )))
    }
}

static PROCESS_HANDLER: OnceCell<Arc<AuthHandler>> = OnceCell::const_new();

/// Return the process-wide handler, constructing it on first use.
///
/// Later calls return the same instance and ignore their arguments; a
/// failed construction is not cached, so the next caller retries.
///
/// # Errors
/// Returns a configuration error when the database binding cannot be
/// resolved during the first construction.
pub async fn process_handler(db: &Database, config: &AuthConfig) -> Result<Arc<AuthHandler>> {
    PROCESS_HANDLER
        .get_or_try_init(|| async {
            let pool = db.handle().await?;
            let options = AuthOptions::for_process(config.tier());
            Ok(Arc::new(AuthHandler::new(
                pool,
                options,
                config.clone(),
                Arc::new(NoopRateLimiter),
                Arc::new(LogEmailSender),
            )))
        })
        .await
        .map(Arc::clone)
}
