//! Route adapter for the auth mount point.
//!
//! Every supported verb funnels through `forward`: obtain a handler from
//! the per-request factory, delegate the raw request, and return the
//! response untouched apart from disabling response caching. No
//! verb-specific logic lives here.

use axum::{
    extract::Request,
    http::{header::CACHE_CONTROL, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Extension,
};
use std::sync::Arc;
use tracing::error;

use crate::auth::AuthFactory;

pub async fn forward(
    Extension(factory): Extension<Arc<dyn AuthFactory>>,
    req: Request,
) -> Response {
    // A new handler for this request; never reused across requests.
    let mut response = match factory.for_request(req.headers()).await {
        Ok(auth) => auth.handle(req).await,
        Err(err) => {
            // Configuration errors are not interpreted here; surface the
            // platform default error response.
            error!("Failed to construct auth handler: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Service misconfigured".to_string(),
            )
                .into_response()
        }
    };

    // Handler responses are caller- and session-specific.
    response
        .headers_mut()
        .insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}
