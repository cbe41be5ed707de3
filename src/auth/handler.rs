//! The auth handler: one instance per construction, owning the routing
//! table for every operation under the auth mount point.

use anyhow::Result;
use axum::{
    body::{to_bytes, Body},
    http::{header::SET_COOKIE, HeaderMap, Method, Request, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;

use super::{
    config::AuthConfig,
    edge::{extract_client_ip, ClientInfo},
    email::{EmailMessage, EmailSender},
    options::AuthOptions,
    otp::{generate_code, hash_code, valid_code},
    rate_limit::{RateLimitAction, RateLimitDecision, RateLimiter},
    session::{
        clear_session_cookie, extract_session_token, generate_session_token, hash_session_token,
        session_cookie,
    },
    storage,
    storage::{CodeOutcome, SendOutcome},
    types::{SendCodeRequest, SessionResponse, VerifyCodeRequest},
    utils::{normalize_email, valid_email},
};

/// Mount point the route adapter forwards from.
pub const ROUTE_PREFIX: &str = "/api/auth";

const MAX_BODY_BYTES: usize = 64 * 1024;
const EMAIL_TEMPLATE_LOGIN_CODE: &str = "login-code";

/// A fully configured auth handler. Construction is a pure function of its
/// inputs; nothing here reads ambient request state.
pub struct AuthHandler {
    pool: PgPool,
    options: AuthOptions,
    config: AuthConfig,
    rate_limiter: Arc<dyn RateLimiter>,
    email_sender: Arc<dyn EmailSender>,
}

impl AuthHandler {
    #[must_use]
    pub fn new(
        pool: PgPool,
        options: AuthOptions,
        config: AuthConfig,
        rate_limiter: Arc<dyn RateLimiter>,
        email_sender: Arc<dyn EmailSender>,
    ) -> Self {
        Self {
            pool,
            options,
            config,
            rate_limiter,
            email_sender,
        }
    }

    #[must_use]
    pub fn options(&self) -> &AuthOptions {
        &self.options
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Route a raw request to the matching operation.
    pub async fn handle(&self, req: Request<Body>) -> Response {
        let method = req.method().clone();
        let path = req.uri().path().to_string();
        let operation = path
            .strip_prefix(ROUTE_PREFIX)
            .unwrap_or(path.as_str())
            .trim_end_matches('/');
        let headers = req.headers().clone();

        match operation {
            "/send-code" if method == Method::POST => self.send_code(&headers, req).await,
            "/verify-code" if method == Method::POST => self.verify_code(&headers, req).await,
            "/get-session" if method == Method::GET => self.get_session(&headers).await,
            "/sign-out" if method == Method::POST => self.sign_out(&headers).await,
            _ => (StatusCode::NOT_FOUND, "Unknown auth operation".to_string()).into_response(),
        }
    }

    async fn send_code(&self, headers: &HeaderMap, req: Request<Body>) -> Response {
        let request: SendCodeRequest = match read_json(req).await {
            Ok(request) => request,
            Err(response) => return response,
        };

        let email = normalize_email(&request.email);
        if !valid_email(&email) {
            return (StatusCode::BAD_REQUEST, "Invalid email address".to_string()).into_response();
        }

        if self.rate_limited(headers, &email, RateLimitAction::SendCode) {
            return (StatusCode::TOO_MANY_REQUESTS, "Rate limited".to_string()).into_response();
        }

        // Generate the raw code for delivery; only its hash is stored.
        let code = generate_code();
        let code_hash = hash_code(&email, &code);

        match storage::insert_login_code(&self.pool, &email, &code_hash, &self.config).await {
            Ok(SendOutcome::Queued) => {}
            Ok(SendOutcome::Cooldown) => {
                return (
                    StatusCode::TOO_MANY_REQUESTS,
                    "Please wait before requesting a new code".to_string(),
                )
                    .into_response();
            }
            Err(err) => {
                error!("Failed to store login code: {err}");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to send code".to_string(),
                )
                    .into_response();
            }
        }

        let message = EmailMessage {
            to_email: email.clone(),
            template: EMAIL_TEMPLATE_LOGIN_CODE.to_string(),
            payload_json: json!({ "email": email, "code": code }).to_string(),
        };
        if let Err(err) = self.email_sender.send(&message) {
            error!("Failed to send login code: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to send code".to_string(),
            )
                .into_response();
        }

        StatusCode::NO_CONTENT.into_response()
    }

    async fn verify_code(&self, headers: &HeaderMap, req: Request<Body>) -> Response {
        let request: VerifyCodeRequest = match read_json(req).await {
            Ok(request) => request,
            Err(response) => return response,
        };

        let email = normalize_email(&request.email);
        let code = request.code.trim();
        if !valid_email(&email) {
            return (StatusCode::BAD_REQUEST, "Invalid email address".to_string()).into_response();
        }
        if !valid_code(code) {
            return (StatusCode::BAD_REQUEST, "Invalid code".to_string()).into_response();
        }

        if self.rate_limited(headers, &email, RateLimitAction::VerifyCode) {
            return (StatusCode::TOO_MANY_REQUESTS, "Rate limited".to_string()).into_response();
        }

        let code_hash = hash_code(&email, code);
        match storage::consume_login_code(&self.pool, &email, &code_hash, &self.config).await {
            Ok(CodeOutcome::Verified) => {}
            Ok(CodeOutcome::Invalid) => {
                return (
                    StatusCode::BAD_REQUEST,
                    "Invalid or expired code".to_string(),
                )
                    .into_response();
            }
            Err(err) => {
                error!("Failed to verify login code: {err}");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Verification failed".to_string(),
                )
                    .into_response();
            }
        }

        let user_id = match storage::upsert_user(&self.pool, &email).await {
            Ok(user_id) => user_id,
            Err(err) => {
                error!("Failed to upsert user: {err}");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Verification failed".to_string(),
                )
                    .into_response();
            }
        };

        let token = match generate_session_token() {
            Ok(token) => token,
            Err(err) => {
                error!("Failed to generate session token: {err}");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Verification failed".to_string(),
                )
                    .into_response();
            }
        };
        let token_hash = hash_session_token(&token);

        let client = self.client_info(headers);
        if let Err(err) =
            storage::create_session(&self.pool, user_id, &token_hash, &self.config, &client).await
        {
            error!("Failed to create session: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Verification failed".to_string(),
            )
                .into_response();
        }

        let mut response_headers = HeaderMap::new();
        match session_cookie(&self.config, &token) {
            Ok(cookie) => {
                response_headers.insert(SET_COOKIE, cookie);
            }
            Err(err) => {
                error!("Failed to build session cookie: {err}");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Verification failed".to_string(),
                )
                    .into_response();
            }
        }

        let response = SessionResponse {
            user_id: user_id.to_string(),
            email,
        };
        (StatusCode::OK, response_headers, Json(response)).into_response()
    }

    async fn get_session(&self, headers: &HeaderMap) -> Response {
        // Missing cookies are treated as "no session" to avoid leaking auth state.
        let Some(token) = extract_session_token(headers) else {
            return StatusCode::NO_CONTENT.into_response();
        };
        let token_hash = hash_session_token(&token);
        match storage::lookup_session(&self.pool, &token_hash).await {
            Ok(Some(record)) => {
                let response = SessionResponse {
                    user_id: record.user_id.to_string(),
                    email: record.email,
                };
                (StatusCode::OK, Json(response)).into_response()
            }
            Ok(None) => StatusCode::NO_CONTENT.into_response(),
            Err(err) => {
                error!("Failed to lookup session: {err}");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }

    async fn sign_out(&self, headers: &HeaderMap) -> Response {
        if let Some(token) = extract_session_token(headers) {
            let token_hash = hash_session_token(&token);
            if let Err(err) = storage::delete_session(&self.pool, &token_hash).await {
                error!("Failed to delete session: {err}");
            }
        }

        // Always clear the cookie, even if the session record was missing.
        let mut response_headers = HeaderMap::new();
        if let Ok(cookie) = clear_session_cookie(&self.config) {
            response_headers.insert(SET_COOKIE, cookie);
        }
        (StatusCode::NO_CONTENT, response_headers).into_response()
    }

    /// Remove expired codes and sessions. Returns (codes, sessions) deleted.
    ///
    /// # Errors
    /// Returns an error when the database is unreachable.
    pub async fn prune_expired(&self) -> Result<(u64, u64)> {
        storage::prune_expired(&self.pool).await
    }

    fn rate_limited(&self, headers: &HeaderMap, email: &str, action: RateLimitAction) -> bool {
        if !self.options.rate_limit_enabled {
            return false;
        }
        let ip = extract_client_ip(headers);
        if self.rate_limiter.check_ip(ip.as_deref(), action) == RateLimitDecision::Limited {
            return true;
        }
        self.rate_limiter.check_email(email, action) == RateLimitDecision::Limited
    }

    fn client_info(&self, headers: &HeaderMap) -> ClientInfo {
        ClientInfo {
            ip: if self.options.ip_tracking {
                extract_client_ip(headers)
            } else {
                None
            },
            geo: if self.options.geolocation_tracking {
                self.options.edge_geo.clone()
            } else {
                None
            },
        }
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(req: Request<Body>) -> Result<T, Response> {
    let bytes = to_bytes(req.into_body(), MAX_BODY_BYTES)
        .await
        .map_err(|_| (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response())?;
    if bytes.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response());
    }
    serde_json::from_slice(&bytes)
        .map_err(|_| (StatusCode::BAD_REQUEST, "Invalid payload".to_string()).into_response())
}
