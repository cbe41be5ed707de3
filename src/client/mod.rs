//! Client wrappers for the auth API endpoints. These helpers centralize
//! request plumbing and keep cookie-based session handling consistent, so
//! UI code never touches tokens directly.

use crate::auth::{SendCodeRequest, SessionResponse, VerifyCodeRequest, ROUTE_PREFIX};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;
use url::Url;

/// Errors surfaced to UI code.
///
/// `Operation` carries a user-visible message reported by the service;
/// `Transport` is anything unexpected and is converted to a generic
/// message at the UI boundary.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("{0}")]
    Operation(String),
    #[error("request failed: {0}")]
    Transport(String),
}

/// Non-sensitive session metadata for the signed-in user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionState {
    pub user_id: String,
    pub email: String,
}

/// The client-facing auth operations, abstracted so flows can be tested
/// without a running service.
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn send_one_time_code(&self, email: &str) -> Result<(), ApiError>;
    async fn verify_one_time_code(&self, email: &str, code: &str) -> Result<(), ApiError>;
    async fn session_state(&self) -> Result<Option<SessionState>, ApiError>;
    async fn sign_out(&self) -> Result<(), ApiError>;
}

/// HTTP implementation over the service's auth mount point.
pub struct AuthClient {
    base_url: String,
    client: reqwest::Client,
}

impl AuthClient {
    /// Build a client for the service at `base_url`.
    ///
    /// The cookie store is enabled so the `HttpOnly` session cookie set by
    /// verification rides along on later calls.
    ///
    /// # Errors
    /// Returns an error when `base_url` is not a valid URL or the
    /// underlying HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into();
        Url::parse(&base_url).with_context(|| format!("invalid base URL: {base_url}"))?;
        let client = reqwest::Client::builder()
            .user_agent(crate::APP_USER_AGENT)
            .cookie_store(true)
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub(crate) fn url(&self, operation: &str) -> String {
        format!("{}{ROUTE_PREFIX}{operation}", self.base_url)
    }
}

async fn operation_error(response: reqwest::Response, fallback: &str) -> ApiError {
    let message = response.text().await.unwrap_or_default();
    let message = message.trim();
    if message.is_empty() {
        ApiError::Operation(fallback.to_string())
    } else {
        ApiError::Operation(message.to_string())
    }
}

#[async_trait]
impl AuthApi for AuthClient {
    async fn send_one_time_code(&self, email: &str) -> Result<(), ApiError> {
        let request = SendCodeRequest {
            email: email.to_string(),
        };
        let response = self
            .client
            .post(self.url("/send-code"))
            .json(&request)
            .send()
            .await
            .map_err(|err| ApiError::Transport(err.to_string()))?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(operation_error(response, "Failed to send code").await)
        }
    }

    async fn verify_one_time_code(&self, email: &str, code: &str) -> Result<(), ApiError> {
        let request = VerifyCodeRequest {
            email: email.to_string(),
            code: code.to_string(),
        };
        let response = self
            .client
            .post(self.url("/verify-code"))
            .json(&request)
            .send()
            .await
            .map_err(|err| ApiError::Transport(err.to_string()))?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(operation_error(response, "Invalid or expired code").await)
        }
    }

    async fn session_state(&self) -> Result<Option<SessionState>, ApiError> {
        let response = self
            .client
            .get(self.url("/get-session"))
            .send()
            .await
            .map_err(|err| ApiError::Transport(err.to_string()))?;
        match response.status() {
            StatusCode::NO_CONTENT => Ok(None),
            status if status.is_success() => {
                let session: SessionResponse = response
                    .json()
                    .await
                    .map_err(|err| ApiError::Transport(err.to_string()))?;
                Ok(Some(SessionState {
                    user_id: session.user_id,
                    email: session.email,
                }))
            }
            _ => Err(operation_error(response, "Failed to load session").await),
        }
    }

    async fn sign_out(&self) -> Result<(), ApiError> {
        let response = self
            .client
            .post(self.url("/sign-out"))
            .send()
            .await
            .map_err(|err| ApiError::Transport(err.to_string()))?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(operation_error(response, "Failed to sign out").await)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_join_base_and_operation() -> Result<()> {
        let client = AuthClient::new("http://localhost:8080/")?;
        assert_eq!(
            client.url("/send-code"),
            "http://localhost:8080/api/auth/send-code"
        );
        assert_eq!(
            client.url("/get-session"),
            "http://localhost:8080/api/auth/get-session"
        );
        Ok(())
    }

    #[test]
    fn rejects_unparsable_base_url() {
        assert!(AuthClient::new("not a url").is_err());
    }

    #[test]
    fn operation_error_displays_its_message() {
        let err = ApiError::Operation("Invalid or expired code".to_string());
        assert_eq!(err.to_string(), "Invalid or expired code");

        let err = ApiError::Transport("connection refused".to_string());
        assert!(err.to_string().contains("connection refused"));
    }
}
