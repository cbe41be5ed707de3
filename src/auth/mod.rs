//! Auth engine: one-time-code login, sessions, and the two handler
//! construction paths.
//!
//! ## Construction Paths
//!
//! - **Per-request** (`RequestScopedFactory`): rebuilt on every inbound
//!   request from a fresh pool handle and that request's edge geolocation
//!   snapshot. Tracking and rate limiting on.
//! - **Per-process** (`process_handler`): constructed once behind a guarded
//!   one-shot cell for invocations with no request context. Tracking and
//!   rate limiting off.
//!
//! ## Storage Invariants
//!
//! Raw one-time codes and session tokens never touch the database; only
//! SHA-256 hashes are stored. Codes are single use, TTL-bounded, and
//! invalidated after too many wrong attempts.

pub mod config;
pub mod edge;
pub mod email;
pub mod handler;
pub mod instance;
pub mod options;
pub mod origins;
pub mod otp;
pub mod rate_limit;
pub mod schema;
mod session;
mod storage;
pub mod types;
mod utils;

pub use config::AuthConfig;
pub use edge::EdgeGeo;
pub use email::{EmailMessage, EmailSender, LogEmailSender};
pub use handler::{AuthHandler, ROUTE_PREFIX};
pub use instance::{process_handler, AuthFactory, RequestScopedFactory};
pub use options::AuthOptions;
pub use origins::{trusted_origins, OriginPattern, Tier};
pub use rate_limit::{FixedWindowLimiter, NoopRateLimiter, RateLimiter};
pub use types::{SendCodeRequest, SessionResponse, VerifyCodeRequest};
