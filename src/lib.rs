//! # Varco (Edge-Aware OTP Authentication)
//!
//! `varco` is an email one-time-code authentication service designed for
//! edge deployments. Users sign in by requesting a 6-digit code sent to
//! their address and exchanging it for an `HttpOnly` session cookie.
//!
//! ## Request-Scoped Construction
//!
//! The handler serving `/api/auth/*` is rebuilt on **every** request: it
//! takes a fresh database handle and the caller's edge geolocation snapshot
//! as explicit inputs, with IP/geolocation tracking and rate limiting
//! enabled. A process-wide instance (geolocation and rate limiting off)
//! exists only for CLI-style invocations where no request context exists,
//! such as `varco prune`.
//!
//! ## Database Binding
//!
//! The Postgres connection string is resolved from a named environment
//! binding (default `HYPERDRIVE`), the way managed edge platforms expose
//! pooled connections. A missing or invalid binding is a fatal
//! configuration error; it is never retried or interpreted.

pub mod api;
pub mod auth;
pub mod cli;
pub mod client;
pub mod db;
pub mod login;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
