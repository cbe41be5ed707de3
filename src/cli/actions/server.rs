use crate::{api, auth::AuthConfig, cli::globals::GlobalArgs, db::Database};
use anyhow::Result;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub globals: GlobalArgs,
    pub otp_ttl_seconds: i64,
    pub otp_max_attempts: i32,
    pub resend_cooldown_seconds: i64,
    pub session_ttl_seconds: i64,
    pub rate_limit_window_seconds: u64,
    pub rate_limit_max_requests: u32,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the database binding cannot be resolved or the
/// server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let config = AuthConfig::new(args.globals.tier)
        .with_otp_ttl_seconds(args.otp_ttl_seconds)
        .with_otp_max_attempts(args.otp_max_attempts)
        .with_resend_cooldown_seconds(args.resend_cooldown_seconds)
        .with_session_ttl_seconds(args.session_ttl_seconds)
        .with_rate_limit_window_seconds(args.rate_limit_window_seconds)
        .with_rate_limit_max_requests(args.rate_limit_max_requests);

    let db = Database::new(args.globals.bindings);

    api::new(args.port, db, config).await
}
