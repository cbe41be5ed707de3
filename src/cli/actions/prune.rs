use crate::{
    auth::{process_handler, AuthConfig},
    cli::globals::GlobalArgs,
    db::Database,
};
use anyhow::Result;
use tracing::info;

/// Delete expired one-time codes and sessions.
///
/// A CLI invocation has no request context, so this goes through the
/// process-wide handler rather than the per-request path.
///
/// # Errors
/// Returns an error when the binding cannot be resolved or the database is
/// unreachable.
pub async fn execute(globals: &GlobalArgs) -> Result<()> {
    let db = Database::new(globals.bindings.clone());
    let config = AuthConfig::new(globals.tier);

    let handler = process_handler(&db, &config).await?;
    let (codes, sessions) = handler.prune_expired().await?;

    info!("Pruned {codes} expired codes and {sessions} expired sessions");

    Ok(())
}
