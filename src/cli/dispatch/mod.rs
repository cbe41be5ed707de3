//! Command-line argument dispatch.
//!
//! Maps validated CLI matches to the appropriate action: starting the API
//! server, rendering the schema offline, or pruning expired rows.

use crate::auth::Tier;
use crate::cli::{
    actions::{server, Action},
    globals::GlobalArgs,
};
use crate::db::Bindings;
use anyhow::{Context, Result};
use secrecy::SecretString;

/// Map validated CLI matches to an action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    match matches.subcommand() {
        Some(("schema", sub)) => Ok(Action::Schema {
            output: sub.get_one::<std::path::PathBuf>("output").cloned(),
        }),
        Some(("prune", _)) => Ok(Action::Prune(globals(matches)?)),
        _ => Ok(Action::Server(server::Args {
            port: matches.get_one::<u16>("port").copied().unwrap_or(8080),
            globals: globals(matches)?,
            otp_ttl_seconds: matches
                .get_one::<i64>("otp-ttl-seconds")
                .copied()
                .context("missing argument: --otp-ttl-seconds")?,
            otp_max_attempts: matches
                .get_one::<i32>("otp-max-attempts")
                .copied()
                .context("missing argument: --otp-max-attempts")?,
            resend_cooldown_seconds: matches
                .get_one::<i64>("resend-cooldown-seconds")
                .copied()
                .context("missing argument: --resend-cooldown-seconds")?,
            session_ttl_seconds: matches
                .get_one::<i64>("session-ttl-seconds")
                .copied()
                .context("missing argument: --session-ttl-seconds")?,
            rate_limit_window_seconds: matches
                .get_one::<u64>("rate-limit-window-seconds")
                .copied()
                .context("missing argument: --rate-limit-window-seconds")?,
            rate_limit_max_requests: matches
                .get_one::<u32>("rate-limit-max-requests")
                .copied()
                .context("missing argument: --rate-limit-max-requests")?,
        })),
    }
}

fn globals(matches: &clap::ArgMatches) -> Result<GlobalArgs> {
    let tier: Tier = matches
        .get_one::<String>("tier")
        .context("missing argument: --tier")?
        .parse()?;

    let binding = matches
        .get_one::<String>("db-binding")
        .cloned()
        .context("missing argument: --db-binding")?;
    let dsn = matches
        .get_one::<String>("dsn")
        .cloned()
        .map(SecretString::from);

    Ok(GlobalArgs::new(tier, Bindings::new(binding, dsn)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_invocation_maps_to_server() {
        temp_env::with_vars(
            [
                ("VARCO_PORT", None::<&str>),
                ("VARCO_DB_BINDING", None),
                ("VARCO_DSN", None),
                ("VARCO_TIER", None),
            ],
            || {
                let command = crate::cli::commands::new();
                let matches = command.get_matches_from(vec!["varco"]);
                let action = handler(&matches).expect("action");
                match action {
                    Action::Server(args) => {
                        assert_eq!(args.port, 8080);
                        assert_eq!(args.globals.tier, Tier::Local);
                        assert_eq!(args.globals.bindings.binding(), "HYPERDRIVE");
                        assert_eq!(args.otp_ttl_seconds, 300);
                        assert_eq!(args.rate_limit_max_requests, 10);
                    }
                    other => panic!("expected server action, got {other:?}"),
                }
            },
        );
    }

    #[test]
    fn schema_subcommand_maps_to_schema_action() {
        let command = crate::cli::commands::new();
        let matches = command.get_matches_from(vec!["varco", "schema"]);
        let action = handler(&matches).expect("action");
        assert!(matches!(action, Action::Schema { output: None }));
    }

    #[test]
    fn prune_subcommand_carries_globals() {
        temp_env::with_vars([("VARCO_TIER", Some("staging"))], || {
            let command = crate::cli::commands::new();
            let matches = command.get_matches_from(vec!["varco", "prune"]);
            let action = handler(&matches).expect("action");
            match action {
                Action::Prune(globals) => assert_eq!(globals.tier, Tier::Staging),
                other => panic!("expected prune action, got {other:?}"),
            }
        });
    }
}
