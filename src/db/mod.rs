//! Database connector backed by a named environment binding.
//!
//! Managed edge platforms expose pooled Postgres through a named binding
//! (for example `HYPERDRIVE`) rather than a fixed `DATABASE_URL`. The
//! connector resolves that binding to a connection string, builds a lazily
//! connecting pool exactly once per process, and hands out cheap pool
//! clones after that. Resolution failures are configuration errors and
//! propagate uninterpreted: no retry, no fallback.

use anyhow::{anyhow, Context, Result};
use secrecy::{ExposeSecret, SecretString};
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    PgPool,
};
use std::{str::FromStr, sync::Arc, time::Duration};
use tokio::sync::OnceCell;

/// Where the connection string comes from: a named environment binding,
/// optionally overridden by an explicit value (local development).
#[derive(Clone)]
pub struct Bindings {
    binding: String,
    dsn: Option<SecretString>,
}

impl Bindings {
    #[must_use]
    pub fn new(binding: String, dsn: Option<SecretString>) -> Self {
        Self { binding, dsn }
    }

    #[must_use]
    pub fn binding(&self) -> &str {
        &self.binding
    }

    /// Resolve the connection string.
    ///
    /// # Errors
    /// Returns an error when the named binding is absent from the
    /// environment and no override was given.
    pub fn resolve(&self) -> Result<SecretString> {
        if let Some(dsn) = &self.dsn {
            return Ok(dsn.clone());
        }
        std::env::var(&self.binding)
            .map(SecretString::from)
            .map_err(|_| anyhow!("missing database binding: {}", self.binding))
    }
}

impl std::fmt::Debug for Bindings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bindings")
            .field("binding", &self.binding)
            .field("dsn", &self.dsn.as_ref().map(|_| "***"))
            .finish()
    }
}

#[derive(Debug)]
struct Inner {
    bindings: Bindings,
    pool: OnceCell<PgPool>,
}

/// Cheap-to-clone handle to the binding-resolved connection pool.
#[derive(Clone, Debug)]
pub struct Database {
    inner: Arc<Inner>,
}

impl Database {
    #[must_use]
    pub fn new(bindings: Bindings) -> Self {
        Self {
            inner: Arc::new(Inner {
                bindings,
                pool: OnceCell::new(),
            }),
        }
    }

    /// Return a pool handle, resolving the binding and building the pool on
    /// first use. Concurrent first callers block on one construction.
    /// Building the pool performs no network I/O; connections are opened on
    /// first acquire and pooled by the driver.
    ///
    /// # Errors
    /// Returns a configuration error when the binding is missing or the
    /// connection string does not parse.
    pub async fn handle(&self) -> Result<PgPool> {
        self.inner
            .pool
            .get_or_try_init(|| async {
                let dsn = self.inner.bindings.resolve()?;
                let options = PgConnectOptions::from_str(dsn.expose_secret()).with_context(
                    || format!("invalid connection string in binding {}", self.inner.bindings.binding()),
                )?;

                Ok(PgPoolOptions::new()
                    .min_connections(1)
                    .max_connections(5)
                    .max_lifetime(Duration::from_secs(60 * 2))
                    .test_before_acquire(true)
                    .connect_lazy_with(options))
            })
            .await
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lazy_bindings() -> Bindings {
        Bindings::new(
            "VARCO_TEST_UNSET_BINDING".to_string(),
            Some(SecretString::from(
                "postgres://postgres@localhost:5432/varco",
            )),
        )
    }

    #[test]
    fn resolve_prefers_override() {
        let bindings = lazy_bindings();
        let dsn = bindings.resolve().expect("override should resolve");
        assert_eq!(
            dsn.expose_secret(),
            "postgres://postgres@localhost:5432/varco"
        );
    }

    #[test]
    fn resolve_reads_named_binding() {
        temp_env::with_vars(
            [("VARCO_TEST_BINDING", Some("postgres://localhost/varco"))],
            || {
                let bindings = Bindings::new("VARCO_TEST_BINDING".to_string(), None);
                let dsn = bindings.resolve().expect("binding should resolve");
                assert_eq!(dsn.expose_secret(), "postgres://localhost/varco");
            },
        );
    }

    #[test]
    fn resolve_missing_binding_names_it() {
        let bindings = Bindings::new("VARCO_TEST_UNSET_BINDING".to_string(), None);
        let err = bindings.resolve().expect_err("should fail");
        assert!(err.to_string().contains("VARCO_TEST_UNSET_BINDING"));
    }

    #[test]
    fn debug_redacts_dsn() {
        let output = format!("{:?}", lazy_bindings());
        assert!(!output.contains("postgres://"));
        assert!(output.contains("***"));
    }

    #[tokio::test]
    async fn handle_is_idempotent() -> Result<()> {
        let db = Database::new(lazy_bindings());
        let first = db.handle().await?;
        let second = db.handle().await?;
        // Lazy pool: building it opens no connections, and repeated calls
        // reuse the one pool instead of constructing new ones.
        assert!(!first.is_closed());
        first.close().await;
        assert!(second.is_closed());
        Ok(())
    }

    #[tokio::test]
    async fn handle_invalid_dsn_is_configuration_error() {
        let db = Database::new(Bindings::new(
            "X".to_string(),
            Some(SecretString::from("not-a-connection-string")),
        ));
        let err = db.handle().await.expect_err("should fail");
        assert!(err.to_string().contains("invalid connection string"));
    }
}
