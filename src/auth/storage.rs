//! Database helpers for one-time codes, users, and sessions.

use anyhow::{Context, Result};
use sqlx::{PgPool, Row};
use tracing::Instrument;
use uuid::Uuid;

use super::{config::AuthConfig, edge::ClientInfo};

/// Outcome when storing a new one-time code.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum SendOutcome {
    Queued,
    Cooldown,
}

/// Outcome when consuming a one-time code.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum CodeOutcome {
    Verified,
    Invalid,
}

/// Minimal data returned for a valid session token.
pub(crate) struct SessionRecord {
    pub(crate) user_id: Uuid,
    pub(crate) email: String,
}

/// Store a fresh code hash for the address, replacing any earlier code.
/// Enforces the resend cooldown so an address cannot be flooded.
pub(crate) async fn insert_login_code(
    pool: &PgPool,
    email: &str,
    code_hash: &[u8],
    config: &AuthConfig,
) -> Result<SendOutcome> {
    let mut tx = pool.begin().await.context("begin send-code transaction")?;

    let query = r"
        SELECT EXISTS (
            SELECT 1 FROM login_codes
            WHERE email = $1
              AND created_at > NOW() - ($2 * INTERVAL '1 second')
        ) AS recent
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let recent: bool = sqlx::query(query)
        .bind(email)
        .bind(config.resend_cooldown_seconds())
        .fetch_one(&mut *tx)
        .instrument(span)
        .await
        .context("failed to check resend cooldown")?
        .get("recent");

    if recent {
        let _ = tx.rollback().await;
        return Ok(SendOutcome::Cooldown);
    }

    // One active code per address: drop earlier codes before inserting.
    let query = "DELETE FROM login_codes WHERE email = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(email)
        .execute(&mut *tx)
        .instrument(span)
        .await
        .context("failed to clear earlier codes")?;

    let query = r"
        INSERT INTO login_codes
            (email, code_hash, expires_at)
        VALUES ($1, $2, NOW() + ($3 * INTERVAL '1 second'))
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    sqlx::query(query)
        .bind(email)
        .bind(code_hash)
        .bind(config.otp_ttl_seconds())
        .execute(&mut *tx)
        .instrument(span)
        .await
        .context("failed to insert login code")?;

    tx.commit().await.context("commit send-code transaction")?;

    Ok(SendOutcome::Queued)
}

/// Consume the active code for the address: single use, TTL-bounded, and
/// invalidated after too many wrong attempts.
pub(crate) async fn consume_login_code(
    pool: &PgPool,
    email: &str,
    code_hash: &[u8],
    config: &AuthConfig,
) -> Result<CodeOutcome> {
    let mut tx = pool
        .begin()
        .await
        .context("begin verify-code transaction")?;

    let query = r"
        SELECT id, code_hash, attempts
        FROM login_codes
        WHERE email = $1
          AND expires_at > NOW()
        ORDER BY created_at DESC
        LIMIT 1
        FOR UPDATE
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(email)
        .fetch_optional(&mut *tx)
        .instrument(span)
        .await
        .context("failed to load login code")?;

    let Some(row) = row else {
        let _ = tx.rollback().await;
        return Ok(CodeOutcome::Invalid);
    };

    let id: Uuid = row.get("id");
    let stored_hash: Vec<u8> = row.get("code_hash");
    let attempts: i32 = row.get("attempts");

    if stored_hash == code_hash {
        let query = "DELETE FROM login_codes WHERE id = $1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "DELETE",
            db.statement = query
        );
        sqlx::query(query)
            .bind(id)
            .execute(&mut *tx)
            .instrument(span)
            .await
            .context("failed to consume login code")?;
        tx.commit().await.context("commit verify-code transaction")?;
        return Ok(CodeOutcome::Verified);
    }

    // Wrong code: count the attempt, invalidating the code at the limit.
    if attempts + 1 >= config.otp_max_attempts() {
        let query = "DELETE FROM login_codes WHERE id = $1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "DELETE",
            db.statement = query
        );
        sqlx::query(query)
            .bind(id)
            .execute(&mut *tx)
            .instrument(span)
            .await
            .context("failed to invalidate login code")?;
    } else {
        let query = "UPDATE login_codes SET attempts = attempts + 1 WHERE id = $1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        sqlx::query(query)
            .bind(id)
            .execute(&mut *tx)
            .instrument(span)
            .await
            .context("failed to count failed attempt")?;
    }

    tx.commit().await.context("commit verify-code transaction")?;

    Ok(CodeOutcome::Invalid)
}

/// OTP sign-in creates the account on first verification and marks the
/// address verified on every later one.
pub(crate) async fn upsert_user(pool: &PgPool, email: &str) -> Result<Uuid> {
    let query = r"
        INSERT INTO users (email, email_verified)
        VALUES ($1, TRUE)
        ON CONFLICT (email) DO UPDATE SET email_verified = TRUE
        RETURNING id
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(email)
        .fetch_one(pool)
        .instrument(span)
        .await
        .context("failed to upsert user")?;

    Ok(row.get("id"))
}

/// Store a session hash, geo-tagged with whatever the tracking flags allowed.
pub(crate) async fn create_session(
    pool: &PgPool,
    user_id: Uuid,
    token_hash: &[u8],
    config: &AuthConfig,
    client: &ClientInfo,
) -> Result<()> {
    let geo = client.geo.as_ref();
    let query = r"
        INSERT INTO sessions
            (user_id, token_hash, ip_address,
             timezone, city, country, region, region_code, colo, latitude, longitude,
             expires_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11,
                NOW() + ($12 * INTERVAL '1 second'))
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    sqlx::query(query)
        .bind(user_id)
        .bind(token_hash)
        .bind(client.ip.as_deref())
        .bind(geo.and_then(|geo| geo.timezone.as_deref()))
        .bind(geo.and_then(|geo| geo.city.as_deref()))
        .bind(geo.and_then(|geo| geo.country.as_deref()))
        .bind(geo.and_then(|geo| geo.region.as_deref()))
        .bind(geo.and_then(|geo| geo.region_code.as_deref()))
        .bind(geo.and_then(|geo| geo.colo.as_deref()))
        .bind(geo.and_then(|geo| geo.latitude.as_deref()))
        .bind(geo.and_then(|geo| geo.longitude.as_deref()))
        .bind(config.session_ttl_seconds())
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to create session")?;

    Ok(())
}

/// Look up a live session by token hash.
pub(crate) async fn lookup_session(
    pool: &PgPool,
    token_hash: &[u8],
) -> Result<Option<SessionRecord>> {
    let query = r"
        SELECT u.id, u.email
        FROM sessions s
        JOIN users u ON u.id = s.user_id
        WHERE s.token_hash = $1
          AND s.expires_at > NOW()
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(token_hash)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup session")?;

    Ok(row.map(|row| SessionRecord {
        user_id: row.get("id"),
        email: row.get("email"),
    }))
}

/// Delete a session by token hash (sign-out).
pub(crate) async fn delete_session(pool: &PgPool, token_hash: &[u8]) -> Result<()> {
    let query = "DELETE FROM sessions WHERE token_hash = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(token_hash)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to delete session")?;

    Ok(())
}

/// Remove expired codes and sessions. Returns (codes, sessions) deleted.
pub(crate) async fn prune_expired(pool: &PgPool) -> Result<(u64, u64)> {
    let query = "DELETE FROM login_codes WHERE expires_at <= NOW()";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    let codes = sqlx::query(query)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to prune login codes")?
        .rows_affected();

    let query = "DELETE FROM sessions WHERE expires_at <= NOW()";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    let sessions = sqlx::query(query)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to prune sessions")?
        .rows_affected();

    Ok((codes, sessions))
}
