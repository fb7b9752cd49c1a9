use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

const MEMORY_DATABASE_URL: &str = "sqlite::memory:";

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

/// The persisted bearer token together with its validity window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCredentialToken {
    pub token: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl StoredCredentialToken {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        // Every connection to an in-memory database sees its own empty schema.
        let max_connections = if database_url == MEMORY_DATABASE_URL {
            1
        } else {
            5
        };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(connect_options)
            .await
            .with_context(|| format!("failed to open token database '{database_url}'"))?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("failed to apply token database migrations")?;
        Ok(Self { pool })
    }

    /// Replaces whatever token is stored with `token`.
    pub async fn save_credential_token(
        &self,
        token: &str,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO credential_token (slot, token, issued_at, expires_at)
            VALUES (1, ?1, ?2, ?3)
            ON CONFLICT(slot) DO UPDATE SET
                token = excluded.token,
                issued_at = excluded.issued_at,
                expires_at = excluded.expires_at
            "#,
        )
        .bind(token)
        .bind(issued_at)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .context("failed to save credential token")?;
        Ok(())
    }

    /// Returns the stored token regardless of expiry.
    pub async fn load_credential_token(&self) -> Result<Option<StoredCredentialToken>> {
        let row = sqlx::query(
            "SELECT token, issued_at, expires_at FROM credential_token WHERE slot = 1",
        )
        .fetch_optional(&self.pool)
        .await
        .context("failed to load credential token")?;

        row.map(|row| -> Result<StoredCredentialToken> {
            Ok(StoredCredentialToken {
                token: row.try_get("token")?,
                issued_at: row.try_get("issued_at")?,
                expires_at: row.try_get("expires_at")?,
            })
        })
        .transpose()
    }

    /// Returns the stored token if it is still valid at `now`.
    ///
    /// An expired token is deleted as a side effect so later reads observe an
    /// empty slot.
    pub async fn load_unexpired_credential_token(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Option<StoredCredentialToken>> {
        let Some(stored) = self.load_credential_token().await? else {
            return Ok(None);
        };
        if stored.is_expired(now) {
            self.delete_credential_token().await?;
            return Ok(None);
        }
        Ok(Some(stored))
    }

    /// Deletes the stored token; returns whether one was present.
    pub async fn delete_credential_token(&self) -> Result<bool> {
        let result = sqlx::query("DELETE FROM credential_token WHERE slot = 1")
            .execute(&self.pool)
            .await
            .context("failed to delete credential token")?;
        Ok(result.rows_affected() > 0)
    }
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url == MEMORY_DATABASE_URL || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
