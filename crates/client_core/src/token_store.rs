//! Durable slot for the credential token.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use storage::{Storage, StoredCredentialToken};
use tokio::sync::Mutex;

/// Lifetime given to every token the session store persists.
pub const TOKEN_TTL_DAYS: i64 = 7;

pub fn token_ttl() -> Duration {
    Duration::days(TOKEN_TTL_DAYS)
}

/// Single mutable token slot; the session store is its only writer.
///
/// `get` never returns a token whose TTL has elapsed.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn set(&self, token: &str, ttl: Duration) -> Result<()>;
    async fn get(&self) -> Result<Option<String>>;
    async fn remove(&self) -> Result<()>;
}

#[async_trait]
impl TokenStore for Storage {
    async fn set(&self, token: &str, ttl: Duration) -> Result<()> {
        let issued_at = Utc::now();
        self.save_credential_token(token, issued_at, issued_at + ttl)
            .await
    }

    async fn get(&self) -> Result<Option<String>> {
        Ok(self
            .load_unexpired_credential_token(Utc::now())
            .await?
            .map(|stored| stored.token))
    }

    async fn remove(&self) -> Result<()> {
        self.delete_credential_token().await?;
        Ok(())
    }
}

/// Process-local token slot, lost on exit.
#[derive(Default)]
pub struct MemoryTokenStore {
    slot: Mutex<Option<StoredCredentialToken>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        let issued_at = Utc::now();
        Self {
            slot: Mutex::new(Some(StoredCredentialToken {
                token: token.into(),
                issued_at,
                expires_at: issued_at + token_ttl(),
            })),
        }
    }

    /// Current slot contents including expiry, without purging.
    pub async fn stored(&self) -> Option<StoredCredentialToken> {
        self.slot.lock().await.clone()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn set(&self, token: &str, ttl: Duration) -> Result<()> {
        let issued_at = Utc::now();
        *self.slot.lock().await = Some(StoredCredentialToken {
            token: token.to_string(),
            issued_at,
            expires_at: issued_at + ttl,
        });
        Ok(())
    }

    async fn get(&self) -> Result<Option<String>> {
        let mut slot = self.slot.lock().await;
        if slot
            .as_ref()
            .is_some_and(|stored| stored.is_expired(Utc::now()))
        {
            *slot = None;
        }
        Ok(slot.as_ref().map(|stored| stored.token.clone()))
    }

    async fn remove(&self) -> Result<()> {
        *self.slot.lock().await = None;
        Ok(())
    }
}
