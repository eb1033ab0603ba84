//! Consumer-side memory of applied idempotency keys.
//!
//! A key is recorded only after its effect was applied, so a crash between the
//! two leads to one more (naturally idempotent) application, never to a
//! skipped one.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use deadpool_redis::Pool;
use deadpool_redis::redis::{self, AsyncCommands};

#[derive(Debug, thiserror::Error)]
pub enum IdempotencyError {
    #[error("idempotency store unavailable: {0}")]
    Unavailable(String),
}

pub trait IdempotencyStore: Send + Sync {
    fn contains(&self, key: &str) -> impl Future<Output = Result<bool, IdempotencyError>> + Send;
    fn remember(&self, key: &str) -> impl Future<Output = Result<(), IdempotencyError>> + Send;
}

// ── In-memory ────────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct InMemoryIdempotencyStore {
    keys: Arc<Mutex<HashSet<String>>>,
}

impl InMemoryIdempotencyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.keys.lock().map(|keys| keys.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl IdempotencyStore for InMemoryIdempotencyStore {
    async fn contains(&self, key: &str) -> Result<bool, IdempotencyError> {
        let keys = self
            .keys
            .lock()
            .map_err(|_| IdempotencyError::Unavailable("lock poisoned".into()))?;
        Ok(keys.contains(key))
    }

    async fn remember(&self, key: &str) -> Result<(), IdempotencyError> {
        let mut keys = self
            .keys
            .lock()
            .map_err(|_| IdempotencyError::Unavailable("lock poisoned".into()))?;
        keys.insert(key.to_owned());
        Ok(())
    }
}

// ── Redis ────────────────────────────────────────────────────────────────────

/// Keys live under `idempotency:{namespace}:` so services sharing one Redis
/// never see each other's keys.
#[derive(Clone)]
pub struct RedisIdempotencyStore {
    pool: Pool,
    namespace: String,
    ttl: Duration,
}

impl RedisIdempotencyStore {
    pub fn new(pool: Pool, namespace: impl Into<String>, ttl: Duration) -> Self {
        Self {
            pool,
            namespace: namespace.into(),
            ttl,
        }
    }

    fn key(&self, key: &str) -> String {
        format!("idempotency:{}:{}", self.namespace, key)
    }
}

fn unavailable(e: impl std::fmt::Display) -> IdempotencyError {
    IdempotencyError::Unavailable(e.to_string())
}

impl IdempotencyStore for RedisIdempotencyStore {
    async fn contains(&self, key: &str) -> Result<bool, IdempotencyError> {
        let mut conn = self.pool.get().await.map_err(unavailable)?;
        let exists: bool = conn.exists(self.key(key)).await.map_err(unavailable)?;
        Ok(exists)
    }

    async fn remember(&self, key: &str) -> Result<(), IdempotencyError> {
        let mut conn = self.pool.get().await.map_err(unavailable)?;
        let _: Option<String> = redis::cmd("SET")
            .arg(self.key(key))
            .arg(1)
            .arg("NX")
            .arg("EX")
            .arg(self.ttl.as_secs().max(1))
            .query_async(&mut conn)
            .await
            .map_err(unavailable)?;
        Ok(())
    }
}
