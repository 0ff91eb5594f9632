//! Shared cache backend on Redis, using store-native expiry.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use ::redis::AsyncCommands;
use ::redis::aio::MultiplexedConnection;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::debug;

use crate::error::CacheError;
use crate::port::CacheStore;

pub struct RedisCacheStore {
    client: ::redis::Client,
    prefix: String,
    timeout: Duration,
    connection: Mutex<Option<MultiplexedConnection>>,
}

impl RedisCacheStore {
    /// Opens a client without connecting; the connection is established on
    /// first use so a Redis outage at startup only degrades caching.
    ///
    /// # Errors
    /// Returns [`CacheError::Unavailable`] when the URL cannot be parsed.
    pub fn new(url: &str, prefix: &str, timeout: Duration) -> Result<Self, CacheError> {
        let client =
            ::redis::Client::open(url).map_err(|e| CacheError::Unavailable(e.to_string()))?;
        Ok(Self {
            client,
            prefix: prefix.to_string(),
            timeout,
            connection: Mutex::new(None),
        })
    }

    #[must_use]
    pub fn namespaced(&self, key: &str) -> String {
        format!("{}:{key}", self.prefix)
    }

    /// Multiplexed connections do not reconnect by themselves, so a failed
    /// command drops the shared one and the next call dials again.
    async fn connection(&self) -> Result<MultiplexedConnection, CacheError> {
        let mut slot = self.connection.lock().await;
        if let Some(conn) = slot.as_ref() {
            return Ok(conn.clone());
        }
        let conn = self
            .bounded(self.client.get_multiplexed_async_connection())
            .await?;
        *slot = Some(conn.clone());
        Ok(conn)
    }

    async fn run<T, F>(&self, op: F) -> Result<T, CacheError>
    where
        F: Future<Output = ::redis::RedisResult<T>>,
    {
        let result = self.bounded(op).await;
        if let Err(error) = &result {
            debug!(error = %error, "dropping redis connection after failed command");
            self.connection.lock().await.take();
        }
        result
    }

    async fn bounded<T, F>(&self, op: F) -> Result<T, CacheError>
    where
        F: Future<Output = ::redis::RedisResult<T>>,
    {
        match timeout(self.timeout, op).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(CacheError::Unavailable(e.to_string())),
            Err(_) => Err(CacheError::Timeout),
        }
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let mut conn = self.connection().await?;
        let key = self.namespaced(key);
        let value: Option<Vec<u8>> = self.run(conn.get(key)).await?;
        Ok(value)
    }

    async fn set_with_ttl(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        let key = self.namespaced(key);
        let seconds = ttl.as_secs().max(1);
        self.run::<(), _>(conn.set_ex(key, value, seconds)).await
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        let key = self.namespaced(key);
        self.run::<(), _>(conn.del(key)).await
    }
}
