use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use shorturl_core::{CacheError, LinkCache, LinkPair, LongUrl, ShortId};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, trace, warn};
use typed_builder::TypedBuilder;

use crate::Result;

#[derive(Debug, Clone, TypedBuilder)]
pub struct RedisCacheOptions {
    #[builder(default = "su:".to_string(), setter(into))]
    pub key_prefix: String,
    /// Upper bound for a single cache round trip, connecting included.
    #[builder(default = Duration::from_millis(500))]
    pub timeout: Duration,
    /// Expiry for written entries, applied with millisecond precision.
    /// `None` leaves eviction to the server.
    #[builder(default, setter(strip_option))]
    pub ttl: Option<Duration>,
}

impl Default for RedisCacheOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// A Redis-backed [`LinkCache`].
///
/// Each pair is stored as two plain string keys, `{prefix}long:{url}` and
/// `{prefix}short:{id}`, written together in a `MULTI`/`EXEC` block.
#[derive(Clone)]
pub struct RedisLinkCache {
    conn: ConnectionManager,
    options: RedisCacheOptions,
}

fn map_redis_error(operation: &str, err: redis::RedisError) -> CacheError {
    let message = format!("{operation}: {err}");
    if err.is_timeout() {
        CacheError::Timeout(message)
    } else if err.is_connection_refusal() || err.is_io_error() || err.is_connection_dropped() {
        CacheError::Unavailable(message)
    } else {
        CacheError::Operation(message)
    }
}

/// `PSETEX` rejects zero, so anything below a millisecond becomes one.
fn ttl_millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
}

impl RedisLinkCache {
    pub fn new(conn: ConnectionManager, options: RedisCacheOptions) -> Self {
        Self { conn, options }
    }

    /// Opens a managed connection to `redis_url`.
    ///
    /// The connection manager reconnects on its own after the first
    /// successful connect, so a server that goes away later only produces
    /// per-operation errors.
    pub async fn connect(redis_url: &str, options: RedisCacheOptions) -> Result<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| CacheError::Initialization(format!("invalid redis url: {e}")))?;

        let conn = tokio::time::timeout(options.timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| {
                CacheError::Timeout(format!(
                    "connecting to redis took longer than {:?}",
                    options.timeout
                ))
            })?
            .map_err(|e| map_redis_error("failed to connect to redis", e))?;

        debug!(prefix = %options.key_prefix, "connected to redis");
        Ok(Self::new(conn, options))
    }

    fn long_key(&self, long: &LongUrl) -> String {
        format!("{}long:{}", self.options.key_prefix, long.as_str())
    }

    fn short_key(&self, short: &ShortId) -> String {
        format!("{}short:{}", self.options.key_prefix, short.as_str())
    }

    async fn bounded<T, F>(&self, operation: &str, fut: F) -> Result<T>
    where
        F: Future<Output = redis::RedisResult<T>>,
    {
        match tokio::time::timeout(self.options.timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(map_redis_error(operation, e)),
            Err(_) => Err(CacheError::Timeout(format!(
                "{operation}: no reply within {:?}",
                self.options.timeout
            ))),
        }
    }

    async fn get(&self, key: String) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        self.bounded("failed to read from redis", async move {
            conn.get::<_, Option<String>>(key).await
        })
        .await
    }
}

#[async_trait]
impl LinkCache for RedisLinkCache {
    async fn fetch_by_long(&self, long: &LongUrl) -> Result<Option<ShortId>> {
        let found = self.get(self.long_key(long)).await?;
        trace!(long = %long, hit = found.is_some(), "redis lookup");
        Ok(found.map(ShortId::new))
    }

    async fn fetch_by_short(&self, short: &ShortId) -> Result<Option<LongUrl>> {
        let found = self.get(self.short_key(short)).await?;
        trace!(short = %short, hit = found.is_some(), "redis lookup");
        Ok(found.map(LongUrl::new_unchecked))
    }

    async fn update(&self, pair: &LinkPair) -> Result<()> {
        let long_key = self.long_key(&pair.long);
        let short_key = self.short_key(&pair.short);

        let mut pipe = redis::pipe();
        pipe.atomic();
        match self.options.ttl {
            Some(ttl) => {
                let millis = ttl_millis(ttl);
                pipe.pset_ex(&long_key, pair.short.as_str(), millis)
                    .ignore()
                    .pset_ex(&short_key, pair.long.as_str(), millis)
                    .ignore();
            }
            None => {
                pipe.set(&long_key, pair.short.as_str())
                    .ignore()
                    .set(&short_key, pair.long.as_str())
                    .ignore();
            }
        }

        let mut conn = self.conn.clone();
        let result = self
            .bounded("failed to write pair to redis", async move {
                pipe.query_async::<()>(&mut conn).await
            })
            .await;

        if let Err(e) = &result {
            warn!(short = %pair.short, error = %e, "redis update failed");
        }
        result
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let reply = self
            .bounded("redis ping failed", async move {
                redis::cmd("PING").query_async::<String>(&mut conn).await
            })
            .await?;

        if reply == "PONG" {
            Ok(())
        } else {
            Err(CacheError::InvalidData(format!(
                "unexpected ping reply: {reply}"
            )))
        }
    }
}
