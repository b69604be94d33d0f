use async_trait::async_trait;
use jiff::Timestamp;
use shorturl_core::store::Result;
use shorturl_core::{LinkPair, LinkStore, LongUrl, ShortId, StoreError};
use sqlx::mysql::MySqlPoolOptions;
use sqlx::{MySqlPool, Row};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, trace};
use typed_builder::TypedBuilder;

const SCHEMA: &str = include_str!("../ddl/mysql/link_pairs.sql");

/// Connection and per-operation limits for [`MySqlStore`].
#[derive(Debug, Clone, TypedBuilder)]
pub struct MySqlStoreOptions {
    /// Bound on opening the pool and the initial ping.
    #[builder(default = Duration::from_secs(10))]
    pub connect_timeout: Duration,
    /// Bound on every read or write issued by the store.
    #[builder(default = Duration::from_secs(5))]
    pub op_timeout: Duration,
    /// Bound on closing the pool.
    #[builder(default = Duration::from_secs(10))]
    pub disconnect_timeout: Duration,
    #[builder(default = 10)]
    pub max_connections: u32,
}

impl Default for MySqlStoreOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// MySQL implementation of the store contract.
///
/// Pairs live in the `link_pairs` table. Neither key carries a unique
/// index, so a race between two first-time inserts for the same long URL
/// leaves two rows behind, and both fetch methods report them.
#[derive(Debug, Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
    options: MySqlStoreOptions,
}

impl MySqlStore {
    /// Creates a store from an existing MySQL connection pool.
    pub fn new(pool: MySqlPool, options: MySqlStoreOptions) -> Self {
        Self { pool, options }
    }

    /// Opens a new pool and pings the server.
    ///
    /// Fails if the server cannot be reached within `connect_timeout`.
    pub async fn connect(database_url: &str, options: MySqlStoreOptions) -> Result<Self> {
        let connect = async {
            let pool = MySqlPoolOptions::new()
                .max_connections(options.max_connections)
                .acquire_timeout(options.connect_timeout)
                .connect(database_url)
                .await?;
            sqlx::query("SELECT 1").execute(&pool).await?;
            Ok::<_, sqlx::Error>(pool)
        };

        let pool = match tokio::time::timeout(options.connect_timeout, connect).await {
            Ok(result) => result.map_err(map_sqlx_error)?,
            Err(_) => {
                return Err(StoreError::Unavailable(format!(
                    "could not connect to MySQL within {:?}",
                    options.connect_timeout
                )))
            }
        };

        info!(max_connections = options.max_connections, "connected to MySQL");
        Ok(Self::new(pool, options))
    }

    /// Creates the `link_pairs` table if it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<()> {
        self.bounded("create schema", sqlx::query(SCHEMA).execute(&self.pool))
            .await?;
        debug!("link_pairs schema is in place");
        Ok(())
    }

    /// Returns a reference to the underlying pool.
    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    async fn bounded<T, F>(&self, operation: &str, fut: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(self.options.op_timeout, fut).await {
            Ok(result) => result.map_err(map_sqlx_error),
            Err(_) => Err(StoreError::Timeout(format!(
                "{operation} exceeded {:?}",
                self.options.op_timeout
            ))),
        }
    }
}

fn now_unix_seconds() -> i64 {
    Timestamp::now().as_second()
}

fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    let message = err.to_string();

    match err {
        sqlx::Error::PoolTimedOut => StoreError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StoreError::Unavailable(message),
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::RowNotFound => StoreError::InvalidData(message),
        _ => StoreError::Query(message),
    }
}

#[async_trait]
impl LinkStore for MySqlStore {
    async fn fetch_by_long(&self, long: &LongUrl) -> Result<Vec<ShortId>> {
        trace!(long = %long, "fetching pairs by long url from MySQL");

        let rows = self
            .bounded(
                "fetch by long url",
                sqlx::query(
                    r#"
                    SELECT short_id
                    FROM link_pairs
                    WHERE long_url = ?
                    ORDER BY id
                    "#,
                )
                .bind(long.as_str())
                .fetch_all(&self.pool),
            )
            .await?;

        rows.iter()
            .map(|row| {
                row.try_get::<String, _>("short_id")
                    .map(ShortId::new)
                    .map_err(map_sqlx_error)
            })
            .collect()
    }

    async fn fetch_by_short(&self, short: &ShortId) -> Result<Vec<LongUrl>> {
        trace!(short = %short, "fetching pairs by short id from MySQL");

        let rows = self
            .bounded(
                "fetch by short id",
                sqlx::query(
                    r#"
                    SELECT long_url
                    FROM link_pairs
                    WHERE short_id = ?
                    ORDER BY id
                    "#,
                )
                .bind(short.as_str())
                .fetch_all(&self.pool),
            )
            .await?;

        rows.iter()
            .map(|row| {
                row.try_get::<String, _>("long_url")
                    .map(LongUrl::new_unchecked)
                    .map_err(map_sqlx_error)
            })
            .collect()
    }

    async fn insert(&self, pair: &LinkPair) -> Result<()> {
        trace!(long = %pair.long, short = %pair.short, "inserting pair into MySQL");

        self.bounded(
            "insert pair",
            sqlx::query(
                r#"
                INSERT INTO link_pairs (long_url, short_id, created_at)
                VALUES (?, ?, ?)
                "#,
            )
            .bind(pair.long.as_str())
            .bind(pair.short.as_str())
            .bind(now_unix_seconds())
            .execute(&self.pool),
        )
        .await?;

        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        match tokio::time::timeout(self.options.disconnect_timeout, self.pool.close()).await {
            Ok(()) => {
                info!("disconnected from MySQL");
                Ok(())
            }
            Err(_) => Err(StoreError::Timeout(format!(
                "closing the MySQL pool exceeded {:?}",
                self.options.disconnect_timeout
            ))),
        }
    }
}
