use async_trait::async_trait;
use dashmap::DashMap;
use shorturl_core::store::Result;
use shorturl_core::{LinkPair, LinkStore, LongUrl, ShortId};
use tracing::trace;

/// In-memory implementation of [`LinkStore`] using two DashMap multimaps.
///
/// DashMap provides better concurrency than RwLock<HashMap> because it
/// uses sharded locks, allowing concurrent reads and writes to different
/// buckets without blocking.
///
/// Nothing is durable: the store lives as long as the process. Each index
/// keeps every value inserted for a key, so duplicate records are reported
/// by the fetch methods exactly like a database without unique constraints
/// would report them.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    by_long: DashMap<String, Vec<ShortId>>,
    by_short: DashMap<String, Vec<LongUrl>>,
}

impl InMemoryStore {
    /// Creates a new, empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new in-memory store with the specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            by_long: DashMap::with_capacity(capacity),
            by_short: DashMap::with_capacity(capacity),
        }
    }

    /// Number of records held.
    pub fn len(&self) -> usize {
        self.by_long.iter().map(|entry| entry.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_long.is_empty()
    }
}

#[async_trait]
impl LinkStore for InMemoryStore {
    async fn fetch_by_long(&self, long: &LongUrl) -> Result<Vec<ShortId>> {
        Ok(self
            .by_long
            .get(long.as_str())
            .map(|shorts| shorts.clone())
            .unwrap_or_default())
    }

    async fn fetch_by_short(&self, short: &ShortId) -> Result<Vec<LongUrl>> {
        Ok(self
            .by_short
            .get(short.as_str())
            .map(|longs| longs.clone())
            .unwrap_or_default())
    }

    async fn insert(&self, pair: &LinkPair) -> Result<()> {
        trace!(long = %pair.long, short = %pair.short, "inserting pair into memory store");

        self.by_long
            .entry(pair.long.as_str().to_owned())
            .or_default()
            .push(pair.short.clone());
        self.by_short
            .entry(pair.short.as_str().to_owned())
            .or_default()
            .push(pair.long.clone());
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        Ok(())
    }
}
