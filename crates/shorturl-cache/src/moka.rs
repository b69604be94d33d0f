use async_trait::async_trait;
use moka::future::Cache;
use shorturl_core::{LinkCache, LinkPair, LongUrl, ShortId};
use std::time::Duration;
use tracing::{debug, trace};
use typed_builder::TypedBuilder;

use crate::Result;

const DEFAULT_CAPACITY: u64 = 100_000;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum CacheKey {
    Long(String),
    Short(String),
}

/// An in-process cache backed by Moka.
///
/// Both directions of a pair live in one cache under distinct keys, so they
/// share the capacity bound and eviction policy. Suitable for single-node
/// deployments or as the L1 of a [`LayeredCache`](crate::LayeredCache).
#[derive(Debug, Clone)]
pub struct MokaLinkCache {
    cache: Cache<CacheKey, String>,
}

impl MokaLinkCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates a cache holding at most `max_capacity` entries. Each pair
    /// takes two.
    pub fn with_capacity(max_capacity: u64) -> Self {
        let cache = Cache::builder().max_capacity(max_capacity).build();
        Self { cache }
    }

    pub fn builder() -> MokaCacheConfigBuilder {
        MokaCacheConfig::builder()
    }

    /// Approximate number of entries. Pending evictions may not be reflected.
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

impl Default for MokaLinkCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LinkCache for MokaLinkCache {
    async fn fetch_by_long(&self, long: &LongUrl) -> Result<Option<ShortId>> {
        let key = CacheKey::Long(long.as_str().to_string());
        match self.cache.get(&key).await {
            Some(short) => {
                trace!(long = %long, "moka hit");
                Ok(Some(ShortId::new(short)))
            }
            None => Ok(None),
        }
    }

    async fn fetch_by_short(&self, short: &ShortId) -> Result<Option<LongUrl>> {
        let key = CacheKey::Short(short.as_str().to_string());
        match self.cache.get(&key).await {
            Some(long) => {
                trace!(short = %short, "moka hit");
                Ok(Some(LongUrl::new_unchecked(long)))
            }
            None => Ok(None),
        }
    }

    async fn update(&self, pair: &LinkPair) -> Result<()> {
        self.cache
            .insert(
                CacheKey::Long(pair.long.as_str().to_string()),
                pair.short.as_str().to_string(),
            )
            .await;
        self.cache
            .insert(
                CacheKey::Short(pair.short.as_str().to_string()),
                pair.long.as_str().to_string(),
            )
            .await;
        debug!(short = %pair.short, "cached pair in moka");
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

/// Configuration for a [`MokaLinkCache`] with expiry.
#[derive(Debug, TypedBuilder, Default)]
pub struct MokaCacheConfig {
    #[builder(default, setter(strip_option))]
    max_capacity: Option<u64>,
    /// Time-to-live for cache entries.
    #[builder(default, setter(strip_option))]
    ttl: Option<Duration>,
    /// Time-to-idle for cache entries.
    #[builder(default, setter(strip_option))]
    tti: Option<Duration>,
}

impl From<MokaCacheConfig> for MokaLinkCache {
    fn from(config: MokaCacheConfig) -> Self {
        let mut builder =
            Cache::builder().max_capacity(config.max_capacity.unwrap_or(DEFAULT_CAPACITY));

        if let Some(ttl) = config.ttl {
            builder = builder.time_to_live(ttl);
        }

        if let Some(tti) = config.tti {
            builder = builder.time_to_idle(tti);
        }

        MokaLinkCache {
            cache: builder.build(),
        }
    }
}
