use crate::error::CacheError;
use crate::link::{LinkPair, LongUrl, ShortId};
use async_trait::async_trait;

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;

/// A fast, possibly lossy cache of [`LinkPair`]s indexed by either key.
///
/// The cache is never authoritative. Entries may disappear at any time, and
/// callers must treat both `Ok(None)` and `Err(_)` from a fetch as a miss.
/// Implementations must be safe for concurrent use.
#[async_trait]
pub trait LinkCache: Send + Sync + 'static {
    /// Looks up the short identifier cached for `long`.
    ///
    /// Returns `Ok(None)` if the key is not in the cache.
    async fn fetch_by_long(&self, long: &LongUrl) -> Result<Option<ShortId>>;

    /// Looks up the long URL cached for `short`.
    ///
    /// Returns `Ok(None)` if the key is not in the cache.
    async fn fetch_by_short(&self, short: &ShortId) -> Result<Option<LongUrl>>;

    /// Records both directions of `pair`.
    ///
    /// Implementations should avoid leaving only one direction written, but
    /// the store remains the source of truth if they cannot.
    async fn update(&self, pair: &LinkPair) -> Result<()>;

    /// Liveness probe for the background health check.
    async fn ping(&self) -> Result<()>;
}
