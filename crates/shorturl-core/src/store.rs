use crate::error::StoreError;
use crate::link::{LinkPair, LongUrl, ShortId};
use async_trait::async_trait;

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// The durable, authoritative record of [`LinkPair`]s.
///
/// Lookups return every record on file for a key so that duplicates stay
/// visible to the caller. The store does not enforce uniqueness itself.
#[async_trait]
pub trait LinkStore: Send + Sync + 'static {
    /// Returns all short identifiers on record for `long`.
    /// An empty vector means there is no record.
    async fn fetch_by_long(&self, long: &LongUrl) -> Result<Vec<ShortId>>;

    /// Returns all long URLs on record for `short`.
    /// An empty vector means there is no record.
    async fn fetch_by_short(&self, short: &ShortId) -> Result<Vec<LongUrl>>;

    /// Durably records a new pair.
    async fn insert(&self, pair: &LinkPair) -> Result<()>;

    /// Releases every resource held by the store.
    async fn disconnect(&self) -> Result<()>;
}
