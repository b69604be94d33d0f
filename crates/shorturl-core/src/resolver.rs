use crate::error::Result;
use crate::link::{LongUrl, ShortId};
use async_trait::async_trait;

#[async_trait]
pub trait Resolver: Send + Sync + 'static {
    /// Returns the short identifier for `long`, minting and persisting one
    /// on the first request for that URL.
    async fn shorten(&self, long: &str) -> Result<ShortId>;

    /// Returns the long URL recorded for `short`. Never creates a record.
    async fn resolve(&self, short: &str) -> Result<LongUrl>;
}
