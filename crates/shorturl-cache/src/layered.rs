use async_trait::async_trait;
use shorturl_core::{LinkCache, LinkPair, LongUrl, ShortId};
use tracing::{debug, trace, warn};

use crate::Result;

/// A two-level cache that composes two [`LinkCache`] implementations.
///
/// L1 is meant to be a fast, local cache (e.g. [`MokaLinkCache`]) and L2 a
/// shared one (e.g. [`RedisLinkCache`]).
///
/// # Operation Strategy
///
/// - **Fetch**: Try L1 first. On a miss or an L1 error try L2, and backfill L1
///   with a hit.
/// - **Update**: Write L2, then L1. Both are attempted; the first error wins.
/// - **Ping**: Healthy only when both layers are.
///
/// [`MokaLinkCache`]: crate::MokaLinkCache
/// [`RedisLinkCache`]: crate::RedisLinkCache
#[derive(Debug, Clone)]
pub struct LayeredCache<L1, L2> {
    l1: L1,
    l2: L2,
}

impl<L1, L2> LayeredCache<L1, L2> {
    pub fn new(l1: L1, l2: L2) -> Self {
        Self { l1, l2 }
    }

    pub fn l1(&self) -> &L1 {
        &self.l1
    }

    pub fn l2(&self) -> &L2 {
        &self.l2
    }
}

#[async_trait]
impl<L1, L2> LinkCache for LayeredCache<L1, L2>
where
    L1: LinkCache,
    L2: LinkCache,
{
    async fn fetch_by_long(&self, long: &LongUrl) -> Result<Option<ShortId>> {
        match self.l1.fetch_by_long(long).await {
            Ok(Some(short)) => {
                trace!(long = %long, "L1 hit");
                return Ok(Some(short));
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "L1 lookup failed, trying L2"),
        }

        match self.l2.fetch_by_long(long).await? {
            Some(short) => {
                debug!(long = %long, "L2 hit, backfilling L1");
                let pair = LinkPair::new(long.clone(), short.clone());
                if let Err(e) = self.l1.update(&pair).await {
                    warn!(error = %e, "L1 backfill failed");
                }
                Ok(Some(short))
            }
            None => Ok(None),
        }
    }

    async fn fetch_by_short(&self, short: &ShortId) -> Result<Option<LongUrl>> {
        match self.l1.fetch_by_short(short).await {
            Ok(Some(long)) => {
                trace!(short = %short, "L1 hit");
                return Ok(Some(long));
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "L1 lookup failed, trying L2"),
        }

        match self.l2.fetch_by_short(short).await? {
            Some(long) => {
                debug!(short = %short, "L2 hit, backfilling L1");
                let pair = LinkPair::new(long.clone(), short.clone());
                if let Err(e) = self.l1.update(&pair).await {
                    warn!(error = %e, "L1 backfill failed");
                }
                Ok(Some(long))
            }
            None => Ok(None),
        }
    }

    async fn update(&self, pair: &LinkPair) -> Result<()> {
        let l2 = self.l2.update(pair).await;
        let l1 = self.l1.update(pair).await;
        l2.and(l1)
    }

    async fn ping(&self) -> Result<()> {
        self.l1.ping().await?;
        self.l2.ping().await
    }
}
