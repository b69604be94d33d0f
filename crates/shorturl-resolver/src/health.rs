use shorturl_core::LinkCache;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

/// Latest cache liveness as observed by [`CacheHealthCheck`].
///
/// Starts out healthy. Cloning shares the underlying flag.
#[derive(Debug, Clone)]
pub struct CacheHealth(Arc<AtomicBool>);

impl CacheHealth {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn is_up(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Records `up` and returns the previous value.
    fn set(&self, up: bool) -> bool {
        self.0.swap(up, Ordering::Relaxed)
    }
}

impl Default for CacheHealth {
    fn default() -> Self {
        Self::new()
    }
}

/// Background task pinging the cache on a fixed interval.
///
/// Failures never affect requests. They are logged at `error` on every
/// failing ping and once at `info` when the cache comes back.
pub struct CacheHealthCheck<C: ?Sized> {
    cache: Arc<C>,
    interval: Duration,
    health: CacheHealth,
}

impl<C: LinkCache + ?Sized> CacheHealthCheck<C> {
    pub fn new(cache: Arc<C>, interval: Duration, health: CacheHealth) -> Self {
        Self {
            cache,
            interval,
            health,
        }
    }

    pub fn health(&self) -> &CacheHealth {
        &self.health
    }

    /// Pings once and records the outcome.
    pub async fn check(&self) -> bool {
        match self.cache.ping().await {
            Ok(()) => {
                if !self.health.set(true) {
                    info!("cache is reachable again");
                } else {
                    debug!("cache ping ok");
                }
                true
            }
            Err(e) => {
                self.health.set(false);
                error!(error = %e, "cache ping failed");
                false
            }
        }
    }

    /// Runs until `shutdown` resolves. The first ping happens immediately.
    pub async fn run(self, shutdown: impl Future<Output = ()>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    debug!("cache health check stopped");
                    return;
                }
                _ = ticker.tick() => {
                    self.check().await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use shorturl_core::{CacheError, LinkPair, LongUrl, ShortId};
    use std::sync::atomic::AtomicUsize;

    /// Fails pings while `down` is set.
    #[derive(Default)]
    struct FlakyCache {
        down: AtomicBool,
        pings: AtomicUsize,
    }

    #[async_trait]
    impl LinkCache for FlakyCache {
        async fn fetch_by_long(
            &self,
            _long: &LongUrl,
        ) -> shorturl_core::cache::Result<Option<ShortId>> {
            Ok(None)
        }

        async fn fetch_by_short(
            &self,
            _short: &ShortId,
        ) -> shorturl_core::cache::Result<Option<LongUrl>> {
            Ok(None)
        }

        async fn update(&self, _pair: &LinkPair) -> shorturl_core::cache::Result<()> {
            Ok(())
        }

        async fn ping(&self) -> shorturl_core::cache::Result<()> {
            self.pings.fetch_add(1, Ordering::SeqCst);
            if self.down.load(Ordering::SeqCst) {
                Err(CacheError::Unavailable("connection refused".into()))
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test]
    async fn check_tracks_failure_and_recovery() {
        let cache = Arc::new(FlakyCache::default());
        let check = CacheHealthCheck::new(
            Arc::clone(&cache),
            Duration::from_secs(5),
            CacheHealth::new(),
        );

        assert!(check.check().await);
        assert!(check.health().is_up());

        cache.down.store(true, Ordering::SeqCst);
        assert!(!check.check().await);
        assert!(!check.health().is_up());

        cache.down.store(false, Ordering::SeqCst);
        assert!(check.check().await);
        assert!(check.health().is_up());
    }

    #[tokio::test(start_paused = true)]
    async fn run_pings_on_interval_until_shutdown() {
        let cache = Arc::new(FlakyCache::default());
        let health = CacheHealth::new();
        let check = CacheHealthCheck::new(
            Arc::clone(&cache),
            Duration::from_secs(5),
            health.clone(),
        );
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        let task = tokio::spawn(check.run(async {
            let _ = rx.await;
        }));

        // Immediate first tick, then one every 5s.
        tokio::time::sleep(Duration::from_millis(12_500)).await;
        assert_eq!(cache.pings.load(Ordering::SeqCst), 3);

        cache.down.store(true, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(!health.is_up());

        tx.send(()).unwrap();
        task.await.unwrap();

        let pings = cache.pings.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(cache.pings.load(Ordering::SeqCst), pings);
    }
}
