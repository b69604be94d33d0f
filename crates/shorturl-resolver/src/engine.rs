use async_trait::async_trait;
use shorturl_core::error::Result;
use shorturl_core::{
    LinkCache, LinkPair, LinkStore, LongUrl, ResolveError, Resolver, ShortId,
};
use shorturl_generator::Generator;
use std::sync::Arc;
use tracing::{debug, error, info, trace, warn};

/// Cache-aside implementation of [`Resolver`].
///
/// The store is the source of truth; the cache only short-circuits lookups.
/// Cache failures are logged and otherwise ignored, so a dead cache slows
/// requests down but never fails them.
///
/// Shortening is check-then-insert without any lock. Two concurrent first
/// time shortens of the same URL can both insert; the duplicate is reported
/// as [`ResolveError::DataIntegrityViolation`] by whichever request reads it
/// next.
pub struct ResolutionEngine<S: ?Sized, C: ?Sized, G> {
    store: Arc<S>,
    cache: Arc<C>,
    generator: G,
}

impl<S: ?Sized, C: ?Sized, G: Clone> Clone for ResolutionEngine<S, C, G> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            cache: Arc::clone(&self.cache),
            generator: self.generator.clone(),
        }
    }
}

impl<S, C, G> ResolutionEngine<S, C, G>
where
    S: LinkStore + ?Sized,
    C: LinkCache + ?Sized,
    G: Generator,
{
    pub fn new(store: Arc<S>, cache: Arc<C>, generator: G) -> Self {
        Self {
            store,
            cache,
            generator,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn cache(&self) -> &Arc<C> {
        &self.cache
    }

    async fn cached_short(&self, long: &LongUrl) -> Option<ShortId> {
        match self.cache.fetch_by_long(long).await {
            Ok(Some(short)) => {
                trace!(long = %long, short = %short, "cache hit");
                Some(short)
            }
            Ok(None) => {
                trace!(long = %long, "cache miss");
                None
            }
            Err(e) => {
                warn!(long = %long, error = %e, "cache lookup failed, falling back to store");
                None
            }
        }
    }

    async fn cached_long(&self, short: &ShortId) -> Option<LongUrl> {
        match self.cache.fetch_by_short(short).await {
            Ok(Some(long)) => {
                trace!(short = %short, long = %long, "cache hit");
                Some(long)
            }
            Ok(None) => {
                trace!(short = %short, "cache miss");
                None
            }
            Err(e) => {
                warn!(short = %short, error = %e, "cache lookup failed, falling back to store");
                None
            }
        }
    }

    async fn remember(&self, pair: &LinkPair) {
        if let Err(e) = self.cache.update(pair).await {
            warn!(short = %pair.short, error = %e, "cache update failed");
        }
    }

    async fn mint(&self, long: LongUrl) -> Result<LinkPair> {
        let short = self.generator.generate().map_err(|e| {
            error!(long = %long, error = %e, "identifier generation failed");
            ResolveError::from(e)
        })?;
        let pair = LinkPair::new(long, short);

        self.store.insert(&pair).await.map_err(|e| {
            error!(short = %pair.short, error = %e, "store insert failed");
            ResolveError::from(e)
        })?;

        info!(long = %pair.long, short = %pair.short, "created short link");
        Ok(pair)
    }
}

#[async_trait]
impl<S, C, G> Resolver for ResolutionEngine<S, C, G>
where
    S: LinkStore + ?Sized,
    C: LinkCache + ?Sized,
    G: Generator,
{
    async fn shorten(&self, long: &str) -> Result<ShortId> {
        let long = LongUrl::parse(long)?;

        if let Some(short) = self.cached_short(&long).await {
            return Ok(short);
        }

        let mut shorts = self.store.fetch_by_long(&long).await.map_err(|e| {
            error!(long = %long, error = %e, "store lookup failed");
            ResolveError::from(e)
        })?;

        let pair = match shorts.len() {
            0 => self.mint(long).await?,
            1 => {
                let short = shorts.remove(0);
                debug!(long = %long, short = %short, "found existing short link");
                LinkPair::new(long, short)
            }
            records => {
                error!(long = %long, records, "duplicate records for long url");
                return Err(ResolveError::DataIntegrityViolation {
                    key: long.into_string(),
                    records,
                });
            }
        };

        self.remember(&pair).await;
        Ok(pair.short)
    }

    async fn resolve(&self, short: &str) -> Result<LongUrl> {
        let short = ShortId::new(short);

        if let Some(long) = self.cached_long(&short).await {
            return Ok(long);
        }

        let mut longs = self.store.fetch_by_short(&short).await.map_err(|e| {
            error!(short = %short, error = %e, "store lookup failed");
            ResolveError::from(e)
        })?;

        let pair = match longs.len() {
            0 => {
                debug!(short = %short, "short link not found");
                return Err(ResolveError::NotFound(short.into_string()));
            }
            1 => LinkPair::new(longs.remove(0), short),
            records => {
                error!(short = %short, records, "duplicate records for short id");
                return Err(ResolveError::DataIntegrityViolation {
                    key: short.into_string(),
                    records,
                });
            }
        };

        self.remember(&pair).await;
        Ok(pair.long)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shorturl_cache::MokaLinkCache;
    use shorturl_core::{CacheError, GeneratorError, StoreError};
    use shorturl_generator::{NanoIdGenerator, SeqGenerator};
    use shorturl_storage::InMemoryStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts every call that reaches the wrapped store.
    #[derive(Default)]
    struct CountingStore {
        inner: InMemoryStore,
        calls: AtomicUsize,
        inserts: AtomicUsize,
    }

    impl CountingStore {
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn inserts(&self) -> usize {
            self.inserts.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LinkStore for CountingStore {
        async fn fetch_by_long(
            &self,
            long: &LongUrl,
        ) -> shorturl_core::store::Result<Vec<ShortId>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.fetch_by_long(long).await
        }

        async fn fetch_by_short(
            &self,
            short: &ShortId,
        ) -> shorturl_core::store::Result<Vec<LongUrl>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.fetch_by_short(short).await
        }

        async fn insert(&self, pair: &LinkPair) -> shorturl_core::store::Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inserts.fetch_add(1, Ordering::SeqCst);
            self.inner.insert(pair).await
        }

        async fn disconnect(&self) -> shorturl_core::store::Result<()> {
            Ok(())
        }
    }

    /// Counts calls and updates that reach the wrapped cache.
    #[derive(Default)]
    struct CountingCache {
        inner: MokaLinkCache,
        calls: AtomicUsize,
        updates: AtomicUsize,
    }

    impl CountingCache {
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn updates(&self) -> usize {
            self.updates.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LinkCache for CountingCache {
        async fn fetch_by_long(
            &self,
            long: &LongUrl,
        ) -> shorturl_core::cache::Result<Option<ShortId>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.fetch_by_long(long).await
        }

        async fn fetch_by_short(
            &self,
            short: &ShortId,
        ) -> shorturl_core::cache::Result<Option<LongUrl>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.fetch_by_short(short).await
        }

        async fn update(&self, pair: &LinkPair) -> shorturl_core::cache::Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.updates.fetch_add(1, Ordering::SeqCst);
            self.inner.update(pair).await
        }

        async fn ping(&self) -> shorturl_core::cache::Result<()> {
            Ok(())
        }
    }

    struct UnreachableCache;

    #[async_trait]
    impl LinkCache for UnreachableCache {
        async fn fetch_by_long(
            &self,
            _long: &LongUrl,
        ) -> shorturl_core::cache::Result<Option<ShortId>> {
            Err(CacheError::Unavailable("connection refused".into()))
        }

        async fn fetch_by_short(
            &self,
            _short: &ShortId,
        ) -> shorturl_core::cache::Result<Option<LongUrl>> {
            Err(CacheError::Timeout("no reply".into()))
        }

        async fn update(&self, _pair: &LinkPair) -> shorturl_core::cache::Result<()> {
            Err(CacheError::Unavailable("connection refused".into()))
        }

        async fn ping(&self) -> shorturl_core::cache::Result<()> {
            Err(CacheError::Unavailable("connection refused".into()))
        }
    }

    struct UnreachableStore;

    #[async_trait]
    impl LinkStore for UnreachableStore {
        async fn fetch_by_long(
            &self,
            _long: &LongUrl,
        ) -> shorturl_core::store::Result<Vec<ShortId>> {
            Err(StoreError::Unavailable("pool closed".into()))
        }

        async fn fetch_by_short(
            &self,
            _short: &ShortId,
        ) -> shorturl_core::store::Result<Vec<LongUrl>> {
            Err(StoreError::Timeout("5s".into()))
        }

        async fn insert(&self, _pair: &LinkPair) -> shorturl_core::store::Result<()> {
            Err(StoreError::Unavailable("pool closed".into()))
        }

        async fn disconnect(&self) -> shorturl_core::store::Result<()> {
            Ok(())
        }
    }

    struct NoEntropy;

    impl Generator for NoEntropy {
        fn generate(&self) -> std::result::Result<ShortId, GeneratorError> {
            Err(GeneratorError::EntropyUnavailable("getrandom failed".into()))
        }
    }

    type Counting = ResolutionEngine<CountingStore, CountingCache, SeqGenerator>;

    fn counting_engine() -> Counting {
        ResolutionEngine::new(
            Arc::new(CountingStore::default()),
            Arc::new(CountingCache::default()),
            SeqGenerator::with_prefix("t"),
        )
    }

    fn pair(long: &str, short: &str) -> LinkPair {
        LinkPair::new(LongUrl::new_unchecked(long), ShortId::new(short))
    }

    #[tokio::test]
    async fn repeated_shorten_returns_same_short() {
        let engine = counting_engine();

        let first = engine.shorten("https://example.com/a").await.unwrap();
        let second = engine.shorten("https://example.com/a").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(engine.store().inserts(), 1);
    }

    #[tokio::test]
    async fn repeated_shorten_is_stable_without_cache_help() {
        let engine = ResolutionEngine::new(
            Arc::new(InMemoryStore::new()),
            Arc::new(UnreachableCache),
            NanoIdGenerator::new(),
        );

        let first = engine.shorten("https://example.com/a").await.unwrap();
        let second = engine.shorten("https://example.com/a").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(engine.store().len(), 1);
    }

    #[tokio::test]
    async fn resolve_returns_what_was_shortened() {
        let engine = counting_engine();

        for long in [
            "https://example.com/a",
            "http://example.org/path?q=1#frag",
            "ftp://files.example.net/pub/file.txt",
        ] {
            let short = engine.shorten(long).await.unwrap();
            assert_eq!(engine.resolve(short.as_str()).await.unwrap().as_str(), long);
        }
    }

    #[tokio::test]
    async fn invalid_long_touches_nothing() {
        let engine = counting_engine();

        for bad in [
            "",
            "not a url",
            "example.com/a",
            "/relative",
            " https://example.com",
            "https://example.com/a\nb",
            "https://exa\nmple.com/",
        ] {
            let err = engine.shorten(bad).await.unwrap_err();
            assert!(matches!(err, ResolveError::InvalidInput(_)), "{bad:?}: {err}");
        }

        assert_eq!(engine.store().calls(), 0);
        assert_eq!(engine.cache().calls(), 0);
    }

    #[tokio::test]
    async fn unknown_short_is_not_found_and_creates_nothing() {
        let engine = counting_engine();

        let err = engine.resolve("doesnotexist").await.unwrap_err();

        assert!(matches!(err, ResolveError::NotFound(ref key) if key == "doesnotexist"));
        assert_eq!(engine.store().inserts(), 0);
        assert!(engine.store().inner.is_empty());
        assert_eq!(engine.cache().updates(), 0);
    }

    #[tokio::test]
    async fn duplicate_long_records_are_reported() {
        let engine = counting_engine();
        engine
            .store()
            .inner
            .insert(&pair("https://example.com/dup", "one"))
            .await
            .unwrap();
        engine
            .store()
            .inner
            .insert(&pair("https://example.com/dup", "two"))
            .await
            .unwrap();

        let err = engine.shorten("https://example.com/dup").await.unwrap_err();

        match err {
            ResolveError::DataIntegrityViolation { key, records } => {
                assert_eq!(key, "https://example.com/dup");
                assert_eq!(records, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(engine.cache().updates(), 0);
        assert_eq!(engine.store().inserts(), 0);
    }

    #[tokio::test]
    async fn duplicate_short_records_are_reported() {
        let engine = counting_engine();
        engine
            .store()
            .inner
            .insert(&pair("https://example.com/1", "same"))
            .await
            .unwrap();
        engine
            .store()
            .inner
            .insert(&pair("https://example.com/2", "same"))
            .await
            .unwrap();

        let err = engine.resolve("same").await.unwrap_err();

        assert!(matches!(
            err,
            ResolveError::DataIntegrityViolation { records: 2, .. }
        ));
        assert_eq!(engine.cache().updates(), 0);
    }

    #[tokio::test]
    async fn cache_answers_both_directions_after_shorten() {
        let engine = counting_engine();

        let short = engine.shorten("https://example.com/a").await.unwrap();
        let long = LongUrl::new_unchecked("https://example.com/a");

        let cache = &engine.cache().inner;
        assert_eq!(cache.fetch_by_long(&long).await.unwrap(), Some(short.clone()));
        assert_eq!(cache.fetch_by_short(&short).await.unwrap(), Some(long));
    }

    #[tokio::test]
    async fn cache_answers_both_directions_after_resolve() {
        let engine = counting_engine();
        let p = pair("https://example.com/b", "seeded");
        engine.store().inner.insert(&p).await.unwrap();

        engine.resolve("seeded").await.unwrap();

        let cache = &engine.cache().inner;
        assert_eq!(cache.fetch_by_long(&p.long).await.unwrap(), Some(p.short.clone()));
        assert_eq!(cache.fetch_by_short(&p.short).await.unwrap(), Some(p.long.clone()));
    }

    #[tokio::test]
    async fn cache_hit_skips_the_store() {
        let engine = counting_engine();
        engine
            .cache()
            .inner
            .update(&pair("https://example.com/c", "cached"))
            .await
            .unwrap();

        assert_eq!(engine.resolve("cached").await.unwrap().as_str(), "https://example.com/c");
        assert_eq!(
            engine.shorten("https://example.com/c").await.unwrap(),
            ShortId::new("cached")
        );
        assert_eq!(engine.store().calls(), 0);
    }

    #[tokio::test]
    async fn shorten_resolve_shorten_scenario() {
        let engine = counting_engine();

        let s1 = engine.shorten("https://example.com/a").await.unwrap();
        let long = engine.resolve(s1.as_str()).await.unwrap();
        let s2 = engine.shorten("https://example.com/a").await.unwrap();

        assert_eq!(long.as_str(), "https://example.com/a");
        assert_eq!(s1, s2);
        assert_eq!(engine.store().inner.len(), 1);
    }

    #[tokio::test]
    async fn unreachable_cache_does_not_fail_requests() {
        let engine = ResolutionEngine::new(
            Arc::new(InMemoryStore::new()),
            Arc::new(UnreachableCache),
            SeqGenerator::with_prefix("u"),
        );

        let short = engine.shorten("https://example.com/a").await.unwrap();
        let long = engine.resolve(short.as_str()).await.unwrap();

        assert_eq!(long.as_str(), "https://example.com/a");
    }

    #[tokio::test]
    async fn store_failure_is_surfaced() {
        let engine = ResolutionEngine::new(
            Arc::new(UnreachableStore),
            Arc::new(MokaLinkCache::new()),
            SeqGenerator::with_prefix("s"),
        );

        assert!(matches!(
            engine.shorten("https://example.com/a").await,
            Err(ResolveError::StoreUnavailable(StoreError::Unavailable(_)))
        ));
        assert!(matches!(
            engine.resolve("abc").await,
            Err(ResolveError::StoreUnavailable(StoreError::Timeout(_)))
        ));
    }

    #[tokio::test]
    async fn generator_failure_is_surfaced_and_nothing_is_stored() {
        let store = Arc::new(InMemoryStore::new());
        let engine = ResolutionEngine::new(
            Arc::clone(&store),
            Arc::new(MokaLinkCache::new()),
            NoEntropy,
        );

        let err = engine.shorten("https://example.com/a").await.unwrap_err();

        assert!(matches!(err, ResolveError::IdentifierUnavailable(_)));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn works_behind_trait_objects() {
        let store: Arc<dyn LinkStore> = Arc::new(InMemoryStore::new());
        let cache: Arc<dyn LinkCache> = Arc::new(MokaLinkCache::new());
        let engine: Arc<dyn Resolver> =
            Arc::new(ResolutionEngine::new(store, cache, NanoIdGenerator::new()));

        let short = engine.shorten("https://example.com/dyn").await.unwrap();
        assert_eq!(short.as_str().len(), 21);
        assert_eq!(
            engine.resolve(short.as_str()).await.unwrap().as_str(),
            "https://example.com/dyn"
        );
    }
}
