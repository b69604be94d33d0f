use std::sync::Arc;
use std::time::Duration;

use shorturl_core::Resolver;
use shorturl_resolver::CacheHealth;

#[derive(Clone)]
pub struct AppState {
    resolver: Arc<dyn Resolver>,
    cache_health: CacheHealth,
    request_timeout: Duration,
}

impl AppState {
    pub fn new(
        resolver: Arc<dyn Resolver>,
        cache_health: CacheHealth,
        request_timeout: Duration,
    ) -> Self {
        Self {
            resolver,
            cache_health,
            request_timeout,
        }
    }

    pub fn resolver(&self) -> &dyn Resolver {
        self.resolver.as_ref()
    }

    pub fn cache_health(&self) -> &CacheHealth {
        &self.cache_health
    }

    /// Deadline applied to each resolver call.
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }
}
