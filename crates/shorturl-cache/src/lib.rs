//! [`LinkCache`] implementations: an in-process Moka cache, a Redis cache and
//! a two-level composition of the two.

pub mod layered;
pub mod moka;
pub mod redis;

pub use layered::LayeredCache;
pub use moka::{MokaCacheConfig, MokaLinkCache};
pub use redis::{RedisCacheOptions, RedisLinkCache};
pub use shorturl_core::cache::Result;
pub use shorturl_core::{CacheError, LinkCache};
