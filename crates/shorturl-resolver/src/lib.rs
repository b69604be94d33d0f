//! The link-resolution engine.
//!
//! [`ResolutionEngine`] implements [`Resolver`] on top of any
//! [`LinkStore`](shorturl_core::LinkStore) / [`LinkCache`](shorturl_core::LinkCache)
//! pair using the cache-aside pattern. [`CacheHealthCheck`] is the
//! background liveness probe for the cache.

pub mod engine;
pub mod health;

pub use engine::ResolutionEngine;
pub use health::{CacheHealth, CacheHealthCheck};
pub use shorturl_core::{ResolveError, Resolver};
