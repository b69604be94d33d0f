//! Core types and traits for the shorturl link-resolution engine.
//!
//! This crate provides the domain types shared by every backend crate and
//! the traits the resolution engine is written against: [`LinkStore`] for
//! the authoritative store, [`LinkCache`] for the disposable cache and
//! [`Resolver`] for the two request-level operations.

pub mod cache;
pub mod error;
pub mod link;
pub mod resolver;
pub mod store;

pub use cache::LinkCache;
pub use error::{CacheError, GeneratorError, ResolveError, StoreError};
pub use link::{LinkPair, LongUrl, ShortId};
pub use resolver::Resolver;
pub use store::LinkStore;
