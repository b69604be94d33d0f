//! Persistent store backends for shorturl.
//!
//! Both backends implement [`LinkStore`] and keep duplicate
//! records visible: uniqueness of a long URL or short identifier is checked
//! by the resolution engine, not enforced here.

pub mod memory;
pub mod mysql;

pub use memory::InMemoryStore;
pub use mysql::{MySqlStore, MySqlStoreOptions};
pub use shorturl_core::{LinkStore, StoreError};
