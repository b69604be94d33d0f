use thiserror::Error;

/// Result type for request-level resolution operations.
pub type Result<T> = std::result::Result<T, ResolveError>;

#[derive(Debug, Clone, Error)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
    #[error("cache operation timed out: {0}")]
    Timeout(String),
    #[error("cache serialization failed: {0}")]
    Serialization(String),
    #[error("cache value is invalid: {0}")]
    InvalidData(String),
    #[error("cache initialization failed: {0}")]
    Initialization(String),
    #[error("cache operation failed: {0}")]
    Operation(String),
}

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("store backend unavailable: {0}")]
    Unavailable(String),
    #[error("store operation timed out: {0}")]
    Timeout(String),
    #[error("store query failed: {0}")]
    Query(String),
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
}

#[derive(Debug, Clone, Error)]
pub enum GeneratorError {
    #[error("entropy source unavailable: {0}")]
    EntropyUnavailable(String),
    #[error("identifier space exhausted: {0}")]
    Exhausted(String),
}

/// Errors surfaced by [`Resolver`](crate::Resolver) operations.
///
/// Cache failures never appear here: the engine degrades to the store path
/// when the cache misbehaves.
#[derive(Debug, Clone, Error)]
pub enum ResolveError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("short link does not exist: {0}")]
    NotFound(String),
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
    #[error("found {records} records in the store for '{key}'")]
    DataIntegrityViolation { key: String, records: usize },
    #[error("cannot generate a short identifier: {0}")]
    IdentifierUnavailable(#[from] GeneratorError),
}

impl ResolveError {
    /// Returns `true` when the failure was caused by the request itself
    /// rather than by the service or its dependencies.
    pub fn is_client_error(&self) -> bool {
        matches!(self, ResolveError::InvalidInput(_))
    }
}
