use crate::Generator;
use shorturl_core::{GeneratorError, ShortId};
use std::sync::atomic::{AtomicU64, Ordering};

/// A deterministic identifier generator using a sequential counter.
///
/// This generator produces codes like "seq000000", "seq000001", etc.
/// Identifiers are unique within a single instance only, which makes it
/// suitable for tests and local development but not for deployments with
/// more than one process.
#[derive(Debug)]
pub struct SeqGenerator {
    counter: AtomicU64,
    prefix: String,
}

impl Clone for SeqGenerator {
    fn clone(&self) -> Self {
        Self {
            counter: AtomicU64::new(self.counter.load(Ordering::SeqCst)),
            prefix: self.prefix.clone(),
        }
    }
}

impl SeqGenerator {
    /// Creates a new sequential generator with a custom prefix.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self::with_offset(prefix, 0)
    }

    /// Creates a new sequential generator starting from a specific counter value.
    pub fn with_offset(prefix: impl Into<String>, offset: u64) -> Self {
        Self {
            counter: AtomicU64::new(offset),
            prefix: prefix.into(),
        }
    }
}

impl Generator for SeqGenerator {
    fn generate(&self) -> Result<ShortId, GeneratorError> {
        let count = self
            .counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_add(1))
            .map_err(|_| {
                GeneratorError::Exhausted(format!("counter for prefix '{}'", self.prefix))
            })?;

        Ok(ShortId::new(format!("{}{:06}", self.prefix, count)))
    }
}
