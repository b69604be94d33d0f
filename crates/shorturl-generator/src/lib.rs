pub mod nanoid;
pub mod seq;

pub use nanoid::NanoIdGenerator;
pub use seq::SeqGenerator;

use shorturl_core::{GeneratorError, ShortId};

/// Trait for generating short identifiers.
///
/// Implementations are pure generators that don't interact with storage.
/// The identifiers they produce must have negligible collision probability
/// across the identifier space actually in use.
pub trait Generator: Send + Sync + 'static {
    /// Produces a new short identifier.
    ///
    /// Fails only when the underlying source cannot produce one (e.g. the
    /// entropy source is unavailable). Callers surface the error rather
    /// than retrying.
    fn generate(&self) -> Result<ShortId, GeneratorError>;
}
