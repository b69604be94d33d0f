use crate::Generator;
use rand::rngs::OsRng;
use rand::RngCore;
use shorturl_core::{GeneratorError, ShortId};

/// URL-safe alphabet of exactly 64 symbols, so each random byte maps onto it
/// with a 6-bit mask and no bias.
pub const ALPHABET: &[u8; 64] = b"_-0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Default identifier length. 21 symbols give 126 bits of randomness.
pub const DEFAULT_SIZE: usize = 21;

const MASK: u8 = 63;

/// Random identifier generator in the NanoID style.
///
/// Every identifier is drawn from the operating system's entropy source.
#[derive(Debug, Clone)]
pub struct NanoIdGenerator {
    size: usize,
}

impl NanoIdGenerator {
    pub fn new() -> Self {
        Self { size: DEFAULT_SIZE }
    }

    /// Creates a generator producing identifiers of `size` symbols.
    /// Sizes below 1 are raised to 1.
    pub fn with_size(size: usize) -> Self {
        Self { size: size.max(1) }
    }

    pub fn size(&self) -> usize {
        self.size
    }
}

impl Default for NanoIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator for NanoIdGenerator {
    fn generate(&self) -> Result<ShortId, GeneratorError> {
        let mut bytes = vec![0_u8; self.size];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| GeneratorError::EntropyUnavailable(e.to_string()))?;

        let id: String = bytes
            .iter()
            .map(|byte| ALPHABET[usize::from(byte & MASK)] as char)
            .collect();

        Ok(ShortId::new(id))
    }
}
