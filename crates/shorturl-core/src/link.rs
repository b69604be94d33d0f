use crate::error::ResolveError;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use url::Url;

/// A client supplied URL that has been validated as an absolute URI.
///
/// The original text is kept verbatim. Parsing only decides whether the
/// input is acceptable; it never normalizes it, so the exact string given
/// to shorten is the one resolve hands back.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct LongUrl(String);

impl LongUrl {
    /// Validates `raw` as an absolute URI.
    ///
    /// Rejects empty input, input with surrounding whitespace, input with
    /// spaces or ASCII control characters anywhere, and relative references
    /// (`example.com/a`, `/a`). Opaque URIs such as
    /// `mailto:someone@example.com` are accepted.
    pub fn parse(raw: impl Into<String>) -> std::result::Result<Self, ResolveError> {
        let raw = raw.into();

        if raw.is_empty() {
            return Err(ResolveError::InvalidInput("URL cannot be empty".to_string()));
        }

        if raw.trim() != raw {
            return Err(ResolveError::InvalidInput(format!(
                "URL must not have leading or trailing whitespace: '{}'",
                raw.escape_debug()
            )));
        }

        // The parser silently drops tabs and newlines, and the raw text is
        // what gets stored.
        if raw.chars().any(|c| c == ' ' || c.is_ascii_control()) {
            return Err(ResolveError::InvalidInput(format!(
                "URL contains a space or control character: '{}'",
                raw.escape_debug()
            )));
        }

        Url::parse(&raw).map_err(|e| {
            ResolveError::InvalidInput(format!("'{raw}' is not an absolute URI: {e}"))
        })?;

        Ok(Self(raw))
    }

    /// Wraps a value without validation.
    ///
    /// Use this only for values read back from the store or cache, which
    /// were validated before they were first written.
    pub fn new_unchecked(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl Display for LongUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// An opaque short identifier.
///
/// Identifiers are minted by a generator and never supplied by clients, so
/// nothing in the system depends on their internal structure. Any string is
/// a valid lookup key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShortId(String);

impl ShortId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl Display for ShortId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ShortId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ShortId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// A long URL together with the short identifier it is known by.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct LinkPair {
    pub long: LongUrl,
    pub short: ShortId,
}

impl LinkPair {
    pub fn new(long: LongUrl, short: ShortId) -> Self {
        Self { long, short }
    }
}
