use serde::{Deserialize, Serialize};

/// Body of both API calls. For shorten `url` is the long URL, for resolve it
/// is the short identifier.
#[derive(Debug, Deserialize)]
pub struct LinkRequest {
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LinkResponse {
    pub url: String,
}

impl LinkResponse {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}
