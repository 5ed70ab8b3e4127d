//! Cache key derivation.

use std::fmt;

use sha2::{Digest, Sha256};
use url::Url;

use crate::{Error, Request};

/// Identity of a cached request: method plus fragment-free URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    method: String,
    url: Url,
}

impl CacheKey {
    pub fn new(method: &str, mut url: Url) -> Self {
        url.set_fragment(None);
        Self { method: method.to_ascii_uppercase(), url }
    }

    /// Key for a GET of `url`.
    pub fn get(url: Url) -> Self {
        Self::new("GET", url)
    }

    pub fn for_request(request: &Request) -> Self {
        Self::new(&request.method, request.url.clone())
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Hex SHA-256 over `method\nurl`, used as the storage key.
    pub fn hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.method.as_bytes());
        hasher.update(b"\n");
        hasher.update(self.url.as_str().as_bytes());
        hex::encode(hasher.finalize())
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

/// Resolve a manifest identifier (e.g. `./icons/icon-192.png`) against the scope URL.
pub fn resolve_asset(scope: &Url, identifier: &str) -> Result<Url, Error> {
    let trimmed = identifier.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidUrl("empty asset identifier".into()));
    }

    let mut url = scope
        .join(trimmed)
        .map_err(|e| Error::InvalidUrl(format!("{identifier}: {e}")))?;
    url.set_fragment(None);
    Ok(url)
}
