//! Request identity for cache lookups.
//!
//! Every cached response is addressed by the absolute path (plus query) of
//! the request URL on the worker's origin. Relative manifest entries such as
//! `./css/style.css` or `./` are resolved against the origin first, so the
//! same resource always lands under one key (`/css/style.css`, `/`).

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::Error;

/// Base used to resolve keys when no origin is at hand.
const KEY_BASE: &str = "http://localhost/";

/// Identity under which a response is stored and looked up.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct RequestKey(String);

impl RequestKey {
    /// Key for an already-resolved URL. The fragment never takes part.
    pub fn from_url(url: &Url) -> Self {
        let mut key = url.path().to_string();
        if let Some(query) = url.query() {
            key.push('?');
            key.push_str(query);
        }
        Self(key)
    }

    /// Rebuild a key read back from the store.
    pub(crate) fn from_stored(raw: String) -> Self {
        Self(raw)
    }

    /// Resolve `input` against `origin`, returning the full URL and its key.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidUrl` if the input cannot be parsed and
    /// `Error::CrossOrigin` if it resolves outside `origin`.
    pub fn resolve(origin: &Url, input: &str) -> Result<(Url, Self), Error> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidUrl("empty URL".into()));
        }

        let mut url = origin
            .join(trimmed)
            .map_err(|e| Error::InvalidUrl(format!("{trimmed}: {e}")))?;
        url.set_fragment(None);

        if url.origin() != origin.origin() {
            return Err(Error::CrossOrigin(url.to_string()));
        }

        let key = Self::from_url(&url);
        Ok((url, key))
    }

    /// Parse an origin-relative path into a key.
    pub fn parse(input: &str) -> Result<Self, Error> {
        let base = Url::parse(KEY_BASE).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        Self::resolve(&base, input).map(|(_, key)| key)
    }

    /// Full URL of this key on `origin`.
    pub fn url_on(&self, origin: &Url) -> Result<Url, Error> {
        origin
            .join(&self.0)
            .map_err(|e| Error::InvalidUrl(format!("{}: {e}", self.0)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RequestKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
