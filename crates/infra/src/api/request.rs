//! Request and response values passed between the client layers

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

/// Query parameters of a request.
///
/// Keys are kept sorted, so two queries holding the same parameters serialize
/// identically regardless of insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Query(BTreeMap<String, Value>);

impl Query {
    /// Empty query
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Set `key`, replacing any earlier value
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// True if no parameters are set
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Key-sorted JSON serialization used for request fingerprints.
    pub fn canonical(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_default()
    }

    /// Flatten into URL query pairs. Arrays repeat their key, nulls are
    /// dropped and nested objects are sent as JSON text.
    pub fn pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(self.0.len());
        for (key, value) in &self.0 {
            match value {
                Value::Array(items) => {
                    for item in items {
                        if let Some(text) = scalar_text(item) {
                            pairs.push((key.clone(), text));
                        }
                    }
                }
                other => {
                    if let Some(text) = scalar_text(other) {
                        pairs.push((key.clone(), text));
                    }
                }
            }
        }
        pairs
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

impl<K, V> FromIterator<(K, V)> for Query
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Per-read caching and coalescing options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadOptions {
    /// How long a successful response stays cached; `None` uses the client's
    /// configured default and a zero duration disables caching.
    pub ttl: Option<Duration>,
    /// Join an identical read that is already underway.
    pub dedupe: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self { ttl: None, dedupe: true }
    }
}

impl ReadOptions {
    /// Cache successful results for `ttl`
    pub fn cached_for(ttl: Duration) -> Self {
        Self { ttl: Some(ttl), dedupe: true }
    }

    /// Coalesce concurrent calls but never cache the result.
    pub fn fresh() -> Self {
        Self::cached_for(Duration::ZERO)
    }

    #[must_use]
    pub fn without_dedupe(mut self) -> Self {
        self.dedupe = false;
        self
    }
}

/// One outbound API call
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the API base URL
    pub path: String,
    pub query: Query,
    pub body: Option<Value>,
    pub headers: HeaderMap,
    /// Set on the single re-dispatch that follows a credential refresh
    pub is_retry: bool,
}

impl ApiRequest {
    /// Request without query, body or headers
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Query::new(),
            body: None,
            headers: HeaderMap::new(),
            is_retry: false,
        }
    }

    /// GET request for `path`
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    #[must_use]
    pub fn with_query(mut self, query: Query) -> Self {
        self.query = query;
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: Option<Value>) -> Self {
        self.body = body;
        self
    }

    /// Reads never invalidate the cache; everything else is a write.
    pub fn is_write(&self) -> bool {
        !matches!(self.method, Method::GET | Method::HEAD | Method::OPTIONS)
    }

    /// Token carried in the `Authorization: Bearer` header, if any.
    pub fn bearer_token(&self) -> Option<&str> {
        self.headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
    }

    /// Replace the authorization header. Returns `false` (and leaves the
    /// request untouched) when the token is not a valid header value.
    pub fn set_bearer(&mut self, token: &str) -> bool {
        match HeaderValue::from_str(&format!("Bearer {token}")) {
            Ok(mut value) => {
                value.set_sensitive(true);
                self.headers.insert(AUTHORIZATION, value);
                true
            }
            Err(err) => {
                warn!(error = %err, "access token is not a valid header value; sending without it");
                false
            }
        }
    }
}

/// A successful API response
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    /// Parsed JSON body; `Null` for empty bodies, a JSON string for non-JSON text
    pub body: Value,
}
