use std::fmt;

use reqwest::Method;

use super::request::Query;

/// Identity of a read: method, path and canonical query.
///
/// Two requests share a fingerprint exactly when they would fetch the same
/// resource, so the value keys both the response cache and the in-flight
/// registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Fingerprint of `method` on `path` with `query` in canonical order
    pub fn new(method: &Method, path: &str, query: &Query) -> Self {
        Self(format!("{method} {path}|{}", query.canonical()))
    }

    /// Fingerprint text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
