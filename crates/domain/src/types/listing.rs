//! List response shapes
//!
//! Collection endpoints answer either with a pagination envelope
//! (`{count, next, previous, results}`) or with a bare JSON array.
//! [`Listing`] accepts both so callers never branch on the endpoint.

use serde::{Deserialize, Serialize};

/// Pagination envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

/// A list response, paginated or not
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Listing<T> {
    Paginated(Page<T>),
    Bare(Vec<T>),
}

impl<T> Listing<T> {
    /// Items on this page (or the whole bare array)
    pub fn items(&self) -> &[T] {
        match self {
            Self::Paginated(page) => &page.results,
            Self::Bare(items) => items,
        }
    }

    /// Consume into the items
    pub fn into_items(self) -> Vec<T> {
        match self {
            Self::Paginated(page) => page.results,
            Self::Bare(items) => items,
        }
    }

    /// Total number of items on the server (the page length for bare arrays).
    pub fn total(&self) -> u64 {
        match self {
            Self::Paginated(page) => page.count,
            Self::Bare(items) => items.len() as u64,
        }
    }

    /// URL of the next page, if the server paginates and there is one.
    pub fn next(&self) -> Option<&str> {
        match self {
            Self::Paginated(page) => page.next.as_deref(),
            Self::Bare(_) => None,
        }
    }
}
