//! Limit/offset pagination for list queries.

use serde::{Deserialize, Serialize};

/// Default number of rows returned by a list query.
pub const DEFAULT_LIMIT: u64 = 50;

/// Upper bound on rows returned by a single list query.
pub const MAX_LIMIT: u64 = 500;

/// Request parameters for paginated queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Maximum number of items to return.
    #[serde(default = "default_limit")]
    pub limit: u64,
    /// Number of items to skip.
    #[serde(default)]
    pub offset: u64,
}

fn default_limit() -> u64 {
    DEFAULT_LIMIT
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            offset: 0,
        }
    }
}

impl PageRequest {
    /// Creates a page request.
    #[must_use]
    pub const fn new(limit: u64, offset: u64) -> Self {
        Self { limit, offset }
    }

    /// Returns the limit clamped to `1..=MAX_LIMIT`.
    #[must_use]
    pub fn limit(&self) -> u64 {
        self.limit.clamp(1, MAX_LIMIT)
    }

    /// Returns the offset for database queries.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.offset
    }
}

/// A page of results together with the unpaginated total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    /// The items in the current page.
    pub data: Vec<T>,
    /// Total number of matching items across all pages.
    pub total: u64,
}

impl<T> Page<T> {
    /// Creates a new page.
    #[must_use]
    pub const fn new(data: Vec<T>, total: u64) -> Self {
        Self { data, total }
    }

    /// Maps the items of the page, keeping the total.
    #[must_use]
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            data: self.data.into_iter().map(f).collect(),
            total: self.total,
        }
    }
}
