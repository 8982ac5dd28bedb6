//! Shared pagination utilities
//!
//! List endpoints answer with `{ data, meta, stats }`:
//!
//! ```json
//! {
//!   "data": [ ... ],
//!   "meta": { "total": 42, "page": 2, "limit": 10, "totalPages": 5 },
//!   "stats": { ... }
//! }
//! ```

use serde::{Deserialize, Serialize};

/// Default page size for list queries.
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Upper bound on a single page.
pub const MAX_PAGE_SIZE: i64 = 100;

/// `page`/`limit` request parameters.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageParams {
    pub fn validate(&self) -> Result<(), &'static str> {
        if let Some(page) = self.page {
            if page < 1 {
                return Err("page must be greater than 0");
            }
        }
        if let Some(limit) = self.limit {
            if !(1..=MAX_PAGE_SIZE).contains(&limit) {
                return Err("limit must be between 1 and 100");
            }
        }
        Ok(())
    }

    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.limit()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
}

impl PageMeta {
    pub fn new(params: &PageParams, total: i64) -> Self {
        let limit = params.limit();
        Self {
            total,
            page: params.page(),
            limit,
            total_pages: (total + limit - 1) / limit,
        }
    }
}

/// A page of rows plus aggregate counts over the whole filtered set.
#[derive(Debug, Clone, Serialize)]
pub struct ListResponse<T, S> {
    pub data: Vec<T>,
    pub meta: PageMeta,
    pub stats: S,
}
