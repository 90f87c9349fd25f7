use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;
pub const MAX_LIMIT: u64 = 100;

/// `?page=&limit=` as sent by the admin view. Kept as raw strings so that
/// non-numeric values fall back to the defaults instead of failing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl ListQuery {
    /// Resolve to `(page, limit)`: page is at least 1, limit is in 1..=100.
    pub fn resolve(&self) -> (u64, u64) {
        let parse = |raw: &Option<String>| raw.as_deref().and_then(|v| v.trim().parse::<i64>().ok());
        let page = match parse(&self.page) {
            Some(p) if p >= 1 => p as u64,
            _ => DEFAULT_PAGE,
        };
        let limit = match parse(&self.limit) {
            Some(l) if l >= 1 => (l as u64).min(MAX_LIMIT),
            _ => DEFAULT_LIMIT,
        };
        (page, limit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub pages: u64,
}

impl Pagination {
    pub fn new(page: u64, limit: u64, total: u64) -> Self {
        Pagination { page, limit, total, pages: total.div_ceil(limit.max(1)) }
    }
}

/// One page of leads plus the paging block.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page { items: self.items.into_iter().map(f).collect(), pagination: self.pagination }
    }
}

/// Success envelope shared by every JSON endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse { success: true, message: None, data, pagination: None }
    }

    pub fn with_message(message: impl Into<String>, data: T) -> Self {
        ApiResponse { success: true, message: Some(message.into()), data, pagination: None }
    }
}

impl<T: Serialize> ApiResponse<Vec<T>> {
    pub fn page(page: Page<T>) -> Self {
        ApiResponse { success: true, message: None, data: page.items, pagination: Some(page.pagination) }
    }
}

/// Body of `PUT /api/{kind}/{id}/status`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: Option<String>,
}
