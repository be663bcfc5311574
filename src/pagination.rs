//! Paginated response envelope

use serde::Serialize;

/// Paginated response envelope
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResponse<T: Serialize> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

/// Pagination metadata
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
    pub total_pages: u64,
}

/// Clamp raw query parameters to a valid (page, per_page) pair
pub fn normalize(page: Option<u64>, per_page: Option<u64>) -> (u64, u64) {
    (page.unwrap_or(1).max(1), per_page.unwrap_or(20).clamp(1, 100))
}

/// Slice one page out of an already filtered and ordered list
pub fn paginate<T: Serialize>(items: Vec<T>, page: u64, per_page: u64) -> PaginatedResponse<T> {
    let total = items.len() as u64;
    let total_pages = if total == 0 {
        0
    } else {
        total.div_ceil(per_page.max(1))
    };

    let offset = page.saturating_sub(1).saturating_mul(per_page);
    let start = usize::try_from(offset).unwrap_or(usize::MAX);
    let take = usize::try_from(per_page).unwrap_or(usize::MAX);
    let data = items.into_iter().skip(start).take(take).collect();

    PaginatedResponse {
        data,
        pagination: Pagination {
            page,
            per_page,
            total,
            total_pages,
        },
    }
}
