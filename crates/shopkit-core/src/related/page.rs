/// Page bookkeeping for the ranked list. `current_page` echoes the request
/// even when it lands past the end of the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub current_page: i64,
    pub total_pages: i64,
    pub total_items: i64,
    pub items_per_page: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

/// Computes pagination over `total_items` entries. `page` and `limit` are
/// already validated (`page >= 1`, `limit >= 1`).
#[must_use]
pub fn paginate(total_items: i64, page: i64, limit: i64) -> Pagination {
    let total_pages = if total_items == 0 {
        0
    } else {
        (total_items + limit - 1) / limit
    };

    Pagination {
        current_page: page,
        total_pages,
        total_items,
        items_per_page: limit,
        has_next: page < total_pages,
        has_prev: page > 1,
    }
}

/// The slice of `items` belonging to `page`. A page past the end yields an
/// empty slice rather than an error.
#[must_use]
pub fn page_slice<T>(items: &[T], page: i64, limit: i64) -> &[T] {
    let start = (page - 1).saturating_mul(limit);
    let Ok(start) = usize::try_from(start) else {
        return &[];
    };
    if start >= items.len() {
        return &[];
    }
    let end = usize::try_from(limit)
        .ok()
        .and_then(|l| start.checked_add(l))
        .map_or(items.len(), |end| end.min(items.len()));
    &items[start..end]
}
