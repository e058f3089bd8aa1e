use serde::Serialize;
use utoipa::ToSchema;

pub const PAGE_SIZE_DEFAULT: usize = 20;
pub const PAGE_SIZE_MAX: usize = 100;

/// Resolve the requested `page[offset]` / `page[limit]` pair.
///
/// Offset falls back to 0 when absent, unparseable or negative. Limit falls
/// back to [`PAGE_SIZE_DEFAULT`] when absent or not positive and is capped at
/// [`PAGE_SIZE_MAX`].
pub fn compute_paging_limits(offset: Option<&str>, limit: Option<i64>) -> (usize, usize) {
    let offset = offset.and_then(|o| o.trim().parse::<i64>().ok()).filter(|o| *o > 0).unwrap_or(0) as usize;

    let limit = match limit {
        Some(l) if l > 0 => (l as usize).min(PAGE_SIZE_MAX),
        _ => PAGE_SIZE_DEFAULT,
    };

    (offset, limit)
}

/// Window into a list of `len` items.
///
/// The offset is clamped to `len`; when the window overruns the list the
/// limit itself is reduced to `len`, and the slice end never passes `len`.
/// Returns the effective `(offset, limit, end)`.
pub fn page_window(len: usize, offset: usize, limit: usize) -> (usize, usize, usize) {
    let offset = offset.min(len);
    let limit = if offset + limit > len { len } else { limit };
    let end = (offset + limit).min(len);
    (offset, limit, end)
}

#[derive(Debug, Default, Serialize, ToSchema, PartialEq)]
pub struct PagingLinks {
    pub first: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    pub last: String,
}

fn page_link(path: &str, offset: i64, limit: i64) -> String {
    format!("{path}?page[offset]={offset}&page[limit]={limit}")
}

impl PagingLinks {
    /// Links around the page of `result_len` items taken at `offset`
    pub fn new(path: &str, result_len: usize, offset: usize, limit: usize, count: usize) -> Self {
        let (result_len, offset, count) = (result_len as i64, offset as i64, count as i64);
        let limit = limit.max(1) as i64;

        let prev = (offset > 0 && count > 0).then(|| {
            let mut prev_start = if offset <= count {
                offset - limit
            } else {
                // first range intersecting the end of the list
                offset - (((offset - count) / limit) + 1) * limit
            };
            let mut real_limit = limit;
            if prev_start < 0 {
                real_limit = limit + prev_start;
                prev_start = 0;
            }
            page_link(path, prev_start, real_limit)
        });

        let next_start = offset + result_len;
        let next = (next_start < count).then(|| page_link(path, next_start, limit));

        // second page starts where the first one ends
        let first_end = match offset % limit {
            0 => limit,
            rest => rest,
        };
        let first = page_link(path, 0, first_end);

        let mut last_start = if offset < count {
            offset + ((count - offset - 1) / limit) * limit
        } else {
            offset - (((offset - count) / limit) + 1) * limit
        };
        let mut real_limit = limit;
        if last_start < 0 {
            real_limit = limit + last_start;
            last_start = 0;
        }
        let last = page_link(path, last_start, real_limit);

        Self {
            first,
            prev,
            next,
            last,
        }
    }
}
