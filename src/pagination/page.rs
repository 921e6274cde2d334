//! Keyset page assembly.
//!
//! Repositories fetch `PER_PAGE + 1` rows ordered by id (descending when
//! resuming backward); the extra row answers "is there more?" without a
//! count query. This module turns that window plus the request marker into
//! a page with next/previous bookmarks.

use super::cursor::{self, Direction, Marker};

/// Fixed page size per collection; not client-configurable.
pub const PER_PAGE: usize = 10;

/// Number of rows repositories should fetch for one page.
pub fn fetch_limit() -> i64 {
    PER_PAGE as i64 + 1
}

#[derive(Debug)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next: Option<String>,
    pub prev: Option<String>,
}

/// Assemble a page from a fetched window.
///
/// `rows` must come ordered by the sort key: ascending for forward windows,
/// descending for backward windows (as fetched; they are reversed here so
/// items always leave in ascending order).
pub fn assemble<T>(
    mut rows: Vec<T>,
    marker: Option<&Marker>,
    per_page: usize,
    key: impl Fn(&T) -> i64,
) -> Page<T> {
    let backward = matches!(
        marker,
        Some(Marker {
            direction: Direction::Before,
            ..
        })
    );

    let has_extra = rows.len() > per_page;
    rows.truncate(per_page);

    let (has_next, has_previous) = if backward {
        // The extra row lies further back; anything at or past the marker
        // means forward browsing can continue.
        (!rows.is_empty(), has_extra)
    } else {
        (has_extra, marker.is_some() && !rows.is_empty())
    };

    if backward {
        rows.reverse();
    }

    let next = match (has_next, rows.last()) {
        (true, Some(last)) => Some(cursor::encode(&Marker::after(key(last)))),
        _ => None,
    };
    let prev = match (has_previous, rows.first()) {
        (true, Some(first)) => Some(cursor::encode(&Marker::before(key(first)))),
        _ => None,
    };

    Page {
        items: rows,
        next,
        prev,
    }
}
