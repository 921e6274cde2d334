//! Explicit per-entity repositories.
//!
//! Every query is written out, including join-table reads; related ids are
//! fetched in one batched query per page rather than per row.

use std::collections::HashMap;

pub mod categories;
pub mod products;
pub mod subcategories;
pub mod users;

/// Group (parent_id, child_id) join rows by parent.
pub(crate) fn group_pairs(rows: Vec<(i64, i64)>) -> HashMap<i64, Vec<i64>> {
    let mut grouped: HashMap<i64, Vec<i64>> = HashMap::new();
    for (parent, child) in rows {
        grouped.entry(parent).or_default().push(child);
    }
    grouped
}
