//! Uniqueness-violation classification.
//!
//! A write path registers the constraints it knows how to explain; when the
//! storage layer raises a uniqueness violation, the violated constraint's
//! name picks the domain-level conflict message. Anything the map does not
//! recognize stays an internal error so unexpected failures remain visible.

use super::constraints;
use super::DatabaseError;
use crate::error::ApiError;

/// Postgres SQLSTATE for unique_violation
const UNIQUE_VIOLATION: &str = "23505";

/// Constraints a single write path can violate, with the client-facing
/// message for each.
pub struct ConstraintMap {
    entries: &'static [(&'static str, &'static str)],
}

impl ConstraintMap {
    pub fn message_for(&self, constraint: &str) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(name, _)| *name == constraint)
            .map(|(_, message)| *message)
    }
}

pub const CATEGORY_WRITE: ConstraintMap = ConstraintMap {
    entries: &[
        (
            constraints::CATEGORY_NAME_KEY,
            "Category with this name already exists",
        ),
        (
            constraints::CATEGORY_SUBCATEGORY_PKEY,
            "Category and subcategory already linked",
        ),
    ],
};

pub const SUBCATEGORY_WRITE: ConstraintMap = ConstraintMap {
    entries: &[
        (
            constraints::SUBCATEGORY_NAME_KEY,
            "Subcategory with this name already exists",
        ),
        (
            constraints::CATEGORY_SUBCATEGORY_PKEY,
            "Subcategory and category already linked",
        ),
        (
            constraints::SUBCATEGORY_PRODUCT_PKEY,
            "Subcategory and product already linked",
        ),
    ],
};

pub const PRODUCT_WRITE: ConstraintMap = ConstraintMap {
    entries: &[
        (
            constraints::PRODUCT_NAME_KEY,
            "Product with this name already exists",
        ),
        (
            constraints::SUBCATEGORY_PRODUCT_PKEY,
            "Product and subcategory already linked",
        ),
    ],
};

/// Pure decision core: does this (SQLSTATE, constraint) pair name a known
/// conflict for the write path?
fn match_unique_violation(
    code: Option<&str>,
    constraint: Option<&str>,
    map: &ConstraintMap,
) -> Option<&'static str> {
    if code != Some(UNIQUE_VIOLATION) {
        return None;
    }
    map.message_for(constraint?)
}

/// Translate a storage error raised during a write into its API response.
///
/// Must be called only after the surrounding transaction has been rolled
/// back. Violations of constraints outside `map` are logged and surface as
/// 500s instead of being masked as a known conflict.
pub fn classify(err: DatabaseError, map: &ConstraintMap) -> ApiError {
    if let DatabaseError::Sqlx(sqlx::Error::Database(db_err)) = &err {
        if let Some(message) =
            match_unique_violation(db_err.code().as_deref(), db_err.constraint(), map)
        {
            return ApiError::conflict(message);
        }
    }
    ApiError::from(err)
}

/// True when `err` is a uniqueness violation of exactly `constraint`.
/// For write paths with a single known constraint (user registration).
pub fn violates(err: &DatabaseError, constraint: &str) -> bool {
    if let DatabaseError::Sqlx(sqlx::Error::Database(db_err)) = err {
        return db_err.code().as_deref() == Some(UNIQUE_VIOLATION)
            && db_err.constraint() == Some(constraint);
    }
    false
}
