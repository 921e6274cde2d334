//! Static constraint registry.
//!
//! Constraint names are fixed at schema-definition time and maintained by
//! hand here, so write paths can match a raised violation against the
//! constraints they expect without introspecting the catalog at runtime.
//! Names follow the Postgres default convention: `<table>_<column>_key`
//! for unique constraints, `<table>_pkey` for primary keys.

pub const CATEGORY_NAME_KEY: &str = "category_name_key";
pub const SUBCATEGORY_NAME_KEY: &str = "subcategory_name_key";
pub const PRODUCT_NAME_KEY: &str = "product_name_key";
pub const CATEGORY_SUBCATEGORY_PKEY: &str = "category_subcategory_pkey";
pub const SUBCATEGORY_PRODUCT_PKEY: &str = "subcategory_product_pkey";
pub const USERS_EMAIL_NORMALIZED_KEY: &str = "users_email_normalized_key";

/// Every constraint a write path may classify, for schema cross-checks.
pub const ALL: &[&str] = &[
    CATEGORY_NAME_KEY,
    SUBCATEGORY_NAME_KEY,
    PRODUCT_NAME_KEY,
    CATEGORY_SUBCATEGORY_PKEY,
    SUBCATEGORY_PRODUCT_PKEY,
    USERS_EMAIL_NORMALIZED_KEY,
];
