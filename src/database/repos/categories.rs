use sqlx::{PgPool, Postgres, Transaction};
use std::collections::HashMap;

use super::group_pairs;
use crate::database::models::{Category, Product, Subcategory};
use crate::database::DatabaseError;
use crate::pagination::cursor::Marker;
use crate::pagination::page;

const COLUMNS: &str = "id, name, created_at";

pub async fn list_page(
    pool: &PgPool,
    marker: Option<&Marker>,
) -> Result<Vec<Category>, DatabaseError> {
    let rows = match marker {
        Some(m) => {
            let sql = format!(
                "SELECT {COLUMNS} FROM category WHERE id {} $1 ORDER BY id {} LIMIT $2",
                m.comparison(),
                m.sort_order()
            );
            sqlx::query_as::<_, Category>(&sql)
                .bind(m.key)
                .bind(page::fetch_limit())
                .fetch_all(pool)
                .await?
        }
        None => {
            let sql = format!("SELECT {COLUMNS} FROM category ORDER BY id ASC LIMIT $1");
            sqlx::query_as::<_, Category>(&sql)
                .bind(page::fetch_limit())
                .fetch_all(pool)
                .await?
        }
    };
    Ok(rows)
}

pub async fn find(pool: &PgPool, id: i64) -> Result<Option<Category>, DatabaseError> {
    let sql = format!("SELECT {COLUMNS} FROM category WHERE id = $1");
    let row = sqlx::query_as::<_, Category>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn exists(pool: &PgPool, id: i64) -> Result<bool, DatabaseError> {
    let found = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM category WHERE id = $1)")
        .bind(id)
        .fetch_one(pool)
        .await?;
    Ok(found)
}

/// Resolve which of the requested ids actually exist. Callers compare the
/// returned count against the request to reject unknown ids; the unique
/// constraints remain the authoritative backstop.
pub async fn resolve(
    tx: &mut Transaction<'_, Postgres>,
    ids: &[i64],
) -> Result<Vec<i64>, DatabaseError> {
    let found = sqlx::query_scalar::<_, i64>("SELECT id FROM category WHERE id = ANY($1)")
        .bind(ids)
        .fetch_all(&mut **tx)
        .await?;
    Ok(found)
}

pub async fn insert(
    tx: &mut Transaction<'_, Postgres>,
    name: &str,
) -> Result<Category, DatabaseError> {
    let sql = format!("INSERT INTO category (name) VALUES ($1) RETURNING {COLUMNS}");
    let category = sqlx::query_as::<_, Category>(&sql)
        .bind(name)
        .fetch_one(&mut **tx)
        .await?;
    Ok(category)
}

pub async fn update_name(
    tx: &mut Transaction<'_, Postgres>,
    id: i64,
    name: &str,
) -> Result<(), DatabaseError> {
    sqlx::query("UPDATE category SET name = $1 WHERE id = $2")
        .bind(name)
        .bind(id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

/// Link rows cascade via their foreign keys, so a plain delete suffices.
pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, DatabaseError> {
    let result = sqlx::query("DELETE FROM category WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Insert one link row per subcategory; a duplicate pair surfaces as a
/// uniqueness violation for the caller to classify.
pub async fn link_subcategories(
    tx: &mut Transaction<'_, Postgres>,
    category_id: i64,
    subcategory_ids: &[i64],
) -> Result<(), DatabaseError> {
    for subcategory_id in subcategory_ids {
        sqlx::query("INSERT INTO category_subcategory (category_id, subcategory_id) VALUES ($1, $2)")
            .bind(category_id)
            .bind(subcategory_id)
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}

/// Batched related-id read for a page of categories.
pub async fn subcategory_ids_for(
    pool: &PgPool,
    category_ids: &[i64],
) -> Result<HashMap<i64, Vec<i64>>, DatabaseError> {
    if category_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = sqlx::query_as::<_, (i64, i64)>(
        "SELECT category_id, subcategory_id FROM category_subcategory \
         WHERE category_id = ANY($1) ORDER BY subcategory_id",
    )
    .bind(category_ids)
    .fetch_all(pool)
    .await?;
    Ok(group_pairs(rows))
}

pub async fn subcategories_of(
    pool: &PgPool,
    category_id: i64,
) -> Result<Vec<Subcategory>, DatabaseError> {
    let rows = sqlx::query_as::<_, Subcategory>(
        "SELECT s.id, s.name, s.created_at FROM subcategory s \
         JOIN category_subcategory cs ON cs.subcategory_id = s.id \
         WHERE cs.category_id = $1 ORDER BY s.id",
    )
    .bind(category_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Products reachable through any of the category's subcategories,
/// deduplicated, as one keyset window.
pub async fn products_page(
    pool: &PgPool,
    category_id: i64,
    marker: Option<&Marker>,
) -> Result<Vec<Product>, DatabaseError> {
    const BASE: &str = "SELECT DISTINCT p.id, p.name, p.description, p.created_at \
         FROM product p \
         JOIN subcategory_product sp ON sp.product_id = p.id \
         JOIN category_subcategory cs ON cs.subcategory_id = sp.subcategory_id \
         WHERE cs.category_id = $1";

    let rows = match marker {
        Some(m) => {
            let sql = format!(
                "{BASE} AND p.id {} $2 ORDER BY p.id {} LIMIT $3",
                m.comparison(),
                m.sort_order()
            );
            sqlx::query_as::<_, Product>(&sql)
                .bind(category_id)
                .bind(m.key)
                .bind(page::fetch_limit())
                .fetch_all(pool)
                .await?
        }
        None => {
            let sql = format!("{BASE} ORDER BY p.id ASC LIMIT $2");
            sqlx::query_as::<_, Product>(&sql)
                .bind(category_id)
                .bind(page::fetch_limit())
                .fetch_all(pool)
                .await?
        }
    };
    Ok(rows)
}
