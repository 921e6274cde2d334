use sqlx::{PgPool, Postgres, Transaction};
use std::collections::HashMap;

use super::group_pairs;
use crate::database::models::{Product, Subcategory};
use crate::database::DatabaseError;
use crate::pagination::cursor::Marker;
use crate::pagination::page;

const COLUMNS: &str = "id, name, description, created_at";

pub async fn list_page(
    pool: &PgPool,
    marker: Option<&Marker>,
) -> Result<Vec<Product>, DatabaseError> {
    let rows = match marker {
        Some(m) => {
            let sql = format!(
                "SELECT {COLUMNS} FROM product WHERE id {} $1 ORDER BY id {} LIMIT $2",
                m.comparison(),
                m.sort_order()
            );
            sqlx::query_as::<_, Product>(&sql)
                .bind(m.key)
                .bind(page::fetch_limit())
                .fetch_all(pool)
                .await?
        }
        None => {
            let sql = format!("SELECT {COLUMNS} FROM product ORDER BY id ASC LIMIT $1");
            sqlx::query_as::<_, Product>(&sql)
                .bind(page::fetch_limit())
                .fetch_all(pool)
                .await?
        }
    };
    Ok(rows)
}

/// Exact-name lookup for the filter mode of the collection GET.
pub async fn find_by_name(pool: &PgPool, name: &str) -> Result<Vec<Product>, DatabaseError> {
    let sql = format!("SELECT {COLUMNS} FROM product WHERE name = $1");
    let rows = sqlx::query_as::<_, Product>(&sql)
        .bind(name)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn find(pool: &PgPool, id: i64) -> Result<Option<Product>, DatabaseError> {
    let sql = format!("SELECT {COLUMNS} FROM product WHERE id = $1");
    let row = sqlx::query_as::<_, Product>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn resolve(
    tx: &mut Transaction<'_, Postgres>,
    ids: &[i64],
) -> Result<Vec<i64>, DatabaseError> {
    let found = sqlx::query_scalar::<_, i64>("SELECT id FROM product WHERE id = ANY($1)")
        .bind(ids)
        .fetch_all(&mut **tx)
        .await?;
    Ok(found)
}

pub async fn insert(
    tx: &mut Transaction<'_, Postgres>,
    name: &str,
    description: Option<&str>,
) -> Result<Product, DatabaseError> {
    let sql = format!("INSERT INTO product (name, description) VALUES ($1, $2) RETURNING {COLUMNS}");
    let product = sqlx::query_as::<_, Product>(&sql)
        .bind(name)
        .bind(description)
        .fetch_one(&mut **tx)
        .await?;
    Ok(product)
}

pub async fn update_name(
    tx: &mut Transaction<'_, Postgres>,
    id: i64,
    name: &str,
) -> Result<(), DatabaseError> {
    sqlx::query("UPDATE product SET name = $1 WHERE id = $2")
        .bind(name)
        .bind(id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

/// `None` clears the description; the handler distinguishes an absent field
/// from an explicit null before calling this.
pub async fn update_description(
    tx: &mut Transaction<'_, Postgres>,
    id: i64,
    description: Option<&str>,
) -> Result<(), DatabaseError> {
    sqlx::query("UPDATE product SET description = $1 WHERE id = $2")
        .bind(description)
        .bind(id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, DatabaseError> {
    let result = sqlx::query("DELETE FROM product WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn link_subcategories(
    tx: &mut Transaction<'_, Postgres>,
    product_id: i64,
    subcategory_ids: &[i64],
) -> Result<(), DatabaseError> {
    for subcategory_id in subcategory_ids {
        sqlx::query("INSERT INTO subcategory_product (subcategory_id, product_id) VALUES ($1, $2)")
            .bind(subcategory_id)
            .bind(product_id)
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}

pub async fn subcategory_ids_for(
    pool: &PgPool,
    product_ids: &[i64],
) -> Result<HashMap<i64, Vec<i64>>, DatabaseError> {
    if product_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = sqlx::query_as::<_, (i64, i64)>(
        "SELECT product_id, subcategory_id FROM subcategory_product \
         WHERE product_id = ANY($1) ORDER BY subcategory_id",
    )
    .bind(product_ids)
    .fetch_all(pool)
    .await?;
    Ok(group_pairs(rows))
}

pub async fn subcategories_of(
    pool: &PgPool,
    product_id: i64,
) -> Result<Vec<Subcategory>, DatabaseError> {
    let rows = sqlx::query_as::<_, Subcategory>(
        "SELECT s.id, s.name, s.created_at FROM subcategory s \
         JOIN subcategory_product sp ON sp.subcategory_id = s.id \
         WHERE sp.product_id = $1 ORDER BY s.id",
    )
    .bind(product_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
