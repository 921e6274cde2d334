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
) -> Result<Vec<Subcategory>, DatabaseError> {
    let rows = match marker {
        Some(m) => {
            let sql = format!(
                "SELECT {COLUMNS} FROM subcategory WHERE id {} $1 ORDER BY id {} LIMIT $2",
                m.comparison(),
                m.sort_order()
            );
            sqlx::query_as::<_, Subcategory>(&sql)
                .bind(m.key)
                .bind(page::fetch_limit())
                .fetch_all(pool)
                .await?
        }
        None => {
            let sql = format!("SELECT {COLUMNS} FROM subcategory ORDER BY id ASC LIMIT $1");
            sqlx::query_as::<_, Subcategory>(&sql)
                .bind(page::fetch_limit())
                .fetch_all(pool)
                .await?
        }
    };
    Ok(rows)
}

pub async fn find(pool: &PgPool, id: i64) -> Result<Option<Subcategory>, DatabaseError> {
    let sql = format!("SELECT {COLUMNS} FROM subcategory WHERE id = $1");
    let row = sqlx::query_as::<_, Subcategory>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn resolve(
    tx: &mut Transaction<'_, Postgres>,
    ids: &[i64],
) -> Result<Vec<i64>, DatabaseError> {
    let found = sqlx::query_scalar::<_, i64>("SELECT id FROM subcategory WHERE id = ANY($1)")
        .bind(ids)
        .fetch_all(&mut **tx)
        .await?;
    Ok(found)
}

pub async fn insert(
    tx: &mut Transaction<'_, Postgres>,
    name: &str,
) -> Result<Subcategory, DatabaseError> {
    let sql = format!("INSERT INTO subcategory (name) VALUES ($1) RETURNING {COLUMNS}");
    let subcategory = sqlx::query_as::<_, Subcategory>(&sql)
        .bind(name)
        .fetch_one(&mut **tx)
        .await?;
    Ok(subcategory)
}

pub async fn update_name(
    tx: &mut Transaction<'_, Postgres>,
    id: i64,
    name: &str,
) -> Result<(), DatabaseError> {
    sqlx::query("UPDATE subcategory SET name = $1 WHERE id = $2")
        .bind(name)
        .bind(id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, DatabaseError> {
    let result = sqlx::query("DELETE FROM subcategory WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn link_categories(
    tx: &mut Transaction<'_, Postgres>,
    subcategory_id: i64,
    category_ids: &[i64],
) -> Result<(), DatabaseError> {
    for category_id in category_ids {
        sqlx::query("INSERT INTO category_subcategory (category_id, subcategory_id) VALUES ($1, $2)")
            .bind(category_id)
            .bind(subcategory_id)
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}

pub async fn link_products(
    tx: &mut Transaction<'_, Postgres>,
    subcategory_id: i64,
    product_ids: &[i64],
) -> Result<(), DatabaseError> {
    for product_id in product_ids {
        sqlx::query("INSERT INTO subcategory_product (subcategory_id, product_id) VALUES ($1, $2)")
            .bind(subcategory_id)
            .bind(product_id)
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}

pub async fn category_ids_for(
    pool: &PgPool,
    subcategory_ids: &[i64],
) -> Result<HashMap<i64, Vec<i64>>, DatabaseError> {
    if subcategory_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = sqlx::query_as::<_, (i64, i64)>(
        "SELECT subcategory_id, category_id FROM category_subcategory \
         WHERE subcategory_id = ANY($1) ORDER BY category_id",
    )
    .bind(subcategory_ids)
    .fetch_all(pool)
    .await?;
    Ok(group_pairs(rows))
}

pub async fn product_ids_for(
    pool: &PgPool,
    subcategory_ids: &[i64],
) -> Result<HashMap<i64, Vec<i64>>, DatabaseError> {
    if subcategory_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = sqlx::query_as::<_, (i64, i64)>(
        "SELECT subcategory_id, product_id FROM subcategory_product \
         WHERE subcategory_id = ANY($1) ORDER BY product_id",
    )
    .bind(subcategory_ids)
    .fetch_all(pool)
    .await?;
    Ok(group_pairs(rows))
}

pub async fn categories_of(
    pool: &PgPool,
    subcategory_id: i64,
) -> Result<Vec<Category>, DatabaseError> {
    let rows = sqlx::query_as::<_, Category>(
        "SELECT c.id, c.name, c.created_at FROM category c \
         JOIN category_subcategory cs ON cs.category_id = c.id \
         WHERE cs.subcategory_id = $1 ORDER BY c.id",
    )
    .bind(subcategory_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn products_page(
    pool: &PgPool,
    subcategory_id: i64,
    marker: Option<&Marker>,
) -> Result<Vec<Product>, DatabaseError> {
    const BASE: &str = "SELECT p.id, p.name, p.description, p.created_at \
         FROM product p \
         JOIN subcategory_product sp ON sp.product_id = p.id \
         WHERE sp.subcategory_id = $1";

    let rows = match marker {
        Some(m) => {
            let sql = format!(
                "{BASE} AND p.id {} $2 ORDER BY p.id {} LIMIT $3",
                m.comparison(),
                m.sort_order()
            );
            sqlx::query_as::<_, Product>(&sql)
                .bind(subcategory_id)
                .bind(m.key)
                .bind(page::fetch_limit())
                .fetch_all(pool)
                .await?
        }
        None => {
            let sql = format!("{BASE} ORDER BY p.id ASC LIMIT $2");
            sqlx::query_as::<_, Product>(&sql)
                .bind(subcategory_id)
                .bind(page::fetch_limit())
                .fetch_all(pool)
                .await?
        }
    };
    Ok(rows)
}
