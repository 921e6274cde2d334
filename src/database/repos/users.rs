use sqlx::PgPool;

use crate::database::models::User;
use crate::database::DatabaseError;

const COLUMNS: &str = "id, email, email_normalized, password_hash, created_on";

/// Single-statement insert; the normalized-email unique constraint is the
/// authoritative duplicate check, surfaced to the caller for classification.
pub async fn insert(
    pool: &PgPool,
    email: &str,
    email_normalized: &str,
    password_hash: &str,
) -> Result<User, DatabaseError> {
    let sql = format!(
        "INSERT INTO users (email, email_normalized, password_hash) \
         VALUES ($1, $2, $3) RETURNING {COLUMNS}"
    );
    let user = sqlx::query_as::<_, User>(&sql)
        .bind(email)
        .bind(email_normalized)
        .bind(password_hash)
        .fetch_one(pool)
        .await?;
    Ok(user)
}

pub async fn find_by_normalized_email(
    pool: &PgPool,
    email_normalized: &str,
) -> Result<Option<User>, DatabaseError> {
    let sql = format!("SELECT {COLUMNS} FROM users WHERE email_normalized = $1");
    let user = sqlx::query_as::<_, User>(&sql)
        .bind(email_normalized)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}
