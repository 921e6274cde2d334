use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    /// Email as entered at registration, kept for display.
    pub email: String,
    /// Canonical form used for the uniqueness constraint and lookups.
    pub email_normalized: String,
    pub password_hash: String,
    pub created_on: DateTime<Utc>,
}
