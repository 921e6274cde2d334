use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Subcategory {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}
