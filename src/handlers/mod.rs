use serde::{Deserialize, Deserializer};

use crate::error::ApiError;
use crate::database::DatabaseError;
use crate::pagination::cursor::{self, Marker};

pub mod auth;
pub mod categories;
pub mod products;
pub mod subcategories;

/// Cursor query parameter shared by the paginated GETs.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub cursor: Option<String>,
}

impl PageQuery {
    pub fn marker(&self) -> Result<Option<Marker>, ApiError> {
        Ok(cursor::decode_param(self.cursor.as_deref())?)
    }
}

/// Failure inside a mutating transaction. `Rejected` responses (validation,
/// unresolved related ids) pass through unchanged after rollback; `Storage`
/// errors go to the conflict classifier.
pub(crate) enum MutationError {
    Rejected(ApiError),
    Storage(DatabaseError),
}

impl From<ApiError> for MutationError {
    fn from(err: ApiError) -> Self {
        MutationError::Rejected(err)
    }
}

impl From<DatabaseError> for MutationError {
    fn from(err: DatabaseError) -> Self {
        MutationError::Storage(err)
    }
}

/// Trimmed, non-empty name for create paths.
pub(crate) fn required_name(name: Option<&str>) -> Result<String, ApiError> {
    match name {
        None => Err(ApiError::unprocessable_entity(
            "Missing data for required field.",
        )),
        Some(raw) => nonempty_trimmed(raw),
    }
}

/// Same, but absence is fine (partial updates).
pub(crate) fn optional_name(name: Option<&str>) -> Result<Option<String>, ApiError> {
    name.map(nonempty_trimmed).transpose()
}

fn nonempty_trimmed(raw: &str) -> Result<String, ApiError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ApiError::unprocessable_entity("Cannot be empty"));
    }
    Ok(trimmed.to_string())
}

/// Deserializer that keeps "field absent" distinct from "field: null",
/// for partial updates of nullable columns.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
