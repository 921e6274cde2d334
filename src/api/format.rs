//! Public wire format.
//!
//! Entities serialize with their related-id sets inline; paginated
//! collection envelopes carry a `cursor` object with opaque next/prev
//! tokens. Unpaginated relationship reads omit the cursor entirely.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::database::models::{Category, Product, Subcategory};
use crate::pagination::Page;

#[derive(Debug, Serialize)]
pub struct CursorLinks {
    pub next: Option<String>,
    pub prev: Option<String>,
}

impl CursorLinks {
    pub fn from_page<T>(page: &Page<T>) -> Self {
        Self {
            next: page.next.clone(),
            prev: page.prev.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CategoryOut {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub subcategories: Vec<i64>,
}

impl CategoryOut {
    pub fn from_entity(category: Category, subcategories: Vec<i64>) -> Self {
        Self {
            id: category.id,
            name: category.name,
            created_at: category.created_at,
            subcategories,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CategoriesOut {
    pub categories: Vec<CategoryOut>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<CursorLinks>,
}

#[derive(Debug, Serialize)]
pub struct SubcategoryOut {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub categories: Vec<i64>,
    pub products: Vec<i64>,
}

impl SubcategoryOut {
    pub fn from_entity(subcategory: Subcategory, categories: Vec<i64>, products: Vec<i64>) -> Self {
        Self {
            id: subcategory.id,
            name: subcategory.name,
            created_at: subcategory.created_at,
            categories,
            products,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SubcategoriesOut {
    pub subcategories: Vec<SubcategoryOut>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<CursorLinks>,
}

#[derive(Debug, Serialize)]
pub struct ProductOut {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub subcategories: Vec<i64>,
}

impl ProductOut {
    pub fn from_entity(product: Product, subcategories: Vec<i64>) -> Self {
        Self {
            id: product.id,
            name: product.name,
            description: product.description,
            created_at: product.created_at,
            subcategories,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProductsOut {
    pub products: Vec<ProductOut>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<CursorLinks>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(id: i64, name: &str) -> Category {
        Category {
            id,
            name: name.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn paginated_envelope_includes_cursor_object() {
        let out = CategoriesOut {
            categories: vec![CategoryOut::from_entity(category(1, "Books"), vec![2, 3])],
            cursor: Some(CursorLinks {
                next: Some("abc".to_string()),
                prev: None,
            }),
        };
        let value = serde_json::to_value(&out).unwrap();
        assert_eq!(value["categories"][0]["subcategories"], serde_json::json!([2, 3]));
        assert_eq!(value["cursor"]["next"], "abc");
        assert_eq!(value["cursor"]["prev"], serde_json::Value::Null);
    }

    #[test]
    fn unpaginated_envelope_omits_cursor() {
        let out = CategoriesOut {
            categories: vec![],
            cursor: None,
        };
        let value = serde_json::to_value(&out).unwrap();
        assert!(value.get("cursor").is_none());
    }
}
