use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use sqlx::{Postgres, Transaction};

use super::{double_option, required_name, optional_name, MutationError};
use crate::api::format::{
    CursorLinks, ProductOut, ProductsOut, SubcategoriesOut, SubcategoryOut,
};
use crate::context::AppContext;
use crate::database::conflict;
use crate::database::models::Product;
use crate::database::repos::{products, subcategories};
use crate::error::ApiError;
use crate::pagination::page;

#[derive(Debug, Deserialize)]
pub struct ProductIn {
    pub name: Option<String>,
    /// Absent means leave untouched; an explicit null clears the field.
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub subcategories: Option<Vec<i64>>,
}

impl ProductIn {
    fn description_change(&self) -> Option<Option<String>> {
        self.description
            .as_ref()
            .map(|d| d.as_deref().map(|s| s.trim().to_string()))
    }
}

#[derive(Debug, Deserialize)]
pub struct ProductListQuery {
    pub name: Option<String>,
    pub cursor: Option<String>,
}

/// GET /products - cursor page, or exact-name filter. The two modes are
/// mutually exclusive; supplying both parameters is rejected.
pub async fn list(
    State(ctx): State<AppContext>,
    Query(query): Query<ProductListQuery>,
) -> Result<Json<ProductsOut>, ApiError> {
    if let Some(name) = query.name.as_deref() {
        if query.cursor.is_some() {
            return Err(ApiError::bad_request(
                "name filter cannot be combined with a cursor",
            ));
        }
        return list_by_name(&ctx, name).await;
    }

    let marker = crate::pagination::cursor::decode_param(query.cursor.as_deref())?;
    let rows = products::list_page(&ctx.pool, marker.as_ref()).await?;
    let page = page::assemble(rows, marker.as_ref(), page::PER_PAGE, |p: &Product| p.id);
    let cursor = CursorLinks::from_page(&page);

    let out = to_products_out(&ctx, page.items, Some(cursor)).await?;
    Ok(Json(out))
}

async fn list_by_name(ctx: &AppContext, name: &str) -> Result<Json<ProductsOut>, ApiError> {
    let rows = products::find_by_name(&ctx.pool, name).await?;
    let out = to_products_out(ctx, rows, None).await?;
    Ok(Json(out))
}

/// POST /products - create with optional description and subcategory links
pub async fn create(
    State(ctx): State<AppContext>,
    Json(body): Json<ProductIn>,
) -> Result<(StatusCode, Json<ProductOut>), ApiError> {
    let name = required_name(body.name.as_deref())?;
    let description = body.description_change().flatten();
    let subcategory_ids = body.subcategories.unwrap_or_default();

    let mut tx = ctx.pool.begin().await.map_err(crate::database::DatabaseError::from)?;
    let created = match create_in_tx(&mut tx, &name, description.as_deref(), &subcategory_ids).await
    {
        Ok(product) => product,
        Err(MutationError::Rejected(err)) => {
            tx.rollback().await.ok();
            return Err(err);
        }
        Err(MutationError::Storage(err)) => {
            tx.rollback().await.ok();
            return Err(conflict::classify(err, &conflict::PRODUCT_WRITE));
        }
    };
    if let Err(err) = tx.commit().await {
        return Err(conflict::classify(err.into(), &conflict::PRODUCT_WRITE));
    }

    let out = read_out(&ctx, created).await?;
    Ok((StatusCode::CREATED, Json(out)))
}

async fn create_in_tx(
    tx: &mut Transaction<'_, Postgres>,
    name: &str,
    description: Option<&str>,
    subcategory_ids: &[i64],
) -> Result<Product, MutationError> {
    if !subcategory_ids.is_empty() {
        let found = subcategories::resolve(tx, subcategory_ids).await?;
        if found.len() != subcategory_ids.len() {
            return Err(ApiError::unprocessable_entity("One or more subcategories not present").into());
        }
    }

    let product = products::insert(tx, name, description).await?;
    products::link_subcategories(tx, product.id, subcategory_ids).await?;
    Ok(product)
}

/// GET /products/:id
pub async fn show(
    State(ctx): State<AppContext>,
    Path(id): Path<i64>,
) -> Result<Json<ProductOut>, ApiError> {
    let product = products::find(&ctx.pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product not found"))?;
    let out = read_out(&ctx, product).await?;
    Ok(Json(out))
}

/// PUT /products/:id - partial update; subcategory links are additive, and
/// the description only changes when the field is present in the body
pub async fn update(
    State(ctx): State<AppContext>,
    Path(id): Path<i64>,
    Json(body): Json<ProductIn>,
) -> Result<Json<ProductOut>, ApiError> {
    let name = optional_name(body.name.as_deref())?;
    let description = body.description_change();
    let subcategory_ids = body.subcategories.unwrap_or_default();

    if products::find(&ctx.pool, id).await?.is_none() {
        return Err(ApiError::not_found("Product not found"));
    }

    let mut tx = ctx.pool.begin().await.map_err(crate::database::DatabaseError::from)?;
    match update_in_tx(&mut tx, id, name.as_deref(), description, &subcategory_ids).await {
        Ok(()) => {}
        Err(MutationError::Rejected(err)) => {
            tx.rollback().await.ok();
            return Err(err);
        }
        Err(MutationError::Storage(err)) => {
            tx.rollback().await.ok();
            return Err(conflict::classify(err, &conflict::PRODUCT_WRITE));
        }
    }
    if let Err(err) = tx.commit().await {
        return Err(conflict::classify(err.into(), &conflict::PRODUCT_WRITE));
    }

    let product = products::find(&ctx.pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product not found"))?;
    let out = read_out(&ctx, product).await?;
    Ok(Json(out))
}

async fn update_in_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: i64,
    name: Option<&str>,
    description: Option<Option<String>>,
    subcategory_ids: &[i64],
) -> Result<(), MutationError> {
    if let Some(name) = name {
        products::update_name(tx, id, name).await?;
    }
    if let Some(description) = description {
        products::update_description(tx, id, description.as_deref()).await?;
    }

    if !subcategory_ids.is_empty() {
        let found = subcategories::resolve(tx, subcategory_ids).await?;
        if found.len() != subcategory_ids.len() {
            return Err(ApiError::unprocessable_entity("One or more subcategories not present").into());
        }
        products::link_subcategories(tx, id, subcategory_ids).await?;
    }
    Ok(())
}

/// DELETE /products/:id
pub async fn remove(
    State(ctx): State<AppContext>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if !products::delete(&ctx.pool, id).await? {
        return Err(ApiError::not_found("Product not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET /products/:id/subcategories - unpaginated related set
pub async fn subcategories_of(
    State(ctx): State<AppContext>,
    Path(id): Path<i64>,
) -> Result<Json<SubcategoriesOut>, ApiError> {
    if products::find(&ctx.pool, id).await?.is_none() {
        return Err(ApiError::not_found("Product not found"));
    }

    let related = products::subcategories_of(&ctx.pool, id).await?;
    let ids: Vec<i64> = related.iter().map(|s| s.id).collect();
    let mut category_links = subcategories::category_ids_for(&ctx.pool, &ids).await?;
    let mut product_links = subcategories::product_ids_for(&ctx.pool, &ids).await?;

    let subcategories = related
        .into_iter()
        .map(|s| {
            let categories = category_links.remove(&s.id).unwrap_or_default();
            let products = product_links.remove(&s.id).unwrap_or_default();
            SubcategoryOut::from_entity(s, categories, products)
        })
        .collect();

    Ok(Json(SubcategoriesOut {
        subcategories,
        cursor: None,
    }))
}

async fn to_products_out(
    ctx: &AppContext,
    items: Vec<Product>,
    cursor: Option<CursorLinks>,
) -> Result<ProductsOut, ApiError> {
    let ids: Vec<i64> = items.iter().map(|p| p.id).collect();
    let mut links = products::subcategory_ids_for(&ctx.pool, &ids).await?;

    let products = items
        .into_iter()
        .map(|p| {
            let subcategories = links.remove(&p.id).unwrap_or_default();
            ProductOut::from_entity(p, subcategories)
        })
        .collect();

    Ok(ProductsOut { products, cursor })
}

async fn read_out(ctx: &AppContext, product: Product) -> Result<ProductOut, ApiError> {
    let mut links = products::subcategory_ids_for(&ctx.pool, &[product.id]).await?;
    let subcategories = links.remove(&product.id).unwrap_or_default();
    Ok(ProductOut::from_entity(product, subcategories))
}
