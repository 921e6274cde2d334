use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use sqlx::{Postgres, Transaction};

use super::{required_name, optional_name, MutationError, PageQuery};
use crate::api::format::{
    CategoriesOut, CategoryOut, CursorLinks, ProductOut, ProductsOut, SubcategoriesOut,
    SubcategoryOut,
};
use crate::context::AppContext;
use crate::database::conflict;
use crate::database::models::Subcategory;
use crate::database::repos::{categories, products, subcategories};
use crate::error::ApiError;
use crate::pagination::page;

#[derive(Debug, Deserialize)]
pub struct SubcategoryIn {
    pub name: Option<String>,
    pub categories: Option<Vec<i64>>,
    pub products: Option<Vec<i64>>,
}

/// GET /subcategories - cursor page of subcategories
pub async fn list(
    State(ctx): State<AppContext>,
    Query(query): Query<PageQuery>,
) -> Result<Json<SubcategoriesOut>, ApiError> {
    let marker = query.marker()?;
    let rows = subcategories::list_page(&ctx.pool, marker.as_ref()).await?;
    let page = page::assemble(rows, marker.as_ref(), page::PER_PAGE, |s: &Subcategory| s.id);
    let cursor = CursorLinks::from_page(&page);

    let ids: Vec<i64> = page.items.iter().map(|s| s.id).collect();
    let mut category_links = subcategories::category_ids_for(&ctx.pool, &ids).await?;
    let mut product_links = subcategories::product_ids_for(&ctx.pool, &ids).await?;

    let subcategories = page
        .items
        .into_iter()
        .map(|s| {
            let categories = category_links.remove(&s.id).unwrap_or_default();
            let products = product_links.remove(&s.id).unwrap_or_default();
            SubcategoryOut::from_entity(s, categories, products)
        })
        .collect();

    Ok(Json(SubcategoriesOut {
        subcategories,
        cursor: Some(cursor),
    }))
}

/// POST /subcategories - create with optional category and product links
/// (replace-set semantics on creation)
pub async fn create(
    State(ctx): State<AppContext>,
    Json(body): Json<SubcategoryIn>,
) -> Result<(StatusCode, Json<SubcategoryOut>), ApiError> {
    let name = required_name(body.name.as_deref())?;
    let category_ids = body.categories.unwrap_or_default();
    let product_ids = body.products.unwrap_or_default();

    let mut tx = ctx.pool.begin().await.map_err(crate::database::DatabaseError::from)?;
    let created = match create_in_tx(&mut tx, &name, &category_ids, &product_ids).await {
        Ok(subcategory) => subcategory,
        Err(MutationError::Rejected(err)) => {
            tx.rollback().await.ok();
            return Err(err);
        }
        Err(MutationError::Storage(err)) => {
            tx.rollback().await.ok();
            return Err(conflict::classify(err, &conflict::SUBCATEGORY_WRITE));
        }
    };
    if let Err(err) = tx.commit().await {
        return Err(conflict::classify(err.into(), &conflict::SUBCATEGORY_WRITE));
    }

    let out = read_out(&ctx, created).await?;
    Ok((StatusCode::CREATED, Json(out)))
}

async fn create_in_tx(
    tx: &mut Transaction<'_, Postgres>,
    name: &str,
    category_ids: &[i64],
    product_ids: &[i64],
) -> Result<Subcategory, MutationError> {
    if !category_ids.is_empty() {
        let found = categories::resolve(tx, category_ids).await?;
        if found.len() != category_ids.len() {
            return Err(ApiError::unprocessable_entity("One or more categories not present").into());
        }
    }
    if !product_ids.is_empty() {
        let found = products::resolve(tx, product_ids).await?;
        if found.len() != product_ids.len() {
            return Err(ApiError::unprocessable_entity("One or more products not present").into());
        }
    }

    let subcategory = subcategories::insert(tx, name).await?;
    subcategories::link_categories(tx, subcategory.id, category_ids).await?;
    subcategories::link_products(tx, subcategory.id, product_ids).await?;
    Ok(subcategory)
}

/// GET /subcategories/:id
pub async fn show(
    State(ctx): State<AppContext>,
    Path(id): Path<i64>,
) -> Result<Json<SubcategoryOut>, ApiError> {
    let subcategory = subcategories::find(&ctx.pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Subcategory not found"))?;
    let out = read_out(&ctx, subcategory).await?;
    Ok(Json(out))
}

/// PUT /subcategories/:id - partial update; supplied categories and
/// products are added to the existing link sets
pub async fn update(
    State(ctx): State<AppContext>,
    Path(id): Path<i64>,
    Json(body): Json<SubcategoryIn>,
) -> Result<Json<SubcategoryOut>, ApiError> {
    let name = optional_name(body.name.as_deref())?;
    let category_ids = body.categories.unwrap_or_default();
    let product_ids = body.products.unwrap_or_default();

    if subcategories::find(&ctx.pool, id).await?.is_none() {
        return Err(ApiError::not_found("Subcategory not found"));
    }

    let mut tx = ctx.pool.begin().await.map_err(crate::database::DatabaseError::from)?;
    match update_in_tx(&mut tx, id, name.as_deref(), &category_ids, &product_ids).await {
        Ok(()) => {}
        Err(MutationError::Rejected(err)) => {
            tx.rollback().await.ok();
            return Err(err);
        }
        Err(MutationError::Storage(err)) => {
            tx.rollback().await.ok();
            return Err(conflict::classify(err, &conflict::SUBCATEGORY_WRITE));
        }
    }
    if let Err(err) = tx.commit().await {
        return Err(conflict::classify(err.into(), &conflict::SUBCATEGORY_WRITE));
    }

    let subcategory = subcategories::find(&ctx.pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Subcategory not found"))?;
    let out = read_out(&ctx, subcategory).await?;
    Ok(Json(out))
}

async fn update_in_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: i64,
    name: Option<&str>,
    category_ids: &[i64],
    product_ids: &[i64],
) -> Result<(), MutationError> {
    if let Some(name) = name {
        subcategories::update_name(tx, id, name).await?;
    }

    if !category_ids.is_empty() {
        let found = categories::resolve(tx, category_ids).await?;
        if found.len() != category_ids.len() {
            return Err(ApiError::unprocessable_entity("One or more categories not present").into());
        }
        subcategories::link_categories(tx, id, category_ids).await?;
    }
    if !product_ids.is_empty() {
        let found = products::resolve(tx, product_ids).await?;
        if found.len() != product_ids.len() {
            return Err(ApiError::unprocessable_entity("One or more products not present").into());
        }
        subcategories::link_products(tx, id, product_ids).await?;
    }
    Ok(())
}

/// DELETE /subcategories/:id
pub async fn remove(
    State(ctx): State<AppContext>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if !subcategories::delete(&ctx.pool, id).await? {
        return Err(ApiError::not_found("Subcategory not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET /subcategories/:id/categories - unpaginated related set
pub async fn categories_of(
    State(ctx): State<AppContext>,
    Path(id): Path<i64>,
) -> Result<Json<CategoriesOut>, ApiError> {
    if subcategories::find(&ctx.pool, id).await?.is_none() {
        return Err(ApiError::not_found("Subcategory not found"));
    }

    let related = subcategories::categories_of(&ctx.pool, id).await?;
    let ids: Vec<i64> = related.iter().map(|c| c.id).collect();
    let mut links = categories::subcategory_ids_for(&ctx.pool, &ids).await?;

    let categories = related
        .into_iter()
        .map(|c| {
            let subcategories = links.remove(&c.id).unwrap_or_default();
            CategoryOut::from_entity(c, subcategories)
        })
        .collect();

    Ok(Json(CategoriesOut {
        categories,
        cursor: None,
    }))
}

/// GET /subcategories/:id/products - cursor page of the linked products
pub async fn products_of(
    State(ctx): State<AppContext>,
    Path(id): Path<i64>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ProductsOut>, ApiError> {
    if subcategories::find(&ctx.pool, id).await?.is_none() {
        return Err(ApiError::not_found("Subcategory not found"));
    }

    let marker = query.marker()?;
    let rows = subcategories::products_page(&ctx.pool, id, marker.as_ref()).await?;
    let page = page::assemble(rows, marker.as_ref(), page::PER_PAGE, |p| p.id);
    let cursor = CursorLinks::from_page(&page);

    let ids: Vec<i64> = page.items.iter().map(|p| p.id).collect();
    let mut links = products::subcategory_ids_for(&ctx.pool, &ids).await?;

    let products = page
        .items
        .into_iter()
        .map(|p| {
            let subcategories = links.remove(&p.id).unwrap_or_default();
            ProductOut::from_entity(p, subcategories)
        })
        .collect();

    Ok(Json(ProductsOut {
        products,
        cursor: Some(cursor),
    }))
}

async fn read_out(ctx: &AppContext, subcategory: Subcategory) -> Result<SubcategoryOut, ApiError> {
    let mut category_links = subcategories::category_ids_for(&ctx.pool, &[subcategory.id]).await?;
    let mut product_links = subcategories::product_ids_for(&ctx.pool, &[subcategory.id]).await?;
    let categories = category_links.remove(&subcategory.id).unwrap_or_default();
    let products = product_links.remove(&subcategory.id).unwrap_or_default();
    Ok(SubcategoryOut::from_entity(subcategory, categories, products))
}
