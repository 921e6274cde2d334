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
use crate::database::models::Category;
use crate::database::repos::{categories, products, subcategories};
use crate::error::ApiError;
use crate::pagination::page;

#[derive(Debug, Deserialize)]
pub struct CategoryIn {
    pub name: Option<String>,
    pub subcategories: Option<Vec<i64>>,
}

/// GET /categories - cursor page of categories
pub async fn list(
    State(ctx): State<AppContext>,
    Query(query): Query<PageQuery>,
) -> Result<Json<CategoriesOut>, ApiError> {
    let marker = query.marker()?;
    let rows = categories::list_page(&ctx.pool, marker.as_ref()).await?;
    let page = page::assemble(rows, marker.as_ref(), page::PER_PAGE, |c: &Category| c.id);
    let cursor = CursorLinks::from_page(&page);

    let ids: Vec<i64> = page.items.iter().map(|c| c.id).collect();
    let mut links = categories::subcategory_ids_for(&ctx.pool, &ids).await?;

    let categories = page
        .items
        .into_iter()
        .map(|c| {
            let subcategories = links.remove(&c.id).unwrap_or_default();
            CategoryOut::from_entity(c, subcategories)
        })
        .collect();

    Ok(Json(CategoriesOut {
        categories,
        cursor: Some(cursor),
    }))
}

/// POST /categories - create a category, optionally linked to existing
/// subcategories (replace-set semantics: the new link set is exactly the
/// supplied ids)
pub async fn create(
    State(ctx): State<AppContext>,
    Json(body): Json<CategoryIn>,
) -> Result<(StatusCode, Json<CategoryOut>), ApiError> {
    let name = required_name(body.name.as_deref())?;
    let subcategory_ids = body.subcategories.unwrap_or_default();

    let mut tx = ctx.pool.begin().await.map_err(crate::database::DatabaseError::from)?;
    let created = match create_in_tx(&mut tx, &name, &subcategory_ids).await {
        Ok(category) => category,
        Err(MutationError::Rejected(err)) => {
            tx.rollback().await.ok();
            return Err(err);
        }
        Err(MutationError::Storage(err)) => {
            tx.rollback().await.ok();
            return Err(conflict::classify(err, &conflict::CATEGORY_WRITE));
        }
    };
    if let Err(err) = tx.commit().await {
        return Err(conflict::classify(err.into(), &conflict::CATEGORY_WRITE));
    }

    let out = read_out(&ctx, created).await?;
    Ok((StatusCode::CREATED, Json(out)))
}

async fn create_in_tx(
    tx: &mut Transaction<'_, Postgres>,
    name: &str,
    subcategory_ids: &[i64],
) -> Result<Category, MutationError> {
    if !subcategory_ids.is_empty() {
        let found = subcategories::resolve(tx, subcategory_ids).await?;
        if found.len() != subcategory_ids.len() {
            return Err(ApiError::unprocessable_entity("One or more subcategories not present").into());
        }
    }

    let category = categories::insert(tx, name).await?;
    categories::link_subcategories(tx, category.id, subcategory_ids).await?;
    Ok(category)
}

/// GET /categories/:id
pub async fn show(
    State(ctx): State<AppContext>,
    Path(id): Path<i64>,
) -> Result<Json<CategoryOut>, ApiError> {
    let category = categories::find(&ctx.pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Category not found"))?;
    let out = read_out(&ctx, category).await?;
    Ok(Json(out))
}

/// PUT /categories/:id - partial update; supplied subcategories are added
/// to the existing link set, never replacing it
pub async fn update(
    State(ctx): State<AppContext>,
    Path(id): Path<i64>,
    Json(body): Json<CategoryIn>,
) -> Result<Json<CategoryOut>, ApiError> {
    let name = optional_name(body.name.as_deref())?;
    let subcategory_ids = body.subcategories.unwrap_or_default();

    if categories::find(&ctx.pool, id).await?.is_none() {
        return Err(ApiError::not_found("Category not found"));
    }

    let mut tx = ctx.pool.begin().await.map_err(crate::database::DatabaseError::from)?;
    match update_in_tx(&mut tx, id, name.as_deref(), &subcategory_ids).await {
        Ok(()) => {}
        Err(MutationError::Rejected(err)) => {
            tx.rollback().await.ok();
            return Err(err);
        }
        Err(MutationError::Storage(err)) => {
            tx.rollback().await.ok();
            return Err(conflict::classify(err, &conflict::CATEGORY_WRITE));
        }
    }
    if let Err(err) = tx.commit().await {
        return Err(conflict::classify(err.into(), &conflict::CATEGORY_WRITE));
    }

    let category = categories::find(&ctx.pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Category not found"))?;
    let out = read_out(&ctx, category).await?;
    Ok(Json(out))
}

async fn update_in_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: i64,
    name: Option<&str>,
    subcategory_ids: &[i64],
) -> Result<(), MutationError> {
    if let Some(name) = name {
        categories::update_name(tx, id, name).await?;
    }

    if !subcategory_ids.is_empty() {
        let found = subcategories::resolve(tx, subcategory_ids).await?;
        if found.len() != subcategory_ids.len() {
            return Err(ApiError::unprocessable_entity("One or more subcategories not present").into());
        }
        categories::link_subcategories(tx, id, subcategory_ids).await?;
    }
    Ok(())
}

/// DELETE /categories/:id - link rows cascade with the row
pub async fn remove(
    State(ctx): State<AppContext>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if !categories::delete(&ctx.pool, id).await? {
        return Err(ApiError::not_found("Category not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET /categories/:id/subcategories - unpaginated related set
pub async fn subcategories_of(
    State(ctx): State<AppContext>,
    Path(id): Path<i64>,
) -> Result<Json<SubcategoriesOut>, ApiError> {
    if !categories::exists(&ctx.pool, id).await? {
        return Err(ApiError::not_found("Category not found"));
    }

    let related = categories::subcategories_of(&ctx.pool, id).await?;
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

/// GET /categories/:id/products - cursor page over the distinct products
/// reachable through the category's subcategories
pub async fn products_of(
    State(ctx): State<AppContext>,
    Path(id): Path<i64>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ProductsOut>, ApiError> {
    if !categories::exists(&ctx.pool, id).await? {
        return Err(ApiError::not_found("Category not found"));
    }

    let marker = query.marker()?;
    let rows = categories::products_page(&ctx.pool, id, marker.as_ref()).await?;
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

async fn read_out(ctx: &AppContext, category: Category) -> Result<CategoryOut, ApiError> {
    let mut links = categories::subcategory_ids_for(&ctx.pool, &[category.id]).await?;
    let subcategories = links.remove(&category.id).unwrap_or_default();
    Ok(CategoryOut::from_entity(category, subcategories))
}
