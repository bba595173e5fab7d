use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use tracing::info;

use crate::{
    error::{AppError, AppResult},
    models::{CreateProduct, NewProduct, Product, StockUpdate},
    AppState,
};

fn rejected(rejection: impl std::fmt::Display) -> AppError {
    AppError::Validation(rejection.to_string())
}

// ── Create ────────────────────────────────────────────────────────────────────

pub async fn create_product(
    State(state): State<AppState>,
    payload: Result<Json<CreateProduct>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Product>)> {
    let Json(payload) = payload.map_err(rejected)?;
    info!(name = %payload.name, stock = payload.stock, "Attempting to create product");

    let new_product = NewProduct::from(payload);
    let product = state.store.insert_product(&new_product).await?;

    info!(id = product.id, "Product successfully created");
    Ok((StatusCode::OK, Json(product)))
}

// ── Get by ID ─────────────────────────────────────────────────────────────────

pub async fn get_product(
    State(state): State<AppState>,
    id: Result<Path<i32>, PathRejection>,
) -> AppResult<(StatusCode, Json<Product>)> {
    let Path(id) = id.map_err(rejected)?;
    info!(id, "Fetching product");

    let product = state.store.fetch_product_by_id(id).await?;

    info!(id = product.id, name = %product.name, stock = product.stock, "Product fetched");
    Ok((StatusCode::OK, Json(product)))
}

// ── Update stock ──────────────────────────────────────────────────────────────

pub async fn update_stock(
    State(state): State<AppState>,
    id: Result<Path<i32>, PathRejection>,
    update: Result<Query<StockUpdate>, QueryRejection>,
) -> AppResult<(StatusCode, Json<Product>)> {
    let Path(id) = id.map_err(rejected)?;
    let Query(StockUpdate { stock }) = update.map_err(rejected)?;

    let product = state.store.update_stock(id, stock).await?;
    info!(id = product.id, stock = product.stock, "Product stock updated");

    // Enqueue only; a dead client is evicted by the registry, never surfaced here.
    let message = format!("Product {} stock updated to {}", product.id, product.stock);
    state.registry.broadcast(&message).await;

    Ok((StatusCode::OK, Json(product)))
}
