//! Handlers for `/products` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/products` | Whole catalog, ordered by id |
//! | `GET`  | `/products/:id` | 404 if not found |
//! | `GET`  | `/products/:id/forecast` | Live forecast set; 404 if never trained |

use axum::{
  Json,
  extract::{Path, State},
};
use stockcast_core::{
  ProductId,
  forecast::ForecastSet,
  product::Product,
  store::InventoryStore,
};

use crate::{ApiState, error::ApiError};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /products`
pub async fn list<S>(
  State(state): State<ApiState<S>>,
) -> Result<Json<Vec<Product>>, ApiError>
where
  S: InventoryStore,
{
  let products = state.store.list_products().await.map_err(ApiError::store)?;
  Ok(Json(products))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /products/:id`
pub async fn get_one<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<ProductId>,
) -> Result<Json<Product>, ApiError>
where
  S: InventoryStore,
{
  let product = find_product(&state, id).await?;
  Ok(Json(product))
}

// ─── Forecast ─────────────────────────────────────────────────────────────────

/// `GET /products/:id/forecast`
pub async fn forecast<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<ProductId>,
) -> Result<Json<ForecastSet>, ApiError>
where
  S: InventoryStore,
{
  find_product(&state, id).await?;
  let set = state
    .store
    .live_forecast(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("product {id} has no forecast")))?;
  Ok(Json(set))
}

async fn find_product<S>(state: &ApiState<S>, id: ProductId) -> Result<Product, ApiError>
where
  S: InventoryStore,
{
  state
    .store
    .get_product(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("product {id} not found")))
}
