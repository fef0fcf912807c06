//! Handler for `GET /inventory/status`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/inventory/status` | Optional `?as_of=YYYY-MM-DD`, defaults to today (UTC) |
//!
//! The response is the complete status list or an error body; a store
//! failure part-way through never yields a partial list. A malformed `as_of`
//! is a 400 with the same JSON error body.

use axum::{
  Json,
  extract::{Query, State, rejection::QueryRejection},
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use stockcast_core::{reconcile::ReorderStatus, store::InventoryStore};

use crate::{ApiState, error::ApiError};

#[derive(Debug, Deserialize, Default)]
pub struct StatusParams {
  /// The day the lookahead window starts on.
  pub as_of: Option<NaiveDate>,
}

/// `GET /inventory/status[?as_of=<date>]`
pub async fn status<S>(
  State(state): State<ApiState<S>>,
  params: Result<Query<StatusParams>, QueryRejection>,
) -> Result<Json<Vec<ReorderStatus>>, ApiError>
where
  S: InventoryStore,
{
  let Query(params) = params?;
  let today = params.as_of.unwrap_or_else(|| Utc::now().date_naive());
  let reconciliation = state.reconciler.status(state.store.as_ref(), today).await?;
  Ok(Json(reconciliation.statuses))
}
