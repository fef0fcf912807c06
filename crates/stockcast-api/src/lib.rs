//! JSON REST API for Stockcast.
//!
//! Exposes an axum [`Router`] backed by any
//! [`stockcast_core::store::InventoryStore`]. Every route is a read; writes
//! happen through the training and loading commands.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .merge(stockcast_api::api_router(store.clone(), settings.policy))
//! ```

pub mod error;
pub mod inventory;
pub mod products;

use std::sync::Arc;

use axum::{Json, Router, routing::get};
use serde_json::{Value, json};
use stockcast_core::{
  reconcile::{Reconciler, ReorderPolicy},
  store::InventoryStore,
};

pub use error::ApiError;

/// Shared state threaded through all handlers.
pub struct ApiState<S> {
  pub store:      Arc<S>,
  pub reconciler: Reconciler,
}

impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), reconciler: self.reconciler }
  }
}

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be merged into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>, policy: ReorderPolicy) -> Router<()>
where
  S: InventoryStore + 'static,
{
  let state = ApiState { store, reconciler: Reconciler::new(policy) };

  Router::new()
    .route("/", get(root))
    // Inventory
    .route("/inventory/status", get(inventory::status::<S>))
    // Catalog
    .route("/products", get(products::list::<S>))
    .route("/products/{id}", get(products::get_one::<S>))
    .route("/products/{id}/forecast", get(products::forecast::<S>))
    .with_state(state)
}

/// `GET /`
async fn root() -> Json<Value> {
  Json(json!({ "message": "Stockcast inventory forecasting API is running" }))
}
