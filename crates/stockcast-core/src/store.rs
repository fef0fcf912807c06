//! The `InventoryStore` trait.
//!
//! Implemented by storage backends (e.g. `stockcast-store-sqlite`). The
//! trainer, the reconciler and the HTTP layer depend on this abstraction, not
//! on any concrete backend.

use std::future::Future;

use chrono::NaiveDate;
use serde::Serialize;

use crate::{
  ProductId,
  forecast::{ForecastSet, WindowDemand},
  product::Product,
  sales::{DailySales, SalesObservation},
  stock::StockLevel,
};

/// Row counts written by [`InventoryStore::import_catalog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CatalogImport {
  pub products: usize,
  pub sales:    usize,
  pub stocked:  usize,
}

/// Abstraction over a Stockcast store backend.
///
/// Sales are append-only. Forecasts are only ever written through
/// [`InventoryStore::replace_forecast`], which swaps a product's whole set in
/// one atomic step.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait InventoryStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Catalog ───────────────────────────────────────────────────────────

  /// Persist a catalog entry. Fails if the id is already taken.
  fn add_product(
    &self,
    product: Product,
  ) -> impl Future<Output = Result<Product, Self::Error>> + Send + '_;

  /// Look a product up by id. Returns `None` if it is not in the catalog.
  fn get_product(
    &self,
    id: ProductId,
  ) -> impl Future<Output = Result<Option<Product>, Self::Error>> + Send + '_;

  /// All catalog entries, ordered by id.
  fn list_products(
    &self,
  ) -> impl Future<Output = Result<Vec<Product>, Self::Error>> + Send + '_;

  /// Insert a whole catalog, its sales history and an initial stock level
  /// for every product as one unit. Any failure leaves the store as it was.
  fn import_catalog(
    &self,
    products: Vec<Product>,
    sales: Vec<SalesObservation>,
    initial_stock: u64,
  ) -> impl Future<Output = Result<CatalogImport, Self::Error>> + Send + '_;

  // ── Sales history ─────────────────────────────────────────────────────

  /// Append sales observations in a single transaction. Returns the number
  /// of rows written.
  fn record_sales(
    &self,
    sales: Vec<SalesObservation>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// The product's history summed per date, ordered by date.
  fn daily_sales(
    &self,
    product_id: ProductId,
  ) -> impl Future<Output = Result<Vec<DailySales>, Self::Error>> + Send + '_;

  // ── Stock ─────────────────────────────────────────────────────────────

  /// Set (or create) the current stock level for a catalog product.
  fn set_stock_level(
    &self,
    product_id: ProductId,
    stock_level: u64,
  ) -> impl Future<Output = Result<StockLevel, Self::Error>> + Send + '_;

  /// Every current stock record, ordered by product id.
  fn list_stock_levels(
    &self,
  ) -> impl Future<Output = Result<Vec<StockLevel>, Self::Error>> + Send + '_;

  // ── Forecasts ─────────────────────────────────────────────────────────

  /// Atomically replace the live forecast of `set.product_id` with `set`.
  ///
  /// Readers observe either the previous set or the new one, never a mix
  /// and never an empty gap.
  fn replace_forecast(
    &self,
    set: ForecastSet,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// The live forecast for a product, or `None` if it has never been
  /// trained.
  fn live_forecast(
    &self,
    product_id: ProductId,
  ) -> impl Future<Output = Result<Option<ForecastSet>, Self::Error>> + Send + '_;

  /// Predicted demand summed per product over `[from, to]` inclusive.
  /// Products without rows in the window are omitted.
  fn demand_between(
    &self,
    from: NaiveDate,
    to: NaiveDate,
  ) -> impl Future<Output = Result<Vec<WindowDemand>, Self::Error>> + Send + '_;
}
