//! `stockcast load`: import a catalog and its sales history into a store.
//!
//! The target store must have an empty catalog. Products, every sale and
//! each product's initial stock are written as one store transaction, so a
//! failed load leaves the store empty and can simply be retried.

use std::{collections::HashSet, path::Path};

use stockcast_core::{
  ProductId,
  product::Product,
  sales::SalesObservation,
  store::{CatalogImport, InventoryStore},
};

use crate::{
  dataset::{self, ProductRow, SaleRow},
  error::{Error, Result},
};

pub const DEFAULT_INITIAL_STOCK: u64 = 50;

/// Read both CSV files and load them into `store`.
pub async fn load_files<S>(
  store: &S,
  products_csv: &Path,
  sales_csv: &Path,
  initial_stock: u64,
) -> Result<CatalogImport>
where
  S: InventoryStore,
{
  let products: Vec<Product> = dataset::read_rows::<ProductRow>(products_csv)?
    .into_iter()
    .map(Product::from)
    .collect();
  let sales: Vec<SalesObservation> = dataset::read_rows::<SaleRow>(sales_csv)?
    .into_iter()
    .map(SalesObservation::from)
    .collect();

  load(store, products, sales, initial_stock).await
}

/// Load an in-memory catalog and history into `store`.
pub async fn load<S>(
  store: &S,
  products: Vec<Product>,
  sales: Vec<SalesObservation>,
  initial_stock: u64,
) -> Result<CatalogImport>
where
  S: InventoryStore,
{
  let existing = store.list_products().await.map_err(Error::store)?;
  if !existing.is_empty() {
    return Err(Error::CatalogNotEmpty(existing.len()));
  }

  let ids: HashSet<ProductId> = products.iter().map(|p| p.product_id).collect();
  if let Some(orphan) = sales.iter().find(|s| !ids.contains(&s.product_id)) {
    return Err(Error::UnknownProduct { product_id: orphan.product_id, date: orphan.date });
  }

  let summary = store
    .import_catalog(products, sales, initial_stock)
    .await
    .map_err(Error::store)?;
  tracing::info!(
    products = summary.products,
    sales = summary.sales,
    stocked = summary.stocked,
    initial_stock,
    "loaded dataset"
  );

  Ok(summary)
}
