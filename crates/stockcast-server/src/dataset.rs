//! The CSV exchange format shared by `simulate` (writer) and `load` (reader).
//!
//! `products.csv`: `id,name,sku,base_price,type`
//!
//! `sales_transactions.csv`: `product_id,transaction_date,quantity_sold,total_amount`

use std::path::Path;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use stockcast_core::{ProductId, product::Product, sales::SalesObservation};

use crate::error::{Error, Result};

pub const PRODUCTS_FILE: &str = "products.csv";
pub const SALES_FILE: &str = "sales_transactions.csv";

// ─── Rows ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRow {
  pub id:         ProductId,
  pub name:       String,
  pub sku:        String,
  pub base_price: Option<Decimal>,
  #[serde(rename = "type")]
  pub kind:       Option<String>,
}

impl From<ProductRow> for Product {
  fn from(row: ProductRow) -> Self {
    Product {
      product_id: row.id,
      sku:        row.sku,
      name:       row.name,
      category:   row.kind,
      unit_price: row.base_price,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleRow {
  pub product_id:       ProductId,
  pub transaction_date: NaiveDate,
  pub quantity_sold:    u32,
  pub total_amount:     Option<Decimal>,
}

impl From<SaleRow> for SalesObservation {
  fn from(row: SaleRow) -> Self {
    SalesObservation {
      product_id:    row.product_id,
      date:          row.transaction_date,
      quantity_sold: row.quantity_sold,
      total_amount:  row.total_amount,
    }
  }
}

// ─── Read / write ────────────────────────────────────────────────────────────

pub fn read_rows<T>(path: &Path) -> Result<Vec<T>>
where
  T: for<'de> Deserialize<'de>,
{
  let mut reader = csv::Reader::from_path(path).map_err(Error::csv(path))?;
  reader
    .deserialize()
    .collect::<Result<Vec<T>, _>>()
    .map_err(Error::csv(path))
}

pub fn write_rows<T>(path: &Path, rows: &[T]) -> Result<()>
where
  T: Serialize,
{
  let mut writer = csv::Writer::from_path(path).map_err(Error::csv(path))?;
  for row in rows {
    writer.serialize(row).map_err(Error::csv(path))?;
  }
  writer.flush()?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use std::str::FromStr as _;

  use super::*;

  #[test]
  fn reads_files_written_by_other_tools() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(PRODUCTS_FILE);
    std::fs::write(
      &path,
      "id,name,sku,base_price,type\n1,Winter Jacket,WIN-001,120.0,seasonal_winter\n",
    )
    .unwrap();

    let rows: Vec<ProductRow> = read_rows(&path).unwrap();
    let product = Product::from(rows[0].clone());
    assert_eq!(product.product_id, 1);
    assert_eq!(product.category.as_deref(), Some("seasonal_winter"));
    assert_eq!(product.unit_price, Some(Decimal::from_str("120.0").unwrap()));
  }

  #[test]
  fn malformed_row_names_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(SALES_FILE);
    std::fs::write(
      &path,
      "product_id,transaction_date,quantity_sold,total_amount\n1,yesterday,4,\n",
    )
    .unwrap();

    let err = read_rows::<SaleRow>(&path).unwrap_err();
    assert!(matches!(err, Error::Csv { .. }));
    assert!(err.to_string().contains(SALES_FILE));
  }
}
