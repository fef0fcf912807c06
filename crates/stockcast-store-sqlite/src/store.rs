//! [`SqliteStore`] — the SQLite implementation of [`InventoryStore`].

use std::path::Path;

use chrono::{NaiveDate, Utc};
#[cfg(test)]
use rust_decimal::Decimal;
use rusqlite::OptionalExtension as _;

use stockcast_core::{
  ProductId,
  forecast::{ForecastSet, WindowDemand},
  product::Product,
  sales::{DailySales, SalesObservation},
  stock::StockLevel,
  store::{CatalogImport, InventoryStore},
};

use crate::{
  Error, Result,
  encode::{
    RawDailySales, RawForecastRow, RawProduct, RawStockLevel, RawWindowDemand,
    decode_dt, decode_uuid, encode_date, encode_dt, encode_price, encode_quantity,
    encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Stockcast store backed by a single SQLite file.
///
/// Clones share one background connection thread.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open a private in-memory store; nothing outlives the handle.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Recorded sale amounts for a product, in insertion order.
  #[cfg(test)]
  pub(crate) async fn sale_amounts(&self, product_id: ProductId) -> Result<Vec<Option<Decimal>>> {
    let raws: Vec<Option<String>> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT total_amount FROM sales_transactions
           WHERE product_id = ?1 ORDER BY transaction_id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![product_id], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .iter()
      .map(|raw| raw.as_deref().map(crate::encode::decode_price).transpose())
      .collect()
  }

  async fn product_exists(&self, id: ProductId) -> Result<bool> {
    let exists = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM products WHERE product_id = ?1",
              rusqlite::params![id],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false),
        )
      })
      .await?;
    Ok(exists)
  }
}

const INSERT_PRODUCT: &str = "INSERT INTO products (product_id, sku, name, category, unit_price)
                              VALUES (?1, ?2, ?3, ?4, ?5)";

/// `(product_id, date, quantity, total_amount)` as bound to the insert.
type SaleParams = (ProductId, String, i64, Option<String>);

fn sale_params(sales: &[SalesObservation]) -> Vec<SaleParams> {
  sales
    .iter()
    .map(|s| {
      (
        s.product_id,
        encode_date(s.date),
        i64::from(s.quantity_sold),
        s.total_amount.map(encode_price),
      )
    })
    .collect()
}

fn insert_sales(tx: &rusqlite::Transaction<'_>, rows: &[SaleParams]) -> rusqlite::Result<()> {
  let mut stmt = tx.prepare(
    "INSERT INTO sales_transactions (product_id, transaction_date, quantity_sold, total_amount)
     VALUES (?1, ?2, ?3, ?4)",
  )?;
  for (product_id, date, quantity, amount) in rows {
    stmt.execute(rusqlite::params![product_id, date, quantity, amount])?;
  }
  Ok(())
}

fn product_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawProduct> {
  Ok(RawProduct {
    product_id: row.get(0)?,
    sku:        row.get(1)?,
    name:       row.get(2)?,
    category:   row.get(3)?,
    unit_price: row.get(4)?,
  })
}

// ─── InventoryStore impl ─────────────────────────────────────────────────────

impl InventoryStore for SqliteStore {
  type Error = Error;

  // ── Catalog ───────────────────────────────────────────────────────────────

  async fn add_product(&self, product: Product) -> Result<Product> {
    if self.product_exists(product.product_id).await? {
      return Err(Error::DuplicateProduct(product.product_id));
    }

    let id       = product.product_id;
    let sku      = product.sku.clone();
    let name     = product.name.clone();
    let category = product.category.clone();
    let price    = product.unit_price.map(encode_price);

    self
      .conn
      .call(move |conn| {
        conn.execute(INSERT_PRODUCT, rusqlite::params![id, sku, name, category, price])?;
        Ok(())
      })
      .await?;

    Ok(product)
  }

  async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
    let raw: Option<RawProduct> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT product_id, sku, name, category, unit_price
               FROM products WHERE product_id = ?1",
              rusqlite::params![id],
              product_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawProduct::into_product).transpose()
  }

  async fn list_products(&self) -> Result<Vec<Product>> {
    let raws: Vec<RawProduct> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT product_id, sku, name, category, unit_price
           FROM products ORDER BY product_id",
        )?;
        let rows = stmt
          .query_map([], product_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawProduct::into_product).collect()
  }

  async fn import_catalog(
    &self,
    products:      Vec<Product>,
    sales:         Vec<SalesObservation>,
    initial_stock: u64,
  ) -> Result<CatalogImport> {
    let catalog: Vec<(ProductId, String, String, Option<String>, Option<String>)> = products
      .into_iter()
      .map(|p| (p.product_id, p.sku, p.name, p.category, p.unit_price.map(encode_price)))
      .collect();
    let rows      = sale_params(&sales);
    let level_raw = encode_quantity(initial_stock)?;
    let at_str    = encode_dt(Utc::now());

    // Products, sales and stock commit together; a constraint failure at any
    // point rolls the whole import back.
    let summary = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare(INSERT_PRODUCT)?;
          for (id, sku, name, category, price) in &catalog {
            stmt.execute(rusqlite::params![id, sku, name, category, price])?;
          }
        }
        insert_sales(&tx, &rows)?;
        {
          let mut stmt = tx.prepare(
            "INSERT INTO current_inventory (product_id, stock_level, last_updated)
             VALUES (?1, ?2, ?3)",
          )?;
          for (id, ..) in &catalog {
            stmt.execute(rusqlite::params![id, level_raw, at_str])?;
          }
        }
        tx.commit()?;
        Ok(CatalogImport {
          products: catalog.len(),
          sales:    rows.len(),
          stocked:  catalog.len(),
        })
      })
      .await?;

    Ok(summary)
  }

  // ── Sales history ─────────────────────────────────────────────────────────

  async fn record_sales(&self, sales: Vec<SalesObservation>) -> Result<usize> {
    let rows = sale_params(&sales);

    let written = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        insert_sales(&tx, &rows)?;
        tx.commit()?;
        Ok(rows.len())
      })
      .await?;

    Ok(written)
  }

  async fn daily_sales(&self, product_id: ProductId) -> Result<Vec<DailySales>> {
    let raws: Vec<RawDailySales> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT transaction_date, SUM(quantity_sold)
           FROM sales_transactions
           WHERE product_id = ?1
           GROUP BY transaction_date
           ORDER BY transaction_date",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![product_id], |row| {
            Ok(RawDailySales { date: row.get(0)?, quantity: row.get(1)? })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawDailySales::into_daily).collect()
  }

  // ── Stock ─────────────────────────────────────────────────────────────────

  async fn set_stock_level(
    &self,
    product_id:  ProductId,
    stock_level: u64,
  ) -> Result<StockLevel> {
    if !self.product_exists(product_id).await? {
      return Err(Error::ProductNotFound(product_id));
    }

    let level = StockLevel { product_id, stock_level, last_updated: Utc::now() };
    let level_raw = encode_quantity(stock_level)?;
    let at_str    = encode_dt(level.last_updated);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO current_inventory (product_id, stock_level, last_updated)
           VALUES (?1, ?2, ?3)
           ON CONFLICT (product_id) DO UPDATE SET
             stock_level  = excluded.stock_level,
             last_updated = excluded.last_updated",
          rusqlite::params![product_id, level_raw, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(level)
  }

  async fn list_stock_levels(&self) -> Result<Vec<StockLevel>> {
    let raws: Vec<RawStockLevel> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT product_id, stock_level, last_updated
           FROM current_inventory ORDER BY product_id",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawStockLevel {
              product_id:   row.get(0)?,
              stock_level:  row.get(1)?,
              last_updated: row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawStockLevel::into_stock_level).collect()
  }

  // ── Forecasts ─────────────────────────────────────────────────────────────

  async fn replace_forecast(&self, set: ForecastSet) -> Result<()> {
    let product_id = set.product_id;
    let run_id     = encode_uuid(set.run_id);
    let created_at = encode_dt(set.created_at);
    let rows: Vec<(String, i64, i64, i64)> = set
      .points
      .iter()
      .map(|p| {
        (
          encode_date(p.forecast_date),
          i64::from(p.predicted_demand),
          i64::from(p.confidence_lower),
          i64::from(p.confidence_upper),
        )
      })
      .collect();

    // Delete and insert commit together or not at all; a rollback on any
    // failure leaves the previous set live.
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "DELETE FROM demand_forecasts WHERE product_id = ?1",
          rusqlite::params![product_id],
        )?;
        {
          let mut stmt = tx.prepare(
            "INSERT INTO demand_forecasts (
               product_id, run_id, forecast_date, predicted_demand,
               confidence_interval_lower, confidence_interval_upper, created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          )?;
          for (date, demand, lower, upper) in &rows {
            stmt.execute(rusqlite::params![
              product_id, run_id, date, demand, lower, upper, created_at,
            ])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    Ok(())
  }

  async fn live_forecast(&self, product_id: ProductId) -> Result<Option<ForecastSet>> {
    let raws: Vec<RawForecastRow> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT product_id, run_id, forecast_date, predicted_demand,
                  confidence_interval_lower, confidence_interval_upper, created_at
           FROM demand_forecasts
           WHERE product_id = ?1
           ORDER BY forecast_date",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![product_id], |row| {
            Ok(RawForecastRow {
              product_id:       row.get(0)?,
              run_id:           row.get(1)?,
              forecast_date:    row.get(2)?,
              predicted_demand: row.get(3)?,
              lower:            row.get(4)?,
              upper:            row.get(5)?,
              created_at:       row.get(6)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let Some(head) = raws.first() else {
      return Ok(None);
    };

    Ok(Some(ForecastSet {
      product_id,
      run_id: decode_uuid(&head.run_id)?,
      created_at: decode_dt(&head.created_at)?,
      points: raws
        .iter()
        .map(RawForecastRow::to_point)
        .collect::<Result<_>>()?,
    }))
  }

  async fn demand_between(
    &self,
    from: NaiveDate,
    to:   NaiveDate,
  ) -> Result<Vec<WindowDemand>> {
    let from_str = encode_date(from);
    let to_str   = encode_date(to);

    let raws: Vec<RawWindowDemand> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT product_id, SUM(predicted_demand)
           FROM demand_forecasts
           WHERE forecast_date >= ?1
             AND forecast_date <= ?2
           GROUP BY product_id
           ORDER BY product_id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![from_str, to_str], |row| {
            Ok(RawWindowDemand { product_id: row.get(0)?, demand: row.get(1)? })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawWindowDemand::into_demand).collect()
  }
}
