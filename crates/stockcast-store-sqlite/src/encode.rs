//! Encoding and decoding helpers between Rust domain types and the plain
//! representations stored in SQLite columns.
//!
//! Calendar dates are stored as `YYYY-MM-DD` so they compare correctly as
//! text. Timestamps are RFC 3339 strings, UUIDs hyphenated lowercase, prices
//! decimal strings. Quantities are `INTEGER` columns, range-checked on the
//! way back out.

use std::str::FromStr as _;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use stockcast_core::{
  ProductId,
  forecast::{ForecastPoint, WindowDemand},
  product::Product,
  sales::DailySales,
  stock::StockLevel,
};
use uuid::Uuid;

use crate::{Error, Result};

const DATE_FORMAT: &str = "%Y-%m-%d";

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format(DATE_FORMAT).to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, DATE_FORMAT)
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Price ───────────────────────────────────────────────────────────────────

pub fn encode_price(p: Decimal) -> String { p.to_string() }

pub fn decode_price(s: &str) -> Result<Decimal> { Ok(Decimal::from_str(s)?) }

// ─── Quantities ──────────────────────────────────────────────────────────────

pub fn encode_quantity(q: u64) -> Result<i64> {
  i64::try_from(q).map_err(|_| Error::OutOfRange(i64::MAX))
}

pub fn decode_quantity(raw: i64) -> Result<u64> {
  u64::try_from(raw).map_err(|_| Error::OutOfRange(raw))
}

pub fn decode_units(raw: i64) -> Result<u32> {
  u32::try_from(raw).map_err(|_| Error::OutOfRange(raw))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `products` row.
pub struct RawProduct {
  pub product_id: i64,
  pub sku:        String,
  pub name:       String,
  pub category:   Option<String>,
  pub unit_price: Option<String>,
}

impl RawProduct {
  pub fn into_product(self) -> Result<Product> {
    Ok(Product {
      product_id: self.product_id,
      sku:        self.sku,
      name:       self.name,
      category:   self.category,
      unit_price: self.unit_price.as_deref().map(decode_price).transpose()?,
    })
  }
}

/// Raw values read directly from a `current_inventory` row.
pub struct RawStockLevel {
  pub product_id:   i64,
  pub stock_level:  i64,
  pub last_updated: String,
}

impl RawStockLevel {
  pub fn into_stock_level(self) -> Result<StockLevel> {
    Ok(StockLevel {
      product_id:   self.product_id,
      stock_level:  decode_quantity(self.stock_level)?,
      last_updated: decode_dt(&self.last_updated)?,
    })
  }
}

/// One `(date, SUM(quantity))` row of a product's sales history.
pub struct RawDailySales {
  pub date:     String,
  pub quantity: i64,
}

impl RawDailySales {
  pub fn into_daily(self) -> Result<DailySales> {
    Ok(DailySales {
      date:     decode_date(&self.date)?,
      quantity: decode_quantity(self.quantity)?,
    })
  }
}

/// Raw values read directly from a `demand_forecasts` row.
pub struct RawForecastRow {
  pub product_id:       i64,
  pub run_id:           String,
  pub forecast_date:    String,
  pub predicted_demand: i64,
  pub lower:            i64,
  pub upper:            i64,
  pub created_at:       String,
}

impl RawForecastRow {
  pub fn to_point(&self) -> Result<ForecastPoint> {
    Ok(ForecastPoint {
      product_id:       self.product_id,
      forecast_date:    decode_date(&self.forecast_date)?,
      predicted_demand: decode_units(self.predicted_demand)?,
      confidence_lower: decode_units(self.lower)?,
      confidence_upper: decode_units(self.upper)?,
    })
  }
}

/// One `(product_id, SUM(predicted_demand))` row.
pub struct RawWindowDemand {
  pub product_id: ProductId,
  pub demand:     i64,
}

impl RawWindowDemand {
  pub fn into_demand(self) -> Result<WindowDemand> {
    Ok(WindowDemand {
      product_id: self.product_id,
      demand:     decode_quantity(self.demand)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn dates_sort_as_text() {
    let a = encode_date(NaiveDate::from_ymd_opt(2024, 9, 30).unwrap());
    let b = encode_date(NaiveDate::from_ymd_opt(2024, 10, 1).unwrap());
    assert_eq!(a, "2024-09-30");
    assert!(a < b);
  }

  #[test]
  fn negative_quantity_is_rejected() {
    assert!(matches!(decode_quantity(-1), Err(Error::OutOfRange(-1))));
  }

  #[test]
  fn price_keeps_its_scale() {
    let price = decode_price("120.00").unwrap();
    assert_eq!(encode_price(price), "120.00");
  }
}
