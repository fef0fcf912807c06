//! Product — the catalog identity every other record hangs off.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ProductId;

/// A catalog entry. Created once at catalog load; the core never mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
  pub product_id: ProductId,
  pub sku:        String,
  pub name:       String,
  /// Free-form product type, e.g. `"seasonal_winter"`.
  pub category:   Option<String>,
  pub unit_price: Option<Decimal>,
}
