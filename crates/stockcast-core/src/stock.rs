//! Current stock on hand.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ProductId;

/// The current stock level of a product. Written by the inventory-adjustment
/// process; the reconciler only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevel {
  pub product_id:   ProductId,
  pub stock_level:  u64,
  pub last_updated: DateTime<Utc>,
}
