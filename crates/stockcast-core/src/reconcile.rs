//! Reorder reconciliation: live stock joined with forecast demand.
//!
//! The reconciler is a pure read. It sums forecast demand over the lookahead
//! window `[today, today + lookahead_days]`, left-joins that onto every stock
//! record, and applies [`ReorderPolicy::evaluate`]. Nothing is written back.

use std::collections::HashMap;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::{
  Error, ProductId, Result,
  forecast::WindowDemand,
  product::Product,
  stock::StockLevel,
  store::InventoryStore,
};

// ─── Policy ─────────────────────────────────────────────────────────────────

/// Thresholds for turning stock and demand into a recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReorderPolicy {
  /// Days of forecast demand summed after `today` (inclusive on both ends).
  pub lookahead_days: u32,
  /// Units ordered on top of the strict shortfall.
  pub safety_buffer:  u64,
}

impl Default for ReorderPolicy {
  fn default() -> Self { Self { lookahead_days: 7, safety_buffer: 10 } }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Recommendation {
  Healthy,
  LowStock,
}

impl ReorderPolicy {
  /// The inclusive date window demand is summed over.
  pub fn window(&self, today: NaiveDate) -> Result<(NaiveDate, NaiveDate)> {
    let end = today
      .checked_add_days(Days::new(u64::from(self.lookahead_days)))
      .ok_or_else(|| {
        Error::InvalidConfig(format!(
          "lookahead of {} days overflows the calendar",
          self.lookahead_days
        ))
      })?;
    Ok((today, end))
  }

  /// Demand must strictly exceed stock to trigger a reorder. The quantity
  /// saturates at `u64::MAX` rather than wrapping.
  pub fn evaluate(&self, stock: u64, demand: u64) -> (Recommendation, u64) {
    if stock < demand {
      (Recommendation::LowStock, (demand - stock).saturating_add(self.safety_buffer))
    } else {
      (Recommendation::Healthy, 0)
    }
  }
}

// ─── Output ─────────────────────────────────────────────────────────────────

/// One row of the status read model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReorderStatus {
  pub product_id:       ProductId,
  pub name:             String,
  pub current_stock:    u64,
  #[serde(rename = "predicted_demand_next_7_days")]
  pub predicted_demand: u64,
  pub recommendation:   Recommendation,
  pub reorder_quantity: u64,
}

/// A stock record whose product is missing from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataIntegrityMismatch {
  pub product_id:  ProductId,
  pub stock_level: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reconciliation {
  pub window_start: NaiveDate,
  pub window_end:   NaiveDate,
  /// Ordered by product id.
  pub statuses:     Vec<ReorderStatus>,
  /// Stock rows excluded from `statuses`.
  pub mismatches:   Vec<DataIntegrityMismatch>,
}

impl Reconciliation {
  pub fn low_stock(&self) -> impl Iterator<Item = &ReorderStatus> {
    self
      .statuses
      .iter()
      .filter(|s| s.recommendation == Recommendation::LowStock)
  }
}

// ─── Reconciler ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default)]
pub struct Reconciler {
  policy: ReorderPolicy,
}

impl Reconciler {
  pub fn new(policy: ReorderPolicy) -> Self { Self { policy } }

  /// Join a snapshot of catalog, stock and window demand. Pure; the same
  /// snapshot always yields the same output.
  pub fn reconcile(
    &self,
    window: (NaiveDate, NaiveDate),
    catalog: &[Product],
    stock: &[StockLevel],
    demand: &[WindowDemand],
  ) -> Reconciliation {
    let names: HashMap<ProductId, &str> =
      catalog.iter().map(|p| (p.product_id, p.name.as_str())).collect();
    let demand_by_product: HashMap<ProductId, u64> =
      demand.iter().map(|d| (d.product_id, d.demand)).collect();

    let mut rows: Vec<&StockLevel> = stock.iter().collect();
    rows.sort_by_key(|s| s.product_id);

    let mut statuses = Vec::with_capacity(rows.len());
    let mut mismatches = Vec::new();

    for level in rows {
      let Some(name) = names.get(&level.product_id) else {
        mismatches.push(DataIntegrityMismatch {
          product_id:  level.product_id,
          stock_level: level.stock_level,
        });
        continue;
      };

      let predicted_demand =
        demand_by_product.get(&level.product_id).copied().unwrap_or(0);
      let (recommendation, reorder_quantity) =
        self.policy.evaluate(level.stock_level, predicted_demand);

      statuses.push(ReorderStatus {
        product_id: level.product_id,
        name: (*name).to_owned(),
        current_stock: level.stock_level,
        predicted_demand,
        recommendation,
        reorder_quantity,
      });
    }

    Reconciliation {
      window_start: window.0,
      window_end: window.1,
      statuses,
      mismatches,
    }
  }

  /// Read stock and window demand from `store` and reconcile them.
  ///
  /// A store failure aborts the whole call; callers never see a partially
  /// merged result.
  pub async fn status<S>(&self, store: &S, today: NaiveDate) -> Result<Reconciliation>
  where
    S: InventoryStore,
  {
    let window = self.policy.window(today)?;

    let stock = store.list_stock_levels().await.map_err(Error::store)?;
    let demand = store
      .demand_between(window.0, window.1)
      .await
      .map_err(Error::store)?;
    let catalog = store.list_products().await.map_err(Error::store)?;

    let reconciliation = self.reconcile(window, &catalog, &stock, &demand);
    for m in &reconciliation.mismatches {
      tracing::warn!(
        product_id = m.product_id,
        stock_level = m.stock_level,
        "stock record references a product missing from the catalog"
      );
    }
    for low in reconciliation.low_stock() {
      tracing::debug!(
        product_id = low.product_id,
        recommendation = %low.recommendation,
        reorder_quantity = low.reorder_quantity,
        "reorder needed"
      );
    }
    tracing::info!(
      products = reconciliation.statuses.len(),
      low_stock = reconciliation.low_stock().count(),
      window_start = %window.0,
      window_end = %window.1,
      "reconciled inventory"
    );
    Ok(reconciliation)
  }
}

#[cfg(test)]
mod tests {
  use chrono::{TimeZone, Utc};

  use super::*;

  fn product(id: ProductId, name: &str) -> Product {
    Product {
      product_id: id,
      sku:        format!("SKU-{id:03}"),
      name:       name.to_owned(),
      category:   None,
      unit_price: None,
    }
  }

  fn stock(id: ProductId, level: u64) -> StockLevel {
    StockLevel {
      product_id:   id,
      stock_level:  level,
      last_updated: Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap(),
    }
  }

  fn window() -> (NaiveDate, NaiveDate) {
    ReorderPolicy::default()
      .window(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap())
      .unwrap()
  }

  #[test]
  fn window_is_inclusive_of_both_ends() {
    let (start, end) = window();
    assert_eq!(start, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
    assert_eq!(end, NaiveDate::from_ymd_opt(2024, 6, 8).unwrap());
  }

  #[test]
  fn seventy_units_of_demand_against_fifty_in_stock() {
    let r = Reconciler::default().reconcile(
      window(),
      &[product(1, "Winter Jacket")],
      &[stock(1, 50)],
      &[WindowDemand { product_id: 1, demand: 70 }],
    );

    assert_eq!(r.statuses, vec![ReorderStatus {
      product_id:       1,
      name:             "Winter Jacket".into(),
      current_stock:    50,
      predicted_demand: 70,
      recommendation:   Recommendation::LowStock,
      reorder_quantity: 30,
    }]);
  }

  #[test]
  fn tie_is_healthy_and_one_short_is_low() {
    let policy = ReorderPolicy::default();
    assert_eq!(policy.evaluate(40, 40), (Recommendation::Healthy, 0));
    assert_eq!(policy.evaluate(39, 40), (Recommendation::LowStock, 1 + 10));
  }

  #[test]
  fn missing_forecast_counts_as_zero_demand() {
    let r = Reconciler::default().reconcile(
      window(),
      &[product(3, "AA Batteries")],
      &[stock(3, 0)],
      &[],
    );

    let status = &r.statuses[0];
    assert_eq!(status.predicted_demand, 0);
    assert_eq!(status.recommendation, Recommendation::Healthy);
    assert_eq!(status.reorder_quantity, 0);
  }

  #[test]
  fn reorder_quantity_is_positive_exactly_when_low() {
    let policy = ReorderPolicy { lookahead_days: 7, safety_buffer: 0 };
    for stock in 0..20u64 {
      for demand in 0..20u64 {
        let (rec, qty) = policy.evaluate(stock, demand);
        assert_eq!(qty > 0, rec == Recommendation::LowStock, "stock {stock}, demand {demand}");
      }
    }
  }

  #[test]
  fn custom_buffer_is_applied() {
    let policy = ReorderPolicy { lookahead_days: 14, safety_buffer: 25 };
    assert_eq!(policy.evaluate(5, 10), (Recommendation::LowStock, 30));
  }

  #[test]
  fn huge_buffer_saturates_instead_of_overflowing() {
    let policy = ReorderPolicy { lookahead_days: 7, safety_buffer: u64::MAX };
    assert_eq!(policy.evaluate(0, 5), (Recommendation::LowStock, u64::MAX));
    assert_eq!(policy.evaluate(5, 5), (Recommendation::Healthy, 0));
  }

  #[test]
  fn stock_without_catalog_entry_is_reported_not_fabricated() {
    let r = Reconciler::default().reconcile(
      window(),
      &[product(1, "Winter Jacket")],
      &[stock(2, 12), stock(1, 80)],
      &[WindowDemand { product_id: 2, demand: 100 }],
    );

    assert_eq!(r.statuses.len(), 1);
    assert_eq!(r.statuses[0].product_id, 1);
    assert_eq!(r.mismatches, vec![DataIntegrityMismatch { product_id: 2, stock_level: 12 }]);
  }

  #[test]
  fn output_is_ordered_and_repeatable() {
    let catalog = [product(2, "Beach Towel"), product(1, "Winter Jacket")];
    let levels = [stock(2, 5), stock(1, 5)];
    let demand = [WindowDemand { product_id: 2, demand: 9 }];

    let reconciler = Reconciler::default();
    let first = reconciler.reconcile(window(), &catalog, &levels, &demand);
    let second = reconciler.reconcile(window(), &catalog, &levels, &demand);

    let ids: Vec<_> = first.statuses.iter().map(|s| s.product_id).collect();
    assert_eq!(ids, vec![1, 2]);
    assert_eq!(
      serde_json::to_string(&first).unwrap(),
      serde_json::to_string(&second).unwrap()
    );
    assert_eq!(first.low_stock().count(), 1);
  }

  #[test]
  fn status_serialises_with_wire_field_names() {
    let status = ReorderStatus {
      product_id:       4,
      name:             "Smart Home Hub".into(),
      current_stock:    50,
      predicted_demand: 61,
      recommendation:   Recommendation::LowStock,
      reorder_quantity: 21,
    };

    let json = serde_json::to_value(&status).unwrap();
    assert_eq!(json["predicted_demand_next_7_days"], 61);
    assert_eq!(json["recommendation"], "low_stock");
    assert_eq!(Recommendation::LowStock.to_string(), "low_stock");
  }
}
