//! Sales history — the append-only ledger the trainer learns from.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ProductId;

/// One recorded sale. Several observations may share a date; they are summed
/// into a single [`DailySales`] when history is read back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesObservation {
  pub product_id:    ProductId,
  pub date:          NaiveDate,
  pub quantity_sold: u32,
  /// Revenue of the sale, kept for the ledger; the model ignores it.
  #[serde(default)]
  pub total_amount:  Option<Decimal>,
}

/// Total quantity sold for one product on one calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySales {
  pub date:     NaiveDate,
  pub quantity: u64,
}

impl DailySales {
  /// Collapse arbitrary `(date, quantity)` rows into one entry per date,
  /// ordered by date.
  pub fn aggregate<I>(rows: I) -> Vec<DailySales>
  where
    I: IntoIterator<Item = DailySales>,
  {
    let mut by_date: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for row in rows {
      *by_date.entry(row.date).or_default() += row.quantity;
    }
    by_date
      .into_iter()
      .map(|(date, quantity)| DailySales { date, quantity })
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn day(d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(2024, 3, d).unwrap() }

  #[test]
  fn aggregate_sums_duplicate_dates_and_sorts() {
    let rows = vec![
      DailySales { date: day(3), quantity: 4 },
      DailySales { date: day(1), quantity: 2 },
      DailySales { date: day(3), quantity: 6 },
    ];

    let daily = DailySales::aggregate(rows);
    assert_eq!(daily, vec![
      DailySales { date: day(1), quantity: 2 },
      DailySales { date: day(3), quantity: 10 },
    ]);
  }

  #[test]
  fn aggregate_of_nothing_is_empty() {
    assert!(DailySales::aggregate(Vec::new()).is_empty());
  }
}
