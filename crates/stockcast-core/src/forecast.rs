//! Forecast records — what the trainer writes and the reconciler reads.
//!
//! A product has at most one live [`ForecastSet`]. Every training run that
//! produces rows replaces the previous set wholesale; rows from two runs are
//! never mixed.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ProductId;

/// Predicted demand for one product on one future date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastPoint {
  pub product_id:       ProductId,
  pub forecast_date:    NaiveDate,
  pub predicted_demand: u32,
  pub confidence_lower: u32,
  /// Always `>= confidence_lower`.
  pub confidence_upper: u32,
}

/// The complete output of one training run for one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastSet {
  pub product_id: ProductId,
  /// Identifies the training run; every stored row carries it.
  pub run_id:     Uuid,
  pub created_at: DateTime<Utc>,
  /// Ordered by `forecast_date`, one point per date.
  pub points:     Vec<ForecastPoint>,
}

impl ForecastSet {
  pub fn first_date(&self) -> Option<NaiveDate> {
    self.points.first().map(|p| p.forecast_date)
  }

  pub fn last_date(&self) -> Option<NaiveDate> {
    self.points.last().map(|p| p.forecast_date)
  }
}

/// Forecast demand for one product summed over a date window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowDemand {
  pub product_id: ProductId,
  pub demand:     u64,
}
