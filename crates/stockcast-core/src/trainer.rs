//! Forecast trainer: sales history in, a fresh forecast set out.
//!
//! Training one product is a single unit of work: read the history, fit a
//! [`DemandModel`], project it forward, and swap the product's forecast set
//! in one atomic store call. Products that cannot be trained are skipped with
//! a [`Skipped`] reason; nothing is written for them.

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, ProductId, Result,
  forecast::{ForecastPoint, ForecastSet},
  model::{DemandModel, ModelConfig, Prediction},
  sales::DailySales,
  store::InventoryStore,
};

// ─── Configuration ──────────────────────────────────────────────────────────

/// Trainer settings. Every field has a default so partial config files work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
  /// Minimum number of distinct sale dates required to fit a model.
  pub min_observations:  usize,
  /// Days forecast past `max(last sale, today)`.
  pub horizon_days:      u32,
  /// Treat dates between the first and last sale without a record as zero
  /// demand instead of leaving them out of the fit.
  pub fill_missing_days: bool,
  pub model:             ModelConfig,
}

impl Default for TrainerConfig {
  fn default() -> Self {
    Self {
      min_observations:  5,
      horizon_days:      60,
      fill_missing_days: false,
      model:             ModelConfig::default(),
    }
  }
}

impl TrainerConfig {
  pub fn validate(&self) -> Result<()> {
    if self.min_observations == 0 {
      return Err(Error::InvalidConfig(
        "min_observations must be at least 1".to_owned(),
      ));
    }
    self.model.validate()
  }
}

// ─── Outcomes ───────────────────────────────────────────────────────────────

/// Why a product was not (re)trained. Neither case is fatal and neither
/// touches the stored forecast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Skipped {
  /// Fewer distinct sale dates than `min_observations`.
  InsufficientHistory { observations: usize, required: usize },
  /// The model produced no dates after the last sale; any previous forecast
  /// is kept.
  EmptyForecastWindow { last_sale: NaiveDate },
}

/// The forecast a training run would commit, before it is persisted.
#[derive(Debug, Clone, PartialEq)]
pub enum Draft {
  Ready(Vec<ForecastPoint>),
  Skipped(Skipped),
}

/// Summary of a committed training run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainedRun {
  pub run_id:     Uuid,
  pub points:     usize,
  pub first_date: NaiveDate,
  pub last_date:  NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TrainingOutcome {
  Trained(TrainedRun),
  Skipped(Skipped),
}

/// Per-product results of a batch run, in catalog order.
#[derive(Debug, Default)]
pub struct BatchReport {
  pub results: Vec<(ProductId, Result<TrainingOutcome>)>,
}

impl BatchReport {
  pub fn trained(&self) -> usize {
    self
      .results
      .iter()
      .filter(|(_, r)| matches!(r, Ok(TrainingOutcome::Trained(_))))
      .count()
  }

  pub fn skipped(&self) -> usize {
    self
      .results
      .iter()
      .filter(|(_, r)| matches!(r, Ok(TrainingOutcome::Skipped(_))))
      .count()
  }

  pub fn failed(&self) -> usize { self.results.iter().filter(|(_, r)| r.is_err()).count() }
}

// ─── Trainer ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Trainer {
  config: TrainerConfig,
}

impl Trainer {
  pub fn new(config: TrainerConfig) -> Result<Self> {
    config.validate()?;
    Ok(Self { config })
  }

  /// Build the forecast for one product from its history without touching
  /// any store.
  ///
  /// Predictions run through `max(last sale, today) + horizon_days`, so a
  /// history that ends well before `today` still covers the coming days.
  /// Only dates strictly after the last sale are kept.
  pub fn draft(
    &self,
    product_id: ProductId,
    history: &[DailySales],
    today: NaiveDate,
  ) -> Result<Draft> {
    let observed = DailySales::aggregate(history.iter().copied());
    if observed.len() < self.config.min_observations {
      return Ok(Draft::Skipped(Skipped::InsufficientHistory {
        observations: observed.len(),
        required:     self.config.min_observations,
      }));
    }

    let training = if self.config.fill_missing_days {
      fill_gaps(&observed)
    } else {
      observed
    };

    let model = DemandModel::fit(&self.config.model, &training)?;
    let last_sale = model.last_observed();

    let horizon_end = last_sale
      .max(today)
      .checked_add_days(Days::new(u64::from(self.config.horizon_days)))
      .ok_or_else(|| Error::Model(format!("horizon overflows the calendar after {last_sale}")))?;

    let points: Vec<ForecastPoint> = last_sale
      .iter_days()
      .take_while(|d| *d <= horizon_end)
      .filter(|d| *d > last_sale)
      .map(|d| to_point(product_id, model.predict(d)))
      .collect();

    if points.is_empty() {
      return Ok(Draft::Skipped(Skipped::EmptyForecastWindow { last_sale }));
    }
    Ok(Draft::Ready(points))
  }

  /// Train one product and, if a forecast was produced, replace its stored
  /// set atomically.
  pub async fn train<S>(
    &self,
    store: &S,
    product_id: ProductId,
    today: NaiveDate,
  ) -> Result<TrainingOutcome>
  where
    S: InventoryStore,
  {
    let history = store.daily_sales(product_id).await.map_err(Error::store)?;

    let points = match self.draft(product_id, &history, today)? {
      Draft::Ready(points) => points,
      Draft::Skipped(reason) => return Ok(TrainingOutcome::Skipped(reason)),
    };

    let set = ForecastSet {
      product_id,
      run_id: Uuid::new_v4(),
      created_at: Utc::now(),
      points,
    };
    let run = summarize(&set);

    store.replace_forecast(set).await.map_err(Error::store)?;
    Ok(TrainingOutcome::Trained(run))
  }

  /// Train every catalog product in turn.
  ///
  /// A failure for one product is recorded in the report and the batch moves
  /// on; products already committed stay committed. Only a failure to list
  /// the catalog aborts the batch.
  pub async fn train_all<S>(&self, store: &S, today: NaiveDate) -> Result<BatchReport>
  where
    S: InventoryStore,
  {
    let products = store.list_products().await.map_err(Error::store)?;
    let mut report = BatchReport::default();

    for product in products {
      tracing::info!(product_id = product.product_id, name = %product.name, "training model");
      let result = self.train(store, product.product_id, today).await;

      match &result {
        Ok(TrainingOutcome::Trained(run)) => tracing::info!(
          product_id = product.product_id,
          points = run.points,
          from = %run.first_date,
          to = %run.last_date,
          "saved forecast"
        ),
        Ok(TrainingOutcome::Skipped(Skipped::InsufficientHistory { observations, required })) => {
          tracing::warn!(
            product_id = product.product_id,
            observations,
            required,
            "not enough history, skipping"
          )
        }
        Ok(TrainingOutcome::Skipped(Skipped::EmptyForecastWindow { last_sale })) => {
          tracing::warn!(
            product_id = product.product_id,
            %last_sale,
            "no future predictions, keeping previous forecast"
          )
        }
        Err(e) => tracing::error!(product_id = product.product_id, error = %e, "training failed"),
      }

      report.results.push((product.product_id, result));
    }

    Ok(report)
  }
}

/// Round to the nearest unit and clamp at zero; `as` saturates NaN to 0.
fn to_units(value: f64) -> u32 { value.round().max(0.0) as u32 }

fn to_point(product_id: ProductId, p: Prediction) -> ForecastPoint {
  let predicted_demand = to_units(p.yhat);
  let confidence_lower = to_units(p.lower).min(predicted_demand);
  let confidence_upper = to_units(p.upper).max(predicted_demand);
  ForecastPoint {
    product_id,
    forecast_date: p.date,
    predicted_demand,
    confidence_lower,
    confidence_upper,
  }
}

fn summarize(set: &ForecastSet) -> TrainedRun {
  TrainedRun {
    run_id:     set.run_id,
    points:     set.points.len(),
    // `draft` never yields an empty set.
    first_date: set.first_date().unwrap_or_default(),
    last_date:  set.last_date().unwrap_or_default(),
  }
}

fn fill_gaps(observed: &[DailySales]) -> Vec<DailySales> {
  let (Some(first), Some(last)) = (observed.first(), observed.last()) else {
    return Vec::new();
  };
  let known: BTreeMap<NaiveDate, u64> =
    observed.iter().map(|d| (d.date, d.quantity)).collect();

  first
    .date
    .iter_days()
    .take_while(|d| *d <= last.date)
    .map(|date| DailySales { date, quantity: known.get(&date).copied().unwrap_or(0) })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  fn steady_history(start: NaiveDate, days: u64) -> Vec<DailySales> {
    (0..days)
      .map(|i| DailySales {
        date:     start + Days::new(i),
        quantity: 30 + (i % 5),
      })
      .collect()
  }

  #[test]
  fn too_few_dates_is_insufficient_history() {
    let trainer = Trainer::new(TrainerConfig::default()).unwrap();
    let history = steady_history(date(2024, 1, 1), 4);

    let draft = trainer.draft(1, &history, date(2024, 1, 5)).unwrap();
    assert_eq!(
      draft,
      Draft::Skipped(Skipped::InsufficientHistory { observations: 4, required: 5 })
    );
  }

  #[test]
  fn duplicate_dates_count_once_toward_the_threshold() {
    let trainer = Trainer::new(TrainerConfig::default()).unwrap();
    let mut history = steady_history(date(2024, 1, 1), 4);
    history.extend(steady_history(date(2024, 1, 1), 4));

    let draft = trainer.draft(1, &history, date(2024, 1, 5)).unwrap();
    assert!(matches!(
      draft,
      Draft::Skipped(Skipped::InsufficientHistory { observations: 4, .. })
    ));
  }

  #[test]
  fn forecast_is_strictly_after_last_sale_and_reaches_past_today() {
    let trainer = Trainer::new(TrainerConfig::default()).unwrap();
    let history = steady_history(date(2024, 1, 1), 90);
    let last_sale = date(2024, 3, 30);
    // History ended two weeks before "today".
    let today = date(2024, 4, 13);

    let Draft::Ready(points) = trainer.draft(7, &history, today).unwrap() else {
      panic!("expected a forecast");
    };

    assert_eq!(points.first().unwrap().forecast_date, date(2024, 3, 31));
    assert_eq!(points.last().unwrap().forecast_date, today + Days::new(60));
    assert!(points.iter().all(|p| p.forecast_date > last_sale));
    assert!(points.iter().all(|p| p.product_id == 7));
    assert!(points.windows(2).all(|w| w[0].forecast_date < w[1].forecast_date));
  }

  #[test]
  fn points_are_non_negative_and_ordered() {
    let trainer = Trainer::new(TrainerConfig::default()).unwrap();
    // Collapsing demand drives the trend below zero.
    let history: Vec<DailySales> = (0..60)
      .map(|i| DailySales {
        date:     date(2024, 1, 1) + Days::new(i),
        quantity: 120u64.saturating_sub(2 * i),
      })
      .collect();

    let Draft::Ready(points) = trainer.draft(1, &history, date(2024, 3, 1)).unwrap() else {
      panic!("expected a forecast");
    };
    assert!(points.iter().any(|p| p.predicted_demand == 0));
    for p in &points {
      assert!(p.confidence_lower <= p.predicted_demand);
      assert!(p.predicted_demand <= p.confidence_upper);
    }
  }

  #[test]
  fn zero_horizon_with_fresh_history_is_an_empty_window() {
    let config = TrainerConfig { horizon_days: 0, ..Default::default() };
    let trainer = Trainer::new(config).unwrap();
    let history = steady_history(date(2024, 1, 1), 30);
    let last_sale = date(2024, 1, 30);

    let draft = trainer.draft(1, &history, last_sale).unwrap();
    assert_eq!(draft, Draft::Skipped(Skipped::EmptyForecastWindow { last_sale }));
  }

  #[test]
  fn fill_gaps_inserts_zero_days() {
    let observed = vec![
      DailySales { date: date(2024, 1, 1), quantity: 5 },
      DailySales { date: date(2024, 1, 4), quantity: 7 },
    ];
    let filled = fill_gaps(&observed);
    let quantities: Vec<u64> = filled.iter().map(|d| d.quantity).collect();
    assert_eq!(quantities, vec![5, 0, 0, 7]);
  }

  #[test]
  fn rejects_zero_min_observations() {
    let config = TrainerConfig { min_observations: 0, ..Default::default() };
    assert!(matches!(Trainer::new(config), Err(Error::InvalidConfig(_))));
  }
}
