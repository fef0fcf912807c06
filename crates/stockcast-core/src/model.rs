//! Additive demand model: `y(t) = trend(t) + seasonality(t) + ε`.
//!
//! The trend is piecewise linear with evenly spaced changepoints over the
//! early part of the history. Seasonality is a sum of Fourier terms with a
//! yearly (365.25 day) and optionally a weekly period. All coefficients are
//! fitted jointly by penalised least squares on a scaled target; changepoint
//! and seasonal coefficients carry ridge penalties of `1 / prior_scale²`, the
//! intercept and base slope are left free.
//!
//! A seasonal component is only fitted once the history spans a full period,
//! and its Fourier order is capped so the model never has more free terms
//! than observations.
//!
//! Every prediction carries a two-sided interval built from the in-sample
//! residual spread over the effective residual degrees of freedom, widened
//! for dates beyond the last observation.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};

use crate::{Error, Result, linalg::Cholesky, sales::DailySales};

const YEAR_DAYS: f64 = 365.25;
const WEEK_DAYS: f64 = 7.0;

/// Ridge applied to the intercept and base slope; only keeps the normal
/// equations positive definite.
const UNPENALISED: f64 = 1e-9;

// ─── Configuration ──────────────────────────────────────────────────────────

/// Shape and regularisation of the demand model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
  pub yearly_seasonality:      bool,
  /// Number of Fourier pairs for the yearly component.
  pub yearly_order:            usize,
  pub weekly_seasonality:      bool,
  pub weekly_order:            usize,
  /// Upper bound on trend changepoints; fewer are used for short histories.
  pub n_changepoints:          usize,
  /// Fraction of the history (by observation count) eligible for
  /// changepoints.
  pub changepoint_range:       f64,
  pub changepoint_prior_scale: f64,
  pub seasonality_prior_scale: f64,
  /// Coverage of the prediction interval, in `(0, 1)`.
  pub interval_width:          f64,
}

impl Default for ModelConfig {
  fn default() -> Self {
    Self {
      yearly_seasonality:      true,
      yearly_order:            10,
      weekly_seasonality:      false,
      weekly_order:            3,
      n_changepoints:          25,
      changepoint_range:       0.8,
      changepoint_prior_scale: 0.05,
      seasonality_prior_scale: 10.0,
      interval_width:          0.80,
    }
  }
}

impl ModelConfig {
  pub fn validate(&self) -> Result<()> {
    if !(self.interval_width > 0.0 && self.interval_width < 1.0) {
      return Err(Error::InvalidConfig(format!(
        "interval_width must be in (0, 1), got {}",
        self.interval_width
      )));
    }
    if !(0.0..=1.0).contains(&self.changepoint_range) {
      return Err(Error::InvalidConfig(format!(
        "changepoint_range must be in [0, 1], got {}",
        self.changepoint_range
      )));
    }
    if !(self.changepoint_prior_scale > 0.0) || !(self.seasonality_prior_scale > 0.0)
    {
      return Err(Error::InvalidConfig(
        "prior scales must be positive".to_owned(),
      ));
    }
    if self.yearly_seasonality && self.yearly_order == 0 {
      return Err(Error::InvalidConfig(
        "yearly_order must be at least 1 when yearly seasonality is on".to_owned(),
      ));
    }
    if self.weekly_seasonality && self.weekly_order == 0 {
      return Err(Error::InvalidConfig(
        "weekly_order must be at least 1 when weekly seasonality is on".to_owned(),
      ));
    }
    Ok(())
  }

  /// Seasonal `(period, order)` pairs the history can support. `free` is the
  /// number of coefficients left after the trend; each Fourier pair takes two.
  fn seasonal_terms(&self, span_days: f64, mut free: usize) -> Vec<(f64, usize)> {
    let wanted = [
      (self.yearly_seasonality, YEAR_DAYS, self.yearly_order),
      (self.weekly_seasonality, WEEK_DAYS, self.weekly_order),
    ];

    let mut terms = Vec::new();
    for (enabled, period, order) in wanted {
      if !enabled || span_days < period {
        continue;
      }
      let order = order.min(free / 2);
      if order == 0 {
        continue;
      }
      free -= 2 * order;
      terms.push((period, order));
    }
    terms
  }
}

// ─── Prediction ─────────────────────────────────────────────────────────────

/// Raw model output for one date, before rounding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
  pub date:  NaiveDate,
  pub yhat:  f64,
  pub lower: f64,
  pub upper: f64,
}

// ─── Fitted model ───────────────────────────────────────────────────────────

/// A model fitted to one product's daily sales history.
#[derive(Debug, Clone)]
pub struct DemandModel {
  start:        NaiveDate,
  last:         NaiveDate,
  span_days:    f64,
  changepoints: Vec<f64>,
  seasonal:     Vec<(f64, usize)>,
  beta:         Vec<f64>,
  y_scale:      f64,
  sigma:        f64,
  z:            f64,
}

impl DemandModel {
  /// Fit the model to `history`, which must be ordered by date with one entry
  /// per date (see [`DailySales::aggregate`]).
  pub fn fit(config: &ModelConfig, history: &[DailySales]) -> Result<Self> {
    config.validate()?;

    let (first, last) = match (history.first(), history.last()) {
      (Some(f), Some(l)) => (f.date, l.date),
      _ => return Err(Error::Model("cannot fit an empty history".to_owned())),
    };

    let span_days = ((last - first).num_days() as f64).max(1.0);
    let ts: Vec<f64> = history
      .iter()
      .map(|d| (d.date - first).num_days() as f64 / span_days)
      .collect();

    let changepoints = changepoint_positions(&ts, config);
    let trend_terms = 2 + changepoints.len();
    let seasonal =
      config.seasonal_terms(span_days, history.len().saturating_sub(trend_terms + 1));

    let y_max = history.iter().map(|d| d.quantity).max().unwrap_or(0) as f64;
    let y_scale = if y_max > 0.0 { y_max } else { 1.0 };

    let mut model = Self {
      start: first,
      last,
      span_days,
      changepoints,
      seasonal,
      beta: Vec::new(),
      y_scale,
      sigma: 0.0,
      z: 0.0,
    };

    let penalties = model.penalties(config);
    let p = penalties.len();

    // Normal equations: (XᵀX + Λ) β = Xᵀy
    let mut gram = vec![0.0; p * p];
    let mut xty = vec![0.0; p];
    let mut rows = Vec::with_capacity(history.len());
    for (obs, &t) in history.iter().zip(&ts) {
      let x = model.features(t, obs.date);
      let y = obs.quantity as f64 / y_scale;
      for i in 0..p {
        xty[i] += x[i] * y;
        for j in 0..p {
          gram[i * p + j] += x[i] * x[j];
        }
      }
      rows.push((x, y));
    }
    let mut penalised = gram.clone();
    for (i, lambda) in penalties.iter().enumerate() {
      penalised[i * p + i] += lambda;
    }

    let factor = Cholesky::factor(&penalised, p).ok_or_else(|| {
      Error::Model("normal equations are not positive definite".to_owned())
    })?;
    model.beta = factor.solve(&xty);

    // Effective parameter count of the ridge fit: trace((XᵀX + Λ)⁻¹ XᵀX).
    let effective_params: f64 = (0..p)
      .map(|j| factor.solve(&gram[j * p..(j + 1) * p])[j])
      .sum();

    let sse: f64 = rows
      .iter()
      .map(|(x, y)| {
        let r = y - dot(x, &model.beta);
        r * r
      })
      .sum();
    let dof = history.len() as f64 - effective_params;
    model.sigma = (sse / dof.max(1.0)).sqrt() * y_scale;
    if dof < 1.0 {
      // A saturated fit reproduces its inputs; fall back to their spread.
      model.sigma = model.sigma.max(sample_std(history));
    }

    let normal = Normal::new(0.0, 1.0).map_err(|e| Error::Model(e.to_string()))?;
    model.z = normal.inverse_cdf(0.5 + config.interval_width / 2.0);

    Ok(model)
  }

  /// The last date present in the training history.
  pub fn last_observed(&self) -> NaiveDate { self.last }

  /// Residual standard deviation in demand units.
  pub fn residual_std(&self) -> f64 { self.sigma }

  /// Point prediction and interval for `date`.
  pub fn predict(&self, date: NaiveDate) -> Prediction {
    let t = (date - self.start).num_days() as f64 / self.span_days;
    let yhat = dot(&self.features(t, date), &self.beta) * self.y_scale;

    let ahead = (date - self.last).num_days();
    let widen = if ahead > 0 {
      (1.0 + ahead as f64 / self.span_days).sqrt()
    } else {
      1.0
    };
    let half = self.z * self.sigma * widen;

    Prediction { date, yhat, lower: yhat - half, upper: yhat + half }
  }

  /// Design row: `[1, t, hinge(t - c)…, sin/cos pairs…]`.
  fn features(&self, t: f64, date: NaiveDate) -> Vec<f64> {
    let mut x = Vec::with_capacity(2 + self.changepoints.len() + 2 * self.fourier_len());
    x.push(1.0);
    x.push(t);
    x.extend(self.changepoints.iter().map(|c| (t - c).max(0.0)));

    let day = f64::from(date.num_days_from_ce());
    for &(period, order) in &self.seasonal {
      for k in 1..=order {
        let angle = 2.0 * std::f64::consts::PI * k as f64 * day / period;
        x.push(angle.sin());
        x.push(angle.cos());
      }
    }
    x
  }

  fn fourier_len(&self) -> usize { self.seasonal.iter().map(|(_, order)| order).sum() }

  fn penalties(&self, config: &ModelConfig) -> Vec<f64> {
    let cp = 1.0 / (config.changepoint_prior_scale * config.changepoint_prior_scale);
    let season =
      1.0 / (config.seasonality_prior_scale * config.seasonality_prior_scale);

    let mut penalties = vec![UNPENALISED, UNPENALISED];
    penalties.extend(std::iter::repeat_n(cp, self.changepoints.len()));
    penalties.extend(std::iter::repeat_n(season, 2 * self.fourier_len()));
    penalties
  }
}

/// Evenly spaced changepoints over the first `changepoint_range` of the
/// observations, never at the first observation.
fn changepoint_positions(ts: &[f64], config: &ModelConfig) -> Vec<f64> {
  let eligible = (ts.len() as f64 * config.changepoint_range).floor() as usize;
  let count = config.n_changepoints.min(eligible.saturating_sub(1));
  if count == 0 {
    return Vec::new();
  }

  let last_index = (eligible - 1) as f64;
  (1..=count)
    .map(|j| {
      let idx = (j as f64 * last_index / count as f64).round() as usize;
      ts[idx]
    })
    .collect()
}

fn sample_std(history: &[DailySales]) -> f64 {
  if history.len() < 2 {
    return 0.0;
  }
  let n = history.len() as f64;
  let mean = history.iter().map(|d| d.quantity as f64).sum::<f64>() / n;
  let ss: f64 = history
    .iter()
    .map(|d| {
      let e = d.quantity as f64 - mean;
      e * e
    })
    .sum();
  (ss / (n - 1.0)).sqrt()
}

fn dot(a: &[f64], b: &[f64]) -> f64 { a.iter().zip(b).map(|(x, y)| x * y).sum() }
