//! `stockcast simulate`: synthetic sales history for a four-product catalog.
//!
//! Each product follows one demand profile around a base of 50 units/day
//! with Gaussian noise (σ = 10). A day's quantity is the truncated demand and
//! a row is only written when it is positive.

use std::{f64::consts::PI, path::Path};

use chrono::{Datelike as _, Days, NaiveDate};
use rand::{SeedableRng as _, rngs::StdRng};
use rand_distr::{Distribution as _, Normal};
use rust_decimal::Decimal;

use crate::{
  dataset::{self, PRODUCTS_FILE, ProductRow, SALES_FILE, SaleRow},
  error::Result,
};

const BASE_DEMAND: f64 = 50.0;
const SEASONAL_AMPLITUDE: f64 = 40.0;
const NOISE_STD_DEV: f64 = 10.0;
const TREND_START: f64 = 20.0;
const TREND_PER_DAY: f64 = 0.1;

pub const DEFAULT_DAYS: u32 = 730;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemandProfile {
  /// Peaks in January.
  SeasonalWinter,
  /// Peaks in July.
  SeasonalSummer,
  Steady,
  /// Starts low and climbs linearly.
  Trending,
}

impl DemandProfile {
  pub fn as_str(self) -> &'static str {
    match self {
      DemandProfile::SeasonalWinter => "seasonal_winter",
      DemandProfile::SeasonalSummer => "seasonal_summer",
      DemandProfile::Steady => "steady",
      DemandProfile::Trending => "trending",
    }
  }

  /// Noise-free demand on `date`, `day` days into the simulation.
  pub fn mean_demand(self, date: NaiveDate, day: u32) -> f64 {
    let month = f64::from(date.month());
    match self {
      DemandProfile::SeasonalWinter => {
        BASE_DEMAND + SEASONAL_AMPLITUDE * ((month - 1.0) * 2.0 * PI / 12.0).cos()
      }
      DemandProfile::SeasonalSummer => {
        BASE_DEMAND + SEASONAL_AMPLITUDE * ((month - 7.0) * 2.0 * PI / 12.0).cos()
      }
      DemandProfile::Steady => BASE_DEMAND,
      DemandProfile::Trending => TREND_START + TREND_PER_DAY * f64::from(day),
    }
  }
}

struct CatalogEntry {
  id:         i64,
  name:       &'static str,
  sku:        &'static str,
  base_price: Decimal,
  profile:    DemandProfile,
}

fn catalog() -> [CatalogEntry; 4] {
  [
    CatalogEntry {
      id:         1,
      name:       "Winter Jacket",
      sku:        "WIN-001",
      base_price: Decimal::new(12000, 2),
      profile:    DemandProfile::SeasonalWinter,
    },
    CatalogEntry {
      id:         2,
      name:       "Beach Towel",
      sku:        "SUM-002",
      base_price: Decimal::new(2500, 2),
      profile:    DemandProfile::SeasonalSummer,
    },
    CatalogEntry {
      id:         3,
      name:       "AA Batteries",
      sku:        "GEN-003",
      base_price: Decimal::new(1500, 2),
      profile:    DemandProfile::Steady,
    },
    CatalogEntry {
      id:         4,
      name:       "Smart Home Hub",
      sku:        "TEC-004",
      base_price: Decimal::new(20000, 2),
      profile:    DemandProfile::Trending,
    },
  ]
}

// ─── Generation ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct SimulationConfig {
  /// Number of simulated days.
  pub days:     u32,
  /// Last simulated day, normally yesterday.
  pub end_date: NaiveDate,
  /// Fixed seed for reproducible output; `None` draws from the OS.
  pub seed:     Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Simulation {
  pub products: Vec<ProductRow>,
  pub sales:    Vec<SaleRow>,
}

pub fn simulate(config: &SimulationConfig) -> Result<Simulation> {
  let start = config
    .end_date
    .checked_sub_days(Days::new(u64::from(config.days.saturating_sub(1))))
    .ok_or_else(|| {
      stockcast_core::Error::InvalidConfig(format!(
        "{} days before {} is outside the calendar",
        config.days, config.end_date
      ))
    })?;

  let mut rng = match config.seed {
    Some(seed) => StdRng::seed_from_u64(seed),
    None => StdRng::from_entropy(),
  };
  let noise = Normal::new(0.0, NOISE_STD_DEV)
    .map_err(|e| stockcast_core::Error::InvalidConfig(e.to_string()))?;

  let catalog = catalog();
  let mut sales = Vec::new();

  for (day, date) in (0..config.days).zip(start.iter_days()) {
    for entry in &catalog {
      let demand = entry.profile.mean_demand(date, day) + noise.sample(&mut rng);
      let quantity = demand.trunc().max(0.0) as u32;
      if quantity == 0 {
        continue;
      }
      sales.push(SaleRow {
        product_id:       entry.id,
        transaction_date: date,
        quantity_sold:    quantity,
        total_amount:     Some((Decimal::from(quantity) * entry.base_price).round_dp(2)),
      });
    }
  }

  let products = catalog
    .iter()
    .map(|entry| ProductRow {
      id:         entry.id,
      name:       entry.name.to_owned(),
      sku:        entry.sku.to_owned(),
      base_price: Some(entry.base_price),
      kind:       Some(entry.profile.as_str().to_owned()),
    })
    .collect();

  Ok(Simulation { products, sales })
}

/// Write `products.csv` and `sales_transactions.csv` into `dir`.
pub fn write(simulation: &Simulation, dir: &Path) -> Result<()> {
  std::fs::create_dir_all(dir)?;
  dataset::write_rows(&dir.join(PRODUCTS_FILE), &simulation.products)?;
  dataset::write_rows(&dir.join(SALES_FILE), &simulation.sales)?;
  tracing::info!(
    products = simulation.products.len(),
    sales = simulation.sales.len(),
    dir = %dir.display(),
    "wrote simulated dataset"
  );
  Ok(())
}
