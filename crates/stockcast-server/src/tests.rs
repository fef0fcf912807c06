use std::sync::Arc;

use axum::{
  body::Body,
  http::{Request, StatusCode},
};
use chrono::NaiveDate;
use stockcast_core::{
  product::Product,
  reconcile::{Recommendation, Reconciler},
  sales::SalesObservation,
  store::InventoryStore,
  trainer::Trainer,
};
use stockcast_store_sqlite::SqliteStore;
use tower::ServiceExt as _;

use super::*;
use crate::{
  dataset::{PRODUCTS_FILE, SALES_FILE},
  simulate::{Simulation, SimulationConfig},
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
  NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn two_years_to_may(seed: u64) -> Simulation {
  simulate::simulate(&SimulationConfig {
    days:     730,
    end_date: date(2024, 5, 31),
    seed:     Some(seed),
  })
  .unwrap()
}

fn split(sim: Simulation) -> (Vec<Product>, Vec<SalesObservation>) {
  (
    sim.products.into_iter().map(Product::from).collect(),
    sim.sales.into_iter().map(SalesObservation::from).collect(),
  )
}

// ── Settings ─────────────────────────────────────────────────────────────────

#[test]
fn missing_config_file_yields_defaults() {
  let dir = tempfile::tempdir().unwrap();
  let settings = Settings::load(dir.path().join("absent.toml")).unwrap();
  assert_eq!(settings, Settings::default());
  assert_eq!(settings.address(), "127.0.0.1:8000");
}

#[test]
fn partial_config_file_keeps_other_defaults() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("stockcast.toml");
  std::fs::write(
    &path,
    r#"
port = 9000
store_path = "/var/lib/stockcast/inventory.db"

[policy]
safety_buffer = 25

[trainer]
horizon_days = 30

[trainer.model]
weekly_seasonality = true
"#,
  )
  .unwrap();

  let settings = Settings::load(&path).unwrap();
  assert_eq!(settings.port, 9000);
  assert_eq!(settings.host, "127.0.0.1");
  assert_eq!(settings.store_path, PathBuf::from("/var/lib/stockcast/inventory.db"));
  assert_eq!(settings.policy.safety_buffer, 25);
  assert_eq!(settings.policy.lookahead_days, 7);
  assert_eq!(settings.trainer.horizon_days, 30);
  assert_eq!(settings.trainer.min_observations, 5);
  assert!(settings.trainer.model.weekly_seasonality);
  assert!(settings.trainer.model.yearly_seasonality);
}

#[test]
fn invalid_trainer_config_is_rejected_at_load() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("stockcast.toml");
  std::fs::write(&path, "[trainer]\nmin_observations = 0\n").unwrap();

  assert!(matches!(Settings::load(&path), Err(Error::Core(_))));
}

// ── Load ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn simulated_files_load_into_a_fresh_store() {
  let dir = tempfile::tempdir().unwrap();
  let sim = two_years_to_may(11);
  simulate::write(&sim, dir.path()).unwrap();

  let store = SqliteStore::open_in_memory().await.unwrap();
  let summary = load::load_files(
    &store,
    &dir.path().join(PRODUCTS_FILE),
    &dir.path().join(SALES_FILE),
    load::DEFAULT_INITIAL_STOCK,
  )
  .await
  .unwrap();

  assert_eq!(summary.products, 4);
  assert_eq!(summary.sales, sim.sales.len());
  assert_eq!(summary.stocked, 4);

  let levels = store.list_stock_levels().await.unwrap();
  assert!(levels.iter().all(|l| l.stock_level == 50));

  let jacket = store.get_product(1).await.unwrap().unwrap();
  assert_eq!(jacket.name, "Winter Jacket");
  assert_eq!(jacket.category.as_deref(), Some("seasonal_winter"));
}

#[tokio::test]
async fn load_refuses_a_store_with_a_catalog() {
  let store = SqliteStore::open_in_memory().await.unwrap();
  let (products, sales) = split(two_years_to_may(2));
  load::load(&store, products.clone(), sales.clone(), 50).await.unwrap();

  let err = load::load(&store, products, sales, 50).await.unwrap_err();
  assert!(matches!(err, Error::CatalogNotEmpty(4)));
}

#[tokio::test]
async fn sale_for_unknown_product_aborts_before_writing() {
  let store = SqliteStore::open_in_memory().await.unwrap();
  let (products, mut sales) = split(two_years_to_may(3));
  sales.push(SalesObservation {
    product_id:    9,
    date:          date(2024, 5, 31),
    quantity_sold: 1,
    total_amount:  None,
  });

  let err = load::load(&store, products, sales, 50).await.unwrap_err();
  assert!(matches!(err, Error::UnknownProduct { product_id: 9, .. }));
  assert!(store.list_products().await.unwrap().is_empty());
}

#[tokio::test]
async fn failed_load_can_be_retried() {
  let store = SqliteStore::open_in_memory().await.unwrap();
  let (products, sales) = split(two_years_to_may(4));

  let mut clashing = products.clone();
  clashing[1].sku = clashing[0].sku.clone();
  let err = load::load(&store, clashing, sales.clone(), 50).await.unwrap_err();
  assert!(matches!(err, Error::Store(_)));
  assert!(store.list_products().await.unwrap().is_empty());
  assert!(store.list_stock_levels().await.unwrap().is_empty());
  assert!(store.daily_sales(1).await.unwrap().is_empty());

  let summary = load::load(&store, products, sales, 50).await.unwrap();
  assert_eq!(summary.products, 4);
}

// ── End to end ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn simulate_load_train_and_reconcile() {
  let store = SqliteStore::open_in_memory().await.unwrap();
  let (products, sales) = split(two_years_to_may(42));
  load::load(&store, products, sales, 50).await.unwrap();

  let today = date(2024, 6, 1);
  let settings = Settings::default();
  let report = Trainer::new(settings.trainer.clone())
    .unwrap()
    .train_all(&store, today)
    .await
    .unwrap();
  assert_eq!(report.trained(), 4);
  assert_eq!(report.failed(), 0);

  let forecast = store.live_forecast(3).await.unwrap().unwrap();
  assert_eq!(forecast.first_date(), Some(today));
  assert_eq!(forecast.last_date(), Some(date(2024, 7, 31)));

  let reconciliation = Reconciler::new(settings.policy).status(&store, today).await.unwrap();
  assert_eq!(reconciliation.statuses.len(), 4);

  // Roughly 50 batteries a day over an 8-day window cannot be met by 50 units.
  let batteries = &reconciliation.statuses[2];
  assert_eq!(batteries.name, "AA Batteries");
  assert_eq!(batteries.recommendation, Recommendation::LowStock);
  assert_eq!(
    batteries.reorder_quantity,
    batteries.predicted_demand - batteries.current_stock + settings.policy.safety_buffer
  );

  let resp = app(Arc::new(store), &settings)
    .oneshot(
      Request::builder()
        .uri("/inventory/status?as_of=2024-06-01")
        .body(Body::empty())
        .unwrap(),
    )
    .await
    .unwrap();
  assert_eq!(resp.status(), StatusCode::OK);

  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let served: Vec<stockcast_core::reconcile::ReorderStatus> =
    serde_json::from_slice(&bytes).unwrap();
  assert_eq!(served, reconciliation.statuses);
}
