//! Runtime wiring for Stockcast: configuration, the HTTP application, and
//! the `load` and `simulate` data commands used by the `stockcast` binary.

pub mod dataset;
pub mod error;
pub mod load;
pub mod simulate;

pub use error::{Error, Result};

use std::{path::PathBuf, sync::Arc};

use axum::Router;
use serde::{Deserialize, Serialize};
use stockcast_core::{
  reconcile::ReorderPolicy,
  store::InventoryStore,
  trainer::TrainerConfig,
};
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Prefix for environment overrides, e.g. `STOCKCAST_PORT=9000` or
/// `STOCKCAST_POLICY__SAFETY_BUFFER=25`.
pub const ENV_PREFIX: &str = "STOCKCAST";

/// Runtime configuration, deserialised from `stockcast.toml` and the
/// environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
  pub policy:     ReorderPolicy,
  pub trainer:    TrainerConfig,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      host:       "127.0.0.1".to_string(),
      port:       8000,
      store_path: PathBuf::from("stockcast.db"),
      policy:     ReorderPolicy::default(),
      trainer:    TrainerConfig::default(),
    }
  }
}

impl Settings {
  /// Layer the (optional) TOML file at `path` and `STOCKCAST_*` environment
  /// variables over the defaults.
  pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
    let settings: Self = config::Config::builder()
      .add_source(config::File::from(path.into()).required(false))
      .add_source(
        config::Environment::with_prefix(ENV_PREFIX)
          .prefix_separator("_")
          .separator("__")
          .try_parsing(true),
      )
      .build()?
      .try_deserialize()?;

    settings.trainer.validate()?;
    Ok(settings)
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

// ─── Application ──────────────────────────────────────────────────────────────

/// The full HTTP application: the JSON API with request tracing.
pub fn app<S>(store: Arc<S>, settings: &Settings) -> Router
where
  S: InventoryStore + 'static,
{
  stockcast_api::api_router(store, settings.policy).layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests;
