//! Error types for the loading and simulation commands.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("failed to read {path:?}: {source}")]
  Csv {
    path:   PathBuf,
    #[source]
    source: csv::Error,
  },

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("configuration error: {0}")]
  Config(#[from] config::ConfigError),

  #[error(transparent)]
  Core(#[from] stockcast_core::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("the store already holds a catalog of {0} products; load into a fresh store")]
  CatalogNotEmpty(usize),

  #[error("sale on {date} references product {product_id}, which is not in the catalog")]
  UnknownProduct { product_id: i64, date: chrono::NaiveDate },
}

impl Error {
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }

  pub(crate) fn csv(path: impl Into<PathBuf>) -> impl FnOnce(csv::Error) -> Self {
    let path = path.into();
    move |source| Self::Csv { path, source }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
