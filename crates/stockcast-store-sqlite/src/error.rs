//! Error type for `stockcast-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("decimal parse error: {0}")]
  Decimal(#[from] rust_decimal::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored or supplied quantity does not fit the domain type.
  #[error("quantity out of range: {0}")]
  OutOfRange(i64),

  #[error("product not found: {0}")]
  ProductNotFound(i64),

  #[error("product {0} already exists")]
  DuplicateProduct(i64),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
