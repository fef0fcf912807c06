//! SQL schema for the Stockcast SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS products (
    product_id  INTEGER PRIMARY KEY,
    sku         TEXT NOT NULL UNIQUE,
    name        TEXT NOT NULL,
    category    TEXT,
    unit_price  TEXT               -- decimal string, e.g. '120.00'
);

-- Sales are strictly append-only.
CREATE TABLE IF NOT EXISTS sales_transactions (
    transaction_id   INTEGER PRIMARY KEY AUTOINCREMENT,
    product_id       INTEGER NOT NULL REFERENCES products(product_id),
    transaction_date TEXT    NOT NULL,   -- YYYY-MM-DD
    quantity_sold    INTEGER NOT NULL CHECK (quantity_sold >= 0),
    total_amount     TEXT                -- decimal string, NULL when unpriced
);

CREATE TABLE IF NOT EXISTS current_inventory (
    product_id   INTEGER PRIMARY KEY REFERENCES products(product_id),
    stock_level  INTEGER NOT NULL CHECK (stock_level >= 0),
    last_updated TEXT    NOT NULL      -- ISO 8601 UTC
);

-- Only ever written by replacing a product's whole set in one transaction.
CREATE TABLE IF NOT EXISTS demand_forecasts (
    forecast_id               INTEGER PRIMARY KEY AUTOINCREMENT,
    product_id                INTEGER NOT NULL REFERENCES products(product_id),
    run_id                    TEXT    NOT NULL,
    forecast_date             TEXT    NOT NULL,   -- YYYY-MM-DD
    predicted_demand          INTEGER NOT NULL CHECK (predicted_demand >= 0),
    confidence_interval_lower INTEGER NOT NULL,
    confidence_interval_upper INTEGER NOT NULL,
    created_at                TEXT    NOT NULL,
    UNIQUE (product_id, forecast_date),
    CHECK  (confidence_interval_lower <= confidence_interval_upper)
);

CREATE INDEX IF NOT EXISTS sales_product_date_idx ON sales_transactions(product_id, transaction_date);
CREATE INDEX IF NOT EXISTS forecasts_date_idx     ON demand_forecasts(forecast_date);

PRAGMA user_version = 1;
";
