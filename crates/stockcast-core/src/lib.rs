//! Core types, forecasting model and reorder policy for Stockcast.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! trainer and reconciler talk to storage only through
//! [`store::InventoryStore`]; the backends live in their own crates.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod forecast;
mod linalg;
pub mod model;
pub mod product;
pub mod reconcile;
pub mod sales;
pub mod stock;
pub mod store;
pub mod trainer;

pub use error::{Error, Result};

/// Catalog identity of a product. Assigned by the catalog load, never by the
/// core.
pub type ProductId = i64;
