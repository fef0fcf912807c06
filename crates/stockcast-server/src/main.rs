//! The `stockcast` binary.
//!
//! Reads `stockcast.toml` (or the path given with `--config`), opens the
//! SQLite store, and runs one of the subcommands below. A typical first run:
//!
//! ```text
//! stockcast simulate --out-dir data
//! stockcast load --products data/products.csv --sales data/sales_transactions.csv
//! stockcast train
//! stockcast serve
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use chrono::{Days, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use stockcast_core::{reconcile::Reconciler, trainer::Trainer};
use stockcast_server::{
  Settings,
  dataset::{PRODUCTS_FILE, SALES_FILE},
  load::{self, DEFAULT_INITIAL_STOCK},
  simulate::{self, DEFAULT_DAYS, SimulationConfig},
};
use stockcast_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Stockcast demand forecasting and reorder service")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "stockcast.toml", global = true)]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the JSON API over HTTP.
  Serve,

  /// Retrain the forecast of every catalog product.
  Train {
    /// Forecast from this date instead of today (UTC).
    #[arg(long)]
    today: Option<NaiveDate>,
  },

  /// Print the reorder status of every stocked product as JSON.
  Status {
    /// First day of the lookahead window; defaults to today (UTC).
    #[arg(long)]
    today: Option<NaiveDate>,
  },

  /// Import a catalog and sales history from CSV into an empty store.
  Load {
    #[arg(long, default_value = PRODUCTS_FILE)]
    products:      PathBuf,
    #[arg(long, default_value = SALES_FILE)]
    sales:         PathBuf,
    /// Stock level every loaded product starts with.
    #[arg(long, default_value_t = DEFAULT_INITIAL_STOCK)]
    initial_stock: u64,
  },

  /// Write a synthetic four-product dataset as CSV.
  Simulate {
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
    /// Days of history, ending yesterday.
    #[arg(long, default_value_t = DEFAULT_DAYS)]
    days:    u32,
    /// Seed for reproducible output.
    #[arg(long)]
    seed:    Option<u64>,
  },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = Settings::load(&cli.config)
    .with_context(|| format!("failed to load configuration from {:?}", cli.config))?;

  match cli.command {
    Command::Simulate { out_dir, days, seed } => {
      let end_date = today()
        .checked_sub_days(Days::new(1))
        .context("cannot compute yesterday's date")?;
      let simulation = simulate::simulate(&SimulationConfig { days, end_date, seed })?;
      simulate::write(&simulation, &out_dir)
        .with_context(|| format!("failed to write dataset to {out_dir:?}"))?;
    }
    Command::Load { products, sales, initial_stock } => {
      let store = open_store(&settings).await?;
      let summary = load::load_files(&store, &products, &sales, initial_stock)
        .await
        .context("failed to load dataset")?;
      println!("{}", serde_json::to_string_pretty(&summary)?);
    }
    Command::Train { today: as_of } => {
      let store = open_store(&settings).await?;
      let trainer = Trainer::new(settings.trainer.clone())?;
      let report = trainer
        .train_all(&store, as_of.unwrap_or_else(today))
        .await
        .context("training batch aborted")?;

      tracing::info!(
        trained = report.trained(),
        skipped = report.skipped(),
        failed = report.failed(),
        "training batch finished"
      );
      if report.failed() > 0 {
        anyhow::bail!("{} of {} products failed to train", report.failed(), report.results.len());
      }
    }
    Command::Status { today: as_of } => {
      let store = open_store(&settings).await?;
      let reconciliation = Reconciler::new(settings.policy)
        .status(&store, as_of.unwrap_or_else(today))
        .await
        .context("failed to reconcile inventory")?;
      println!("{}", serde_json::to_string_pretty(&reconciliation.statuses)?);
    }
    Command::Serve => {
      let store = open_store(&settings).await?;
      let app = stockcast_server::app(Arc::new(store), &settings);
      let address = settings.address();

      tracing::info!("Listening on http://{address}");
      let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;

      axum::serve(listener, app).await.context("server error")?;
    }
  }

  Ok(())
}

fn today() -> NaiveDate { Utc::now().date_naive() }

async fn open_store(settings: &Settings) -> anyhow::Result<SqliteStore> {
  // Expand `~` in store path.
  let store_path = expand_tilde(&settings.store_path);
  SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
