mod app;
mod cache;
mod commands;
mod config;
mod content;
mod event;
mod query;
mod render;
mod storefront;

use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cache::{CacheStorage, MemoryStorage, NoopStorage, SqliteStorage};
use crate::config::{CacheBackend, Config, LogConfig};
use crate::content::{ContentApi, GeminiClient};
use crate::storefront::types::{Category, Region};
use crate::storefront::Storefront;

#[derive(Parser, Debug)]
#[command(name = "silversage")]
#[command(about = "A curated storefront for aging-in-place products")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/silversage/config.yaml)
  #[arg(short, long, global = true)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
  #[command(flatten)]
  Store(StoreCmd),
  /// Drop every cached response
  ClearCache,
}

/// Commands that talk to the content API
#[derive(Subcommand, Debug)]
enum StoreCmd {
  /// Search curated products
  Search {
    /// What to look for; empty shows the aisle's best
    #[arg(default_value = "")]
    query: String,
    #[arg(long)]
    category: Option<Category>,
    #[arg(short, long)]
    region: Option<Region>,
  },
  /// Compare places to buy a product
  Prices {
    product: String,
    #[arg(short, long)]
    region: Option<Region>,
  },
  /// Market and care trends
  Insights {
    #[arg(short, long)]
    region: Option<Region>,
  },
  /// Support services near a location
  Resources {
    location: String,
    #[arg(short, long)]
    region: Option<Region>,
  },
  /// Interactive session
  Browse {
    #[arg(short, long)]
    region: Option<Region>,
  },
}

/// Install the global subscriber. Logs go to `log.file` when set, stderr
/// otherwise; the returned guard flushes the file writer on drop.
fn init_tracing(log: &LogConfig) -> Result<Option<WorkerGuard>> {
  let env_filter =
    EnvFilter::try_from_default_env().unwrap_or_else(|_| "silversage=info".into());

  match &log.file {
    Some(path) => {
      let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| std::path::Path::new("."));
      let file_name = path
        .file_name()
        .ok_or_else(|| eyre!("Invalid log file path: {}", path.display()))?;
      std::fs::create_dir_all(dir)
        .map_err(|e| eyre!("Failed to create log directory {}: {}", dir.display(), e))?;

      let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));
      tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .init();
      Ok(Some(guard))
    }
    None => {
      tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
      Ok(None)
    }
  }
}

fn open_storage(config: &Config) -> Result<Arc<dyn CacheStorage>> {
  let storage: Arc<dyn CacheStorage> = match config.cache.backend {
    CacheBackend::Memory => Arc::new(MemoryStorage::new(config.cache.max_bytes)),
    CacheBackend::Sqlite => match &config.cache.path {
      Some(path) => Arc::new(SqliteStorage::open_at(path)?),
      None => Arc::new(SqliteStorage::open()?),
    },
    CacheBackend::None => Arc::new(NoopStorage),
  };
  Ok(storage)
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration
  let config = Config::load(args.config.as_deref())?;
  let _log_guard = init_tracing(&config.log)?;
  let storage = open_storage(&config)?;

  let command = match args.command {
    Cmd::Store(command) => command,
    Cmd::ClearCache => {
      storage.clear()?;
      println!("Cache cleared.");
      return Ok(());
    }
  };

  let api: Arc<dyn ContentApi> = Arc::new(
    GeminiClient::new(&config.content).map_err(|e| eyre!("Failed to create content client: {}", e))?,
  );
  let storefront = Arc::new(Storefront::new(&config, api, storage));
  let default_region = config.default_region;

  match command {
    StoreCmd::Search {
      query,
      category,
      region,
    } => {
      let region = region.unwrap_or(default_region);
      println!("{}", render::header(region, category));
      let products = storefront.search_products(&query, region, category).await;
      print!("{}", render::products(&products));
    }
    StoreCmd::Prices { product, region } => {
      let options = storefront
        .buying_options(&product, region.unwrap_or(default_region))
        .await;
      print!("{}", render::buying_options(&options));
    }
    StoreCmd::Insights { region } => {
      let insights = storefront.insights(region.unwrap_or(default_region)).await;
      print!("{}", render::insights(&insights));
    }
    StoreCmd::Resources { location, region } => {
      let resources = storefront
        .local_resources(&location, region.unwrap_or(default_region))
        .await;
      print!("{}", render::local_resources(&resources));
    }
    StoreCmd::Browse { region } => {
      let mut app = app::App::new(storefront, region.unwrap_or(default_region));
      app.run().await?;
    }
  }

  Ok(())
}
