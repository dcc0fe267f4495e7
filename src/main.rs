mod api;
mod app;
mod cache;
mod commands;
mod config;
mod event;
mod listing;
mod query;
mod store;
mod theme;
mod ui;

use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::cache::{CacheStorage, NoopStorage, SqliteStorage};
use crate::store::TodoStore;

#[derive(Parser, Debug)]
#[command(name = "t9s")]
#[command(about = "A terminal UI for todo boards, inspired by k9s")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/t9s/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Base URL of the todo API
  #[arg(long)]
  base_url: Option<String>,

  /// Run without the local cache (every session loads from the remote API)
  #[arg(long)]
  no_cache: bool,
}

/// Set up file logging. The TUI owns the terminal, so logs go to a file
/// in the data directory; the returned guard flushes on drop.
fn init_logging() -> Option<tracing_appender::non_blocking::WorkerGuard> {
  let log_dir = dirs::data_dir()?.join("t9s");
  std::fs::create_dir_all(&log_dir).ok()?;

  let appender = tracing_appender::rolling::never(log_dir, "t9s.log");
  let (writer, guard) = tracing_appender::non_blocking(appender);

  let filter = EnvFilter::try_from_env("T9S_LOG").unwrap_or_else(|_| EnvFilter::new("info"));

  tracing_subscriber::registry()
    .with(filter)
    .with(
      tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false),
    )
    .init();

  Some(guard)
}

/// Open the cache, falling back to the no-op backend when it's disabled
/// or can't be opened. Callers never see cache setup failures.
fn open_storage(config: &config::Config, no_cache: bool) -> Arc<dyn CacheStorage> {
  if no_cache || !config.cache.enabled {
    return Arc::new(NoopStorage);
  }

  let result = match &config.cache.path {
    Some(path) => SqliteStorage::open_at(path),
    None => SqliteStorage::open(),
  };

  match result {
    Ok(storage) => Arc::new(storage),
    Err(e) => {
      warn!("Running without cache: {}", e);
      Arc::new(NoopStorage)
    }
  }
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();
  let _log_guard = init_logging();

  let mut config = config::Config::load(args.config.as_deref())?;
  if let Some(base_url) = args.base_url {
    config.api.base_url = base_url;
  }

  let api = Arc::new(api::ApiClient::new(&config)?);
  let storage = open_storage(&config, args.no_cache);
  let store = TodoStore::new(api, storage);

  // Last session's persisted choice wins over the config default
  let mode = theme::load_persisted()
    .or(config.theme)
    .unwrap_or_default();

  let mut app = app::App::new(config, store, mode);
  app.run().await?;

  Ok(())
}
