pub mod cli;
pub mod core;
pub mod poller;
pub mod providers;
pub mod store;

pub use crate::core::config;

use crate::core::config::AppConfig;
use crate::core::{ByteStore, ChartRange, ImageFetcher, QuoteFetcher};
use crate::providers::{RemoteImageFetcher, YahooFinanceProvider};
use crate::store::{FsByteStore, LogoCache, QuoteStore, Services};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info};

pub enum AppCommand {
    Watch { once: bool },
    Logos,
    ClearCache,
    Chart { symbol: String, range: ChartRange },
    Search { query: String },
}

/// Builds the HTTP-backed fetcher and logo cache described by `config`.
pub fn services_from_config(config: &AppConfig) -> Result<Services> {
    let fetcher = YahooFinanceProvider::new(config.yahoo_base_url())?;
    let images = RemoteImageFetcher::new(config.logos.timeout(), config.logos.min_bytes)?;
    let cache_dir = config.logos.cache_path()?;
    debug!(cache_dir = %cache_dir.display(), "Using logo cache directory");

    Ok(Services {
        fetcher: Arc::new(fetcher) as Arc<dyn QuoteFetcher>,
        logos: LogoCache::new(
            cache_dir,
            Arc::new(images) as Arc<dyn ImageFetcher>,
            Arc::new(FsByteStore::new()) as Arc<dyn ByteStore>,
        ),
    })
}

/// Store whose services are created from `config` on first use.
pub fn build_store(config: &AppConfig) -> QuoteStore {
    let config = config.clone();
    QuoteStore::new(move || services_from_config(&config))
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Stockbar starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let store = Arc::new(build_store(&config));
    store.init().context("Failed to initialize quote store")?;

    let result = match command {
        AppCommand::Watch { once } => cli::watch::run(Arc::clone(&store), &config, once).await,
        AppCommand::Logos => cli::logos::run(&store, &config).await,
        AppCommand::ClearCache => cli::logos::clear(&store).await,
        AppCommand::Chart { symbol, range } => cli::chart::run_chart(&store, &symbol, range).await,
        AppCommand::Search { query } => cli::chart::run_search(&store, &query).await,
    };

    store.destroy();
    result
}
