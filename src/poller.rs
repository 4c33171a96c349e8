//! Periodic refresh that pushes fetched quotes into the shared store.

use crate::store::QuoteStore;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RefreshReport {
    pub updated: Vec<String>,
    pub failed: Vec<String>,
}

/// Fetches every symbol once and stores the successes under the symbol as requested,
/// so views can look quotes up by their watchlist entry. Failures leave the last
/// known quote in place.
pub async fn refresh(store: &QuoteStore, symbols: &[String]) -> RefreshReport {
    let mut seen = HashSet::new();
    let symbols: Vec<String> = symbols
        .iter()
        .filter(|s| seen.insert(s.as_str()))
        .cloned()
        .collect();

    let mut report = RefreshReport::default();
    if symbols.is_empty() {
        return report;
    }
    let Some(fetcher) = store.fetcher() else {
        debug!("Store not available, skipping refresh");
        return report;
    };

    for (symbol, result) in fetcher.fetch_many(&symbols).await {
        match result {
            Ok(quote) => {
                if quote.symbol != symbol {
                    debug!(symbol = %symbol, canonical = %quote.symbol, "Provider renamed symbol");
                }
                store.set_quote(&symbol, quote);
                report.updated.push(symbol);
            }
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "Quote refresh failed");
                report.failed.push(symbol);
            }
        }
    }
    debug!(
        updated = report.updated.len(),
        failed = report.failed.len(),
        "Refresh complete"
    );
    report
}

/// Refreshes immediately and then every `interval` until the handle is aborted.
pub fn spawn_poller(
    store: Arc<QuoteStore>,
    symbols: Vec<String>,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if store.is_destroyed() {
                debug!("Store destroyed, stopping poller");
                break;
            }
            refresh(&store, &symbols).await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{
        ByteStore, ChartData, ChartRange, FetchOutcome, ImageFetcher, Quote, QuoteFetcher,
        SearchResult,
    };
    use crate::store::{FsByteStore, Listener, LogoCache, Services};
    use anyhow::{Result, anyhow};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct ScriptedFetcher {
        requested: Mutex<Vec<Vec<String>>>,
    }

    #[async_trait]
    impl QuoteFetcher for ScriptedFetcher {
        async fn fetch_quote(&self, symbol: &str) -> Result<Quote> {
            if symbol == "FAIL" {
                return Err(anyhow!("no data"));
            }
            // Upstream answers with its canonical spelling.
            Ok(Quote {
                symbol: symbol.to_uppercase(),
                display_symbol: symbol.to_string(),
                name: symbol.to_string(),
                price: 10.0,
                previous_close: 9.0,
                change: 1.0,
                change_percent: 11.1,
                currency: "USD".to_string(),
                exchange: "NMS".to_string(),
                market_state: None,
                is_crypto: false,
                timestamp: Utc::now(),
            })
        }

        async fn fetch_many(&self, symbols: &[String]) -> Vec<(String, Result<Quote>)> {
            self.requested.lock().unwrap().push(symbols.to_vec());
            let mut results = Vec::new();
            for symbol in symbols {
                results.push((symbol.clone(), self.fetch_quote(symbol).await));
            }
            results
        }

        async fn fetch_chart(&self, _symbol: &str, _range: ChartRange) -> Result<ChartData> {
            Err(anyhow!("unused"))
        }

        async fn search(&self, _query: &str) -> Result<Vec<SearchResult>> {
            Ok(Vec::new())
        }
    }

    struct NoImages;

    #[async_trait]
    impl ImageFetcher for NoImages {
        async fn get(&self, _url: &str) -> FetchOutcome {
            FetchOutcome::Failed(anyhow!("unused"))
        }
    }

    fn store_with(fetcher: Arc<ScriptedFetcher>) -> Arc<QuoteStore> {
        Arc::new(QuoteStore::new(move || -> Result<Services> {
            Ok(Services {
                fetcher: Arc::clone(&fetcher) as Arc<dyn QuoteFetcher>,
                logos: LogoCache::new(
                    "/nonexistent/stockbar-logos",
                    Arc::new(NoImages) as Arc<dyn ImageFetcher>,
                    Arc::new(FsByteStore::new()) as Arc<dyn ByteStore>,
                ),
            })
        }))
    }

    fn symbols(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_refresh_updates_store_and_reports_failures() {
        let fetcher = Arc::new(ScriptedFetcher::default());
        let store = store_with(Arc::clone(&fetcher));
        let hits = Arc::new(AtomicUsize::new(0));
        store.add_listener(&Listener::new({
            let hits = Arc::clone(&hits);
            move || {
                hits.fetch_add(1, Ordering::SeqCst);
            }
        }));

        let report = refresh(&store, &symbols(&["AAPL", "FAIL", "AAPL", "MSFT"])).await;

        assert_eq!(report.updated, symbols(&["AAPL", "MSFT"]));
        assert_eq!(report.failed, symbols(&["FAIL"]));
        assert_eq!(
            *fetcher.requested.lock().unwrap(),
            vec![symbols(&["AAPL", "FAIL", "MSFT"])]
        );
        assert!(store.get_quote("AAPL").is_some());
        assert!(store.get_quote("FAIL").is_none());
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_refresh_keys_quotes_by_requested_symbol() {
        let fetcher = Arc::new(ScriptedFetcher::default());
        let store = store_with(Arc::clone(&fetcher));

        let report = refresh(&store, &symbols(&["aapl"])).await;

        assert_eq!(report.updated, symbols(&["aapl"]));
        let quote = store.get_quote("aapl").expect("stored under watchlist entry");
        assert_eq!(quote.symbol, "AAPL");
        assert!(store.get_quote("AAPL").is_none());
    }

    #[tokio::test]
    async fn test_refresh_after_destroy_is_noop() {
        let fetcher = Arc::new(ScriptedFetcher::default());
        let store = store_with(Arc::clone(&fetcher));
        store.destroy();

        let report = refresh(&store, &symbols(&["AAPL"])).await;
        assert_eq!(report, RefreshReport::default());
        assert!(fetcher.requested.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_poller_refreshes_on_interval() {
        let fetcher = Arc::new(ScriptedFetcher::default());
        let store = store_with(Arc::clone(&fetcher));

        let handle = spawn_poller(
            Arc::clone(&store),
            symbols(&["AAPL"]),
            Duration::from_secs(60),
        );
        tokio::time::sleep(Duration::from_secs(125)).await;
        handle.abort();

        assert_eq!(fetcher.requested.lock().unwrap().len(), 3);
        assert!(store.get_quote("AAPL").is_some());
    }
}
