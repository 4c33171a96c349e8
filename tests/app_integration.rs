use std::fs;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use stockbar::core::{ByteStore, ImageFetcher, LogoOrigin, LogoRequest, QuoteFetcher};
use stockbar::poller::refresh;
use stockbar::providers::{RemoteImageFetcher, YahooFinanceProvider};
use stockbar::store::{FsByteStore, Listener, LogoCache, QuoteStore, Services};
use stockbar::{AppCommand, run_command};
use tempfile::TempDir;
use tracing::info;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod test_utils {
    use super::*;

    pub fn chart_body(symbol: &str, price: f64, previous_close: f64) -> String {
        format!(
            r#"{{"chart": {{"result": [{{"meta": {{
                "symbol": "{symbol}",
                "regularMarketPrice": {price},
                "chartPreviousClose": {previous_close},
                "currency": "USD",
                "exchangeName": "NMS",
                "shortName": "{symbol} Corp"
            }}}}]}}}}"#
        )
    }

    pub async fn mount_quote(server: &MockServer, symbol: &str, price: f64, previous_close: f64) {
        Mock::given(method("GET"))
            .and(path(format!("/v8/finance/chart/{symbol}")))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(chart_body(symbol, price, previous_close)),
            )
            .mount(server)
            .await;
    }

    pub fn write_config(dir: &TempDir, base_url: &str, watchlist: &[&str]) -> String {
        let cache_dir = dir.path().join("logos");
        let symbols: String = watchlist.iter().map(|s| format!("  - \"{s}\"\n")).collect();
        let config = format!(
            "watchlist:\n{symbols}refresh_interval_secs: 30\nproviders:\n  yahoo:\n    base_url: \"{base_url}\"\nlogos:\n  cache_dir: \"{}\"\n",
            cache_dir.display()
        );
        let config_path = dir.path().join("config.yaml");
        fs::write(&config_path, config).unwrap();
        config_path.to_string_lossy().into_owned()
    }

    pub fn png_of(len: usize) -> Vec<u8> {
        vec![0x89; len]
    }

    pub fn services(base_url: &str, cache_dir: &std::path::Path) -> Services {
        Services {
            fetcher: Arc::new(YahooFinanceProvider::new(base_url).unwrap()) as Arc<dyn QuoteFetcher>,
            logos: LogoCache::new(
                cache_dir,
                Arc::new(RemoteImageFetcher::new(Duration::from_secs(2), 500).unwrap())
                    as Arc<dyn ImageFetcher>,
                Arc::new(FsByteStore::new()) as Arc<dyn ByteStore>,
            ),
        }
    }
}

#[test_log::test(tokio::test)]
async fn test_watch_once_against_mock_server() {
    let server = MockServer::start().await;
    test_utils::mount_quote(&server, "AAPL", 150.0, 120.0).await;
    test_utils::mount_quote(&server, "MSFT", 400.0, 410.0).await;

    let temp_dir = TempDir::new().unwrap();
    let config_path = test_utils::write_config(&temp_dir, &server.uri(), &["AAPL", "MSFT", "NOPE"]);

    let result = run_command(AppCommand::Watch { once: true }, Some(&config_path)).await;
    assert!(result.is_ok(), "watch --once failed: {result:?}");
}

#[test_log::test(tokio::test)]
async fn test_missing_config_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("absent.yaml");
    let result = run_command(AppCommand::Watch { once: true }, missing.to_str()).await;
    let err = result.unwrap_err();
    assert!(format!("{err:#}").contains("Failed to read config file"));
}

#[test_log::test(tokio::test)]
async fn test_clear_cache_removes_logo_files() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = test_utils::write_config(&temp_dir, "http://127.0.0.1:9", &["AAPL"]);
    let cache_dir = temp_dir.path().join("logos");
    fs::create_dir_all(&cache_dir).unwrap();
    fs::write(cache_dir.join("AAPL.png"), test_utils::png_of(600)).unwrap();
    fs::write(cache_dir.join("BTC_USD.png"), test_utils::png_of(600)).unwrap();

    run_command(AppCommand::ClearCache, Some(&config_path))
        .await
        .unwrap();

    assert_eq!(fs::read_dir(&cache_dir).unwrap().count(), 0);
}

#[test_log::test(tokio::test)]
async fn test_search_and_chart_commands() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/finance/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"quotes": [{"symbol": "AAPL", "shortname": "Apple Inc.", "exchange": "NMS", "quoteType": "EQUITY"}]}"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v8/finance/chart/AAPL"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"chart": {"result": [{
                "meta": {"symbol": "AAPL", "currency": "USD", "regularMarketPrice": 3.0},
                "timestamp": [1700000000, 1700086400],
                "indicators": {"quote": [{"close": [1.0, 3.0]}]}
            }]}}"#,
        ))
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let config_path = test_utils::write_config(&temp_dir, &server.uri(), &["AAPL"]);

    run_command(
        AppCommand::Search {
            query: "apple".to_string(),
        },
        Some(&config_path),
    )
    .await
    .unwrap();
    run_command(
        AppCommand::Chart {
            symbol: "AAPL".to_string(),
            range: "1m".parse().unwrap(),
        },
        Some(&config_path),
    )
    .await
    .unwrap();
}

#[test_log::test(tokio::test)]
async fn test_store_refresh_notifies_listeners() {
    let server = MockServer::start().await;
    test_utils::mount_quote(&server, "AAPL", 150.0, 120.0).await;
    let temp_dir = TempDir::new().unwrap();

    let base_url = server.uri();
    let cache_dir = temp_dir.path().to_path_buf();
    let store = QuoteStore::new(move || -> anyhow::Result<Services> {
        Ok(test_utils::services(&base_url, &cache_dir))
    });
    store.init().unwrap();

    let notified = Arc::new(AtomicUsize::new(0));
    let listener = Listener::new({
        let notified = Arc::clone(&notified);
        move || {
            notified.fetch_add(1, Ordering::SeqCst);
        }
    });
    assert!(store.add_listener(&listener));

    let report = refresh(&store, &["AAPL".to_string(), "NOPE".to_string()]).await;
    info!(?report, "Refresh finished");

    assert_eq!(report.updated, vec!["AAPL".to_string()]);
    assert_eq!(report.failed, vec!["NOPE".to_string()]);
    assert_eq!(notified.load(Ordering::SeqCst), 1);
    let quote = store.get_quote("AAPL").unwrap();
    assert!((quote.change_percent - 25.0).abs() < 1e-9);
    assert!(store.get_quote("NOPE").is_none());

    store.destroy();
    assert!(store.get_quote("AAPL").is_none());
    assert_eq!(store.listener_count(), 0);
}

#[test_log::test(tokio::test)]
async fn test_lowercase_watchlist_entry_is_found_after_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v8/finance/chart/aapl"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(test_utils::chart_body("AAPL", 150.0, 120.0)),
        )
        .mount(&server)
        .await;
    let temp_dir = TempDir::new().unwrap();

    let base_url = server.uri();
    let cache_dir = temp_dir.path().to_path_buf();
    let store = QuoteStore::new(move || -> anyhow::Result<Services> {
        Ok(test_utils::services(&base_url, &cache_dir))
    });

    let report = refresh(&store, &["aapl".to_string()]).await;

    assert_eq!(report.updated, vec!["aapl".to_string()]);
    assert!(report.failed.is_empty());
    let quote = store.get_quote("aapl").expect("quote under the watchlist spelling");
    assert_eq!(quote.symbol, "AAPL");
}

#[test_log::test(tokio::test)]
async fn test_logo_cache_falls_back_and_persists() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tiny.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(test_utils::png_of(100)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/real.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(test_utils::png_of(2048)))
        .expect(1)
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let logos = test_utils::services(&server.uri(), temp_dir.path()).logos;
    let request = LogoRequest::Direct {
        sources: vec![
            format!("{}/missing.png", server.uri()),
            format!("{}/tiny.png", server.uri()),
            format!("{}/real.png", server.uri()),
        ],
    };

    let (first, second) = tokio::join!(
        logos.load_logo("BRK.B", &request),
        logos.load_logo("BRK.B", &request)
    );
    let handle = first.unwrap();
    assert_eq!(second.as_ref(), Some(&handle));
    assert_eq!(handle.path, temp_dir.path().join("BRK_B.png"));
    assert_eq!(
        handle.origin,
        LogoOrigin::Downloaded {
            url: format!("{}/real.png", server.uri())
        }
    );
    assert_eq!(fs::read(&handle.path).unwrap().len(), 2048);

    // A fresh cache over the same directory is served from disk.
    let reopened = test_utils::services(&server.uri(), temp_dir.path()).logos;
    let from_disk = reopened.load_logo("BRK.B", &request).await.unwrap();
    assert_eq!(from_disk.origin, LogoOrigin::DiskCache);

    assert_eq!(reopened.clear_cache().await.unwrap(), 1);
    assert!(!handle.path.exists());
}

#[test_log::test(tokio::test)]
async fn test_logo_cache_exhausted_sources() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();
    let logos = test_utils::services(&server.uri(), temp_dir.path()).logos;

    let request = LogoRequest::Direct {
        sources: vec![format!("{}/nothing.png", server.uri())],
    };
    assert!(logos.load_logo("ZZZ", &request).await.is_none());
    assert!(logos.cached("ZZZ").is_none());
    assert!(!logos.is_pending("ZZZ"));
    assert!(logos.load_logo("ZZZ", &LogoRequest::Absent).await.is_none());
}
