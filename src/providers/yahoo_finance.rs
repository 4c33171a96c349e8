use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reqwest::Url;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::core::quote::crypto_display;
use crate::core::{ChartData, ChartRange, PricePoint, Quote, QuoteFetcher, SearchResult};
use crate::providers::util::{BROWSER_USER_AGENT, with_retry};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const SEARCH_RESULTS: &str = "10";

// YahooFinanceProvider implementation for QuoteFetcher
pub struct YahooFinanceProvider {
    base_url: String,
    client: reqwest::Client,
}

impl YahooFinanceProvider {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build quote HTTP client")?;
        Ok(YahooFinanceProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .with_context(|| format!("Invalid base URL: {}", self.base_url))?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("Base URL cannot hold a path: {}", self.base_url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn chart_url(&self, symbol: &str, range: &str, interval: &str) -> Result<Url> {
        let mut url = self.endpoint(&["v8", "finance", "chart", symbol])?;
        url.query_pairs_mut()
            .append_pair("interval", interval)
            .append_pair("range", range);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, what: &str) -> Result<T> {
        debug!("Requesting {} from {}", what, url);
        let response = with_retry(|| self.client.get(url.clone()).send(), 2, 300)
            .await
            .map_err(|e| anyhow!("Request error: {} for {} URL: {}", e, what, url))?;

        if !response.status().is_success() {
            return Err(anyhow!("HTTP error: {} for {}", response.status(), what));
        }

        let text = response.text().await?;
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(anyhow!("Empty response for {}", what));
        }
        if !trimmed.starts_with('{') {
            return Err(anyhow!("Invalid response format for {}", what));
        }
        serde_json::from_str(trimmed)
            .map_err(|e| anyhow!("Failed to parse JSON response for {}: {}", what, e))
    }

    async fn chart_item(&self, symbol: &str, range: &str, interval: &str) -> Result<ChartItem> {
        let url = self.chart_url(symbol, range, interval)?;
        let data: YahooChartResponse = self.get_json(url, symbol).await?;
        data.chart
            .result
            .and_then(|items| items.into_iter().next())
            .ok_or_else(|| anyhow!("No data available for symbol: {}", symbol))
    }
}

#[derive(Deserialize, Debug)]
struct YahooChartResponse {
    chart: ChartResult,
}

#[derive(Deserialize, Debug)]
struct ChartResult {
    result: Option<Vec<ChartItem>>,
}

#[derive(Deserialize, Debug)]
struct ChartItem {
    meta: ChartMeta,
    timestamp: Option<Vec<i64>>,
    indicators: Option<Indicators>,
}

#[derive(Deserialize, Debug)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Bars>,
}

#[derive(Deserialize, Debug, Default)]
struct Bars {
    open: Option<Vec<Option<f64>>>,
    high: Option<Vec<Option<f64>>>,
    low: Option<Vec<Option<f64>>>,
    close: Option<Vec<Option<f64>>>,
    volume: Option<Vec<Option<u64>>>,
}

#[derive(Deserialize, Debug)]
struct ChartMeta {
    symbol: Option<String>,
    #[serde(alias = "regularMarketPrice")]
    regular_market_price: Option<f64>,
    #[serde(alias = "chartPreviousClose")]
    chart_previous_close: Option<f64>,
    #[serde(alias = "previousClose")]
    previous_close: Option<f64>,
    currency: Option<String>,
    #[serde(alias = "exchangeName")]
    exchange_name: Option<String>,
    #[serde(alias = "marketState")]
    market_state: Option<String>,
    #[serde(alias = "instrumentType")]
    instrument_type: Option<String>,
    #[serde(alias = "shortName")]
    short_name: Option<String>,
    #[serde(alias = "longName")]
    long_name: Option<String>,
}

#[derive(Deserialize, Debug)]
struct YahooSearchResponse {
    #[serde(default)]
    quotes: Vec<SearchQuote>,
}

#[derive(Deserialize, Debug)]
struct SearchQuote {
    symbol: String,
    shortname: Option<String>,
    longname: Option<String>,
    exchange: Option<String>,
    #[serde(alias = "quoteType")]
    quote_type: Option<String>,
}

fn quote_from_meta(requested: &str, meta: ChartMeta) -> Result<Quote> {
    let price = meta
        .regular_market_price
        .ok_or_else(|| anyhow!("No price in response for symbol: {}", requested))?;
    // Without a previous close there is no change to report.
    let previous_close = meta
        .chart_previous_close
        .or(meta.previous_close)
        .unwrap_or(price);
    let change = price - previous_close;
    let change_percent = if previous_close != 0.0 {
        change / previous_close * 100.0
    } else {
        0.0
    };

    let exchange = meta.exchange_name.unwrap_or_default();
    let is_crypto = meta.instrument_type.as_deref() == Some("CRYPTOCURRENCY")
        || requested.ends_with("-USD")
        || exchange == "CCC";

    let symbol = meta.symbol.unwrap_or_else(|| requested.to_string());
    let name = meta
        .short_name
        .or(meta.long_name)
        .unwrap_or_else(|| symbol.clone());
    let (display_symbol, name) = if is_crypto {
        crypto_display(&symbol, &name)
    } else {
        (symbol.clone(), name)
    };

    Ok(Quote {
        symbol,
        display_symbol,
        name,
        price,
        previous_close,
        change,
        change_percent,
        currency: meta.currency.unwrap_or_else(|| "USD".to_string()),
        exchange,
        market_state: meta.market_state,
        is_crypto,
        timestamp: Utc::now(),
    })
}

fn points_from_item(item: &ChartItem) -> Vec<PricePoint> {
    let Some(timestamps) = item.timestamp.as_ref() else {
        return Vec::new();
    };
    let bars = item
        .indicators
        .as_ref()
        .and_then(|inds| inds.quote.first());
    let Some(bars) = bars else {
        return Vec::new();
    };
    let at = |series: &Option<Vec<Option<f64>>>, i: usize| {
        series.as_ref().and_then(|s| s.get(i).copied().flatten())
    };

    timestamps
        .iter()
        .enumerate()
        .filter_map(|(i, ts)| {
            let close = at(&bars.close, i)?;
            let timestamp = Utc.timestamp_opt(*ts, 0).single()?;
            Some(PricePoint {
                timestamp,
                open: at(&bars.open, i),
                high: at(&bars.high, i),
                low: at(&bars.low, i),
                close,
                volume: bars
                    .volume
                    .as_ref()
                    .and_then(|v| v.get(i).copied().flatten()),
            })
        })
        .collect()
}

fn is_listed_kind(quote: &SearchQuote) -> bool {
    match quote.quote_type.as_deref() {
        Some("EQUITY" | "ETF" | "INDEX") => true,
        // Only USD pairs for crypto
        Some("CRYPTOCURRENCY") => quote.symbol.ends_with("-USD"),
        _ => false,
    }
}

#[async_trait]
impl QuoteFetcher for YahooFinanceProvider {
    #[instrument(
        name = "YahooQuoteFetch",
        skip(self),
        fields(symbol = %symbol)
    )]
    async fn fetch_quote(&self, symbol: &str) -> Result<Quote> {
        let item = self.chart_item(symbol, "1d", "1d").await?;
        let quote = quote_from_meta(symbol, item.meta)?;
        debug!(price = quote.price, change = quote.change, "Received quote");
        Ok(quote)
    }

    #[instrument(
        name = "YahooChartFetch",
        skip(self),
        fields(symbol = %symbol, range = %range)
    )]
    async fn fetch_chart(&self, symbol: &str, range: ChartRange) -> Result<ChartData> {
        let item = self
            .chart_item(symbol, range.range_param(), range.interval_param())
            .await?;
        let points = points_from_item(&item);
        debug!(points = points.len(), "Received chart data");
        Ok(ChartData {
            symbol: item.meta.symbol.unwrap_or_else(|| symbol.to_string()),
            currency: item.meta.currency.unwrap_or_else(|| "USD".to_string()),
            range,
            points,
        })
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        let mut url = self.endpoint(&["v1", "finance", "search"])?;
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("quotesCount", SEARCH_RESULTS)
            .append_pair("newsCount", "0");
        let data: YahooSearchResponse = self.get_json(url, &format!("search '{query}'")).await?;

        Ok(data
            .quotes
            .into_iter()
            .filter(is_listed_kind)
            .map(|q| {
                let is_crypto = q.quote_type.as_deref() == Some("CRYPTOCURRENCY");
                let name = q
                    .shortname
                    .or(q.longname)
                    .unwrap_or_else(|| q.symbol.clone());
                let (display_symbol, name) = if is_crypto {
                    crypto_display(&q.symbol, &name)
                } else {
                    (q.symbol.clone(), name)
                };
                SearchResult {
                    symbol: q.symbol,
                    display_symbol,
                    name,
                    exchange: q.exchange,
                    kind: q.quote_type.unwrap_or_default(),
                    is_crypto,
                }
            })
            .collect())
    }
}
