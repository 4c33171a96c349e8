//! Quote abstractions and core types

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// Latest known snapshot for a symbol. Replaced wholesale on every refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub display_symbol: String,
    pub name: String,
    pub price: f64,
    pub previous_close: f64,
    pub change: f64,
    pub change_percent: f64,
    pub currency: String,
    pub exchange: String,
    pub market_state: Option<String>,
    pub is_crypto: bool,
    pub timestamp: DateTime<Utc>,
}

impl Quote {
    pub fn is_up(&self) -> bool {
        self.change >= 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChartRange {
    OneDay,
    FiveDays,
    OneMonth,
    ThreeMonths,
    SixMonths,
    OneYear,
}

impl Display for ChartRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                ChartRange::OneDay => "1D",
                ChartRange::FiveDays => "5D",
                ChartRange::OneMonth => "1M",
                ChartRange::ThreeMonths => "3M",
                ChartRange::SixMonths => "6M",
                ChartRange::OneYear => "1Y",
            }
        )
    }
}

impl ChartRange {
    /// Value of the `range` query parameter.
    pub fn range_param(&self) -> &'static str {
        match self {
            ChartRange::OneDay => "1d",
            ChartRange::FiveDays => "5d",
            ChartRange::OneMonth => "1mo",
            ChartRange::ThreeMonths => "3mo",
            ChartRange::SixMonths => "6mo",
            ChartRange::OneYear => "1y",
        }
    }

    /// Bar size used for the range, coarse enough to keep the point count small.
    pub fn interval_param(&self) -> &'static str {
        match self {
            ChartRange::OneDay => "5m",
            ChartRange::FiveDays => "15m",
            ChartRange::OneMonth | ChartRange::ThreeMonths | ChartRange::SixMonths => "1d",
            ChartRange::OneYear => "1wk",
        }
    }
}

impl FromStr for ChartRange {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "1D" => Ok(ChartRange::OneDay),
            "5D" => Ok(ChartRange::FiveDays),
            "1M" => Ok(ChartRange::OneMonth),
            "3M" => Ok(ChartRange::ThreeMonths),
            "6M" => Ok(ChartRange::SixMonths),
            "1Y" => Ok(ChartRange::OneYear),
            _ => Err(anyhow::anyhow!("Invalid chart range: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: f64,
    pub volume: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartData {
    pub symbol: String,
    pub currency: String,
    pub range: ChartRange,
    pub points: Vec<PricePoint>,
}

impl ChartData {
    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub symbol: String,
    pub display_symbol: String,
    pub name: String,
    pub exchange: Option<String>,
    pub kind: String,
    pub is_crypto: bool,
}

/// Strips the `-USD` pair suffix from crypto symbols and names for display.
pub fn crypto_display(symbol: &str, name: &str) -> (String, String) {
    match symbol.strip_suffix("-USD") {
        Some(base) => (
            base.to_string(),
            name.replace(" / USD", "")
                .replace(" USD", "")
                .replace("/USD", ""),
        ),
        None => (symbol.to_string(), name.to_string()),
    }
}

/// Source of quotes. Treated as unreliable: any symbol may fail on its own.
#[async_trait]
pub trait QuoteFetcher: Send + Sync {
    async fn fetch_quote(&self, symbol: &str) -> Result<Quote>;

    /// Fetches every symbol concurrently. A failing symbol never aborts the batch.
    async fn fetch_many(&self, symbols: &[String]) -> Vec<(String, Result<Quote>)> {
        let results = join_all(symbols.iter().map(|s| self.fetch_quote(s))).await;
        symbols.iter().cloned().zip(results).collect()
    }

    async fn fetch_chart(&self, symbol: &str, range: ChartRange) -> Result<ChartData>;

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>>;
}
