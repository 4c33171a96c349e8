//! Core domain abstractions

pub mod config;
pub mod log;
pub mod logo;
pub mod quote;

// Re-export main types for cleaner imports
pub use logo::{ByteStore, FetchOutcome, ImageFetcher, LogoHandle, LogoOrigin, LogoRequest};
pub use quote::{ChartData, ChartRange, PricePoint, Quote, QuoteFetcher, SearchResult};
