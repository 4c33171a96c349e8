pub mod image_fetcher;
pub mod logo_sources;
pub mod util;
pub mod yahoo_finance;

pub use image_fetcher::RemoteImageFetcher;
pub use logo_sources::LogoSourcePolicy;
pub use yahoo_finance::YahooFinanceProvider;
