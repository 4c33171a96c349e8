use crate::cli::ui::{StyleType, header_cell, new_progress_bar, new_styled_table, style_text};
use crate::core::config::AppConfig;
use crate::core::{LogoOrigin, LogoRequest};
use crate::poller::refresh;
use crate::providers::LogoSourcePolicy;
use crate::store::QuoteStore;
use anyhow::{Context, Result};
use comfy_table::Cell;
use futures::future::join_all;

/// Resolves logos for the whole watchlist and prints where each one landed.
pub async fn run(store: &QuoteStore, config: &AppConfig) -> Result<()> {
    let logos = store.logo_cache().context("Logo cache is not available")?;
    // Company names improve domain guesses for unmapped tickers.
    refresh(store, &config.watchlist).await;

    let policy = LogoSourcePolicy::default();
    let pb = new_progress_bar(config.watchlist.len() as u64);
    pb.set_message("Resolving logos");

    let results = join_all(config.watchlist.iter().map(|symbol| {
        let name = store.get_quote(symbol).map(|q| q.name);
        let request = policy.resolve(symbol, name.as_deref());
        let logos = logos.clone();
        let pb = pb.clone();
        async move {
            let handle = logos.load_logo(symbol, &request).await;
            pb.inc(1);
            (symbol, request, handle)
        }
    }))
    .await;
    pb.finish_and_clear();

    let mut table = new_styled_table();
    table.set_header(vec![
        header_cell("Symbol"),
        header_cell("Source"),
        header_cell("File"),
    ]);
    for (symbol, request, handle) in results {
        let (source, file) = match (&request, handle) {
            (LogoRequest::Absent, _) => ("no known source".to_string(), "-".to_string()),
            (_, None) => (
                style_text("unavailable", StyleType::Error),
                "-".to_string(),
            ),
            (_, Some(handle)) => {
                let source = match handle.origin {
                    LogoOrigin::Downloaded { url } => url,
                    LogoOrigin::DiskCache => style_text("cached", StyleType::Subtle),
                };
                (source, handle.path.display().to_string())
            }
        };
        table.add_row(vec![Cell::new(symbol), Cell::new(source), Cell::new(file)]);
    }
    println!("{table}");
    Ok(())
}

pub async fn clear(store: &QuoteStore) -> Result<()> {
    let logos = store.logo_cache().context("Logo cache is not available")?;
    let removed = logos.clear_cache().await?;
    println!(
        "Removed {} cached logo(s) from {}",
        removed,
        logos.cache_dir().display()
    );
    Ok(())
}
