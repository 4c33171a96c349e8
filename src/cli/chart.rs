use crate::cli::ui::{
    StyleType, change_cell, header_cell, new_styled_table, sparkline, style_text,
};
use crate::core::ChartRange;
use crate::store::QuoteStore;
use anyhow::{Context, Result};
use comfy_table::Cell;

pub async fn run_chart(store: &QuoteStore, symbol: &str, range: ChartRange) -> Result<()> {
    let fetcher = store.fetcher().context("Quote fetcher is not available")?;
    let chart = fetcher
        .fetch_chart(symbol, range)
        .await
        .with_context(|| format!("Failed to load {range} chart for {symbol}"))?;

    let closes = chart.closes();
    let (Some(first), Some(last)) = (closes.first(), closes.last()) else {
        println!("{}", style_text("No chart data", StyleType::Error));
        return Ok(());
    };
    let min = closes.iter().copied().fold(f64::INFINITY, f64::min);
    let max = closes.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let change = if *first != 0.0 {
        (last - first) / first * 100.0
    } else {
        0.0
    };

    println!(
        "{}",
        style_text(&format!("{} {}", chart.symbol, chart.range), StyleType::Title)
    );
    println!("{}", sparkline(&closes));

    let mut table = new_styled_table();
    table.set_header(vec![
        header_cell("Low"),
        header_cell("High"),
        header_cell("Last"),
        header_cell("Change"),
    ]);
    table.add_row(vec![
        Cell::new(format!("{min:.2} {}", chart.currency)),
        Cell::new(format!("{max:.2} {}", chart.currency)),
        Cell::new(format!("{last:.2} {}", chart.currency)),
        change_cell(format!("{change:+.2}%"), change),
    ]);
    println!("{table}");
    Ok(())
}

pub async fn run_search(store: &QuoteStore, query: &str) -> Result<()> {
    let fetcher = store.fetcher().context("Quote fetcher is not available")?;
    let results = fetcher.search(query).await?;
    if results.is_empty() {
        println!("{}", style_text("No matches", StyleType::Subtle));
        return Ok(());
    }

    let mut table = new_styled_table();
    table.set_header(vec![
        header_cell("Symbol"),
        header_cell("Name"),
        header_cell("Type"),
        header_cell("Exchange"),
    ]);
    for result in results {
        table.add_row(vec![
            Cell::new(&result.symbol),
            Cell::new(&result.name),
            Cell::new(&result.kind),
            Cell::new(result.exchange.as_deref().unwrap_or("-")),
        ]);
    }
    println!("{table}");
    Ok(())
}
