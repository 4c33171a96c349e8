use crate::cli::ui::{
    StyleType, change_cell, header_cell, na_cell, new_styled_table, price_cell, style_text,
};
use crate::core::config::AppConfig;
use crate::poller::{refresh, spawn_poller};
use crate::store::{Listener, QuoteStore};
use anyhow::Result;
use comfy_table::{Cell, Table};
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::debug;

/// Quote table subscribed to the store. Redraws are requested through `changed`.
pub struct QuoteTableView {
    symbols: Vec<String>,
    listener: Listener,
    dirty: Arc<Notify>,
}

impl QuoteTableView {
    pub fn attach(store: &QuoteStore, symbols: Vec<String>) -> Self {
        let dirty = Arc::new(Notify::new());
        let listener = Listener::new({
            let dirty = Arc::clone(&dirty);
            move || dirty.notify_one()
        });
        store.add_listener(&listener);
        Self {
            symbols,
            listener,
            dirty,
        }
    }

    /// Resolves once at least one quote changed since the last call.
    pub async fn changed(&self) {
        self.dirty.notified().await
    }

    pub fn render(&self, store: &QuoteStore) -> Table {
        let mut table = new_styled_table();
        table.set_header(vec![
            header_cell("Symbol"),
            header_cell("Name"),
            header_cell("Price"),
            header_cell("Change"),
            header_cell("Change %"),
            header_cell("Market"),
        ]);

        for symbol in &self.symbols {
            match store.get_quote(symbol) {
                Some(quote) => table.add_row(vec![
                    Cell::new(&quote.display_symbol),
                    Cell::new(&quote.name),
                    price_cell(quote.price, &quote.currency),
                    change_cell(format!("{:+.2}", quote.change), quote.change),
                    change_cell(
                        format!("{:+.2}%", quote.change_percent),
                        quote.change_percent,
                    ),
                    Cell::new(quote.market_state.as_deref().unwrap_or("-")),
                ]),
                None => table.add_row(vec![
                    Cell::new(symbol),
                    Cell::new(style_text("Loading...", StyleType::Subtle)),
                    na_cell(false),
                    na_cell(false),
                    na_cell(false),
                    Cell::new("-"),
                ]),
            };
        }
        table
    }

    pub fn detach(&self, store: &QuoteStore) {
        store.remove_listener(&self.listener);
    }
}

pub async fn run(store: Arc<QuoteStore>, config: &AppConfig, once: bool) -> Result<()> {
    let view = QuoteTableView::attach(&store, config.watchlist.clone());

    if once {
        let report = refresh(&store, &config.watchlist).await;
        println!("{}", view.render(&store));
        if !report.failed.is_empty() {
            println!(
                "{}",
                style_text(
                    &format!("Unavailable: {}", report.failed.join(", ")),
                    StyleType::Error
                )
            );
        }
        view.detach(&store);
        return Ok(());
    }

    let poller = spawn_poller(
        Arc::clone(&store),
        config.watchlist.clone(),
        config.refresh_interval(),
    );
    let term = console::Term::stdout();
    println!("{}", view.render(&store));

    loop {
        tokio::select! {
            _ = view.changed() => {
                term.clear_screen()?;
                println!("{}", style_text("Watchlist", StyleType::Title));
                println!("{}", view.render(&store));
                println!(
                    "{}",
                    style_text(
                        &format!("Refreshing every {}s, Ctrl-C to quit", config.refresh_interval().as_secs()),
                        StyleType::Subtle
                    )
                );
            }
            _ = tokio::signal::ctrl_c() => {
                debug!("Interrupted, stopping watch");
                break;
            }
        }
    }

    poller.abort();
    view.detach(&store);
    Ok(())
}
