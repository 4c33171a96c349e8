//! Tracing setup for the binary. Output goes to stderr so it never mixes with
//! the quote tables on stdout.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter, filter::Targets, fmt, prelude::__tracing_subscriber_SubscriberExt,
    util::SubscriberInitExt,
};

const CRATE_TARGET: &str = "stockbar";

fn default_level(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::DEBUG
    } else {
        // Failed refreshes and rejected logo sources are warnings.
        LevelFilter::WARN
    }
}

/// Installs the global subscriber. `RUST_LOG` overrides the default level.
/// Calling it again is a no-op.
pub fn init_logging(verbose: bool) {
    let level = default_level(verbose);
    let crate_filter = Targets::new().with_target(CRATE_TARGET, level);
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_string().to_lowercase()));

    let installed = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .pretty()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(crate_filter)
        .with(env_filter)
        .try_init();
    if installed.is_err() {
        tracing::debug!("Logging already initialized");
    }
}
