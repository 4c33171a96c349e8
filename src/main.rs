use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use stockbar::AppCommand;
use stockbar::cli::setup::setup;
use stockbar::core::ChartRange;
use stockbar::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Show a live quote table for the watchlist
    Watch {
        /// Fetch once, print and exit
        #[arg(long)]
        once: bool,
    },
    /// Download and cache logos for the watchlist
    Logos,
    /// Remove all cached logos
    ClearCache,
    /// Show a price chart for a symbol
    Chart {
        symbol: String,
        /// One of 1D, 5D, 1M, 3M, 6M, 1Y
        #[arg(short, long, default_value = "1M")]
        range: ChartRange,
    },
    /// Search for symbols by name or ticker
    Search { query: String },
}

impl From<Commands> for AppCommand {
    fn from(cmd: Commands) -> AppCommand {
        match cmd {
            Commands::Watch { once } => AppCommand::Watch { once },
            Commands::Logos => AppCommand::Logos,
            Commands::ClearCache => AppCommand::ClearCache,
            Commands::Chart { symbol, range } => AppCommand::Chart { symbol, range },
            Commands::Search { query } => AppCommand::Search { query },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => setup(),
        Some(cmd) => stockbar::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
