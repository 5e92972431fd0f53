//! Ronda CLI binary.
//!
//! Provides the command-line interface for the Ronda composite scoring engine.

mod cmd;
mod data;

use std::path::PathBuf;
use std::process;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "ronda")]
#[command(about = "Composite financial health scores for equities", long_about = None)]
#[command(version)]
struct Cli {
    /// Engine configuration file (JSON). Defaults to RONDA_CONFIG
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Score database URL. Defaults to RONDA_DATABASE_URL
    #[arg(long, global = true)]
    database: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum Format {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Score every active security for a date
    Run {
        /// Snapshot file (.csv or .json)
        #[arg(short, long)]
        data: PathBuf,

        /// Run date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: Format,
    },

    /// Show the latest persisted score for a symbol
    Show {
        /// Ticker symbol
        symbol: String,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: Format,
    },

    /// Explain why the latest score for a symbol moved
    Explain {
        /// Ticker symbol
        symbol: String,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: Format,
    },

    /// Find same-sector peers for a symbol
    Peers {
        /// Ticker symbol
        symbol: String,

        /// Snapshot file (.csv or .json)
        #[arg(short, long)]
        data: PathBuf,

        /// Snapshot date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,

        /// Number of peers to return
        #[arg(short = 'n', long)]
        count: Option<usize>,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: Format,
    },

    /// List the scoring factors
    Factors {
        /// Filter by category
        #[arg(long)]
        category: Option<String>,

        /// Show sub-metrics
        #[arg(short, long)]
        verbose: bool,
    },

    /// Record a reset event that bypasses smoothing on the next run
    Reset {
        /// Ticker symbol
        symbol: String,

        /// Event kind (earnings_release, bankruptcy, delisting, restructuring,
        /// analyst_rating_change, guidance_update, acquisition)
        #[arg(short, long)]
        kind: String,

        /// Event date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry.with(fmt::layer().with_writer(std::io::stderr)).init();
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    let database = cli.database.as_deref();

    match cli.command {
        Commands::Run { data, date, format } => {
            let config = data::load_config(config_path, database)?;
            cmd::run::run_scoring(&config, &data, date.as_deref(), format).await?;
        }
        Commands::Show { symbol, format } => {
            let config = data::load_config(config_path, database)?;
            cmd::show::show_score(&config, &symbol, format).await?;
        }
        Commands::Explain { symbol, format } => {
            let config = data::load_config(config_path, database)?;
            cmd::explain::explain_score(&config, &symbol, format).await?;
        }
        Commands::Peers {
            symbol,
            data,
            date,
            count,
            format,
        } => {
            let config = data::load_config(config_path, database)?;
            cmd::peers::show_peers(&config, &symbol, &data, date.as_deref(), count, format)?;
        }
        Commands::Factors { category, verbose } => {
            cmd::factors::list_factors(category.as_deref(), verbose);
        }
        Commands::Reset { symbol, kind, date } => {
            let config = data::load_config(config_path, database)?;
            cmd::reset::record_reset(&config, &symbol, &kind, date.as_deref()).await?;
        }
    }

    Ok(())
}
