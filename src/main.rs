use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use dashboard::{
    commands::{pnl, records, refresh, watermarks},
    config::{settings_from_env, DashboardSettings},
    context::AppContext,
    dates::parse_iso_date,
};
use log::{info, warn};

#[derive(Parser)]
#[command(name = "dashboard")]
#[command(about = "Turns trading performance data into chart-ready PnL, heatmap and table views")]
struct Cli {
    /// Dashboard API base URL (overrides DASHBOARD_URL)
    #[arg(long, global = true, value_name = "URL")]
    url: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Cumulative PnL series per strategy plus the aggregate line
    Pnl {
        /// First day of the range (YYYY-MM-DD)
        #[arg(long, value_parser = parse_cli_date)]
        from: NaiveDate,
        /// Last day of the range, inclusive (YYYY-MM-DD)
        #[arg(long, value_parser = parse_cli_date)]
        to: NaiveDate,
        /// Seed for series colours, for reproducible output
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Weekly watermark heatmap over the trailing year
    Watermarks {
        #[arg(long, value_parser = parse_cli_date)]
        from: NaiveDate,
        #[arg(long, value_parser = parse_cli_date)]
        to: NaiveDate,
    },
    /// Strategy records table for one symbol or the whole universe
    Records {
        /// Restrict to a single symbol (defaults to the universe)
        #[arg(long)]
        symbol: Option<String>,
        /// Case-insensitive filter applied to every column
        #[arg(long)]
        search: Option<String>,
        /// Page to print, starting at 1
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// Reload the PnL chart and the heatmap concurrently
    Refresh {
        #[arg(long, value_parser = parse_cli_date)]
        from: NaiveDate,
        #[arg(long, value_parser = parse_cli_date)]
        to: NaiveDate,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let Cli { url, command } = cli;

    let dotenv_loaded = dotenvy::dotenv().is_ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if !dotenv_loaded {
        info!("No .env file found; using process environment only");
    }

    let mut settings = DashboardSettings::from_settings_map(&settings_from_env())
        .context("invalid dashboard settings")?;
    if let Some(url) = url.as_deref() {
        settings = settings.with_base_url(url)?;
    }
    let app_context = AppContext::initialize(settings)?;

    match command {
        Commands::Pnl { from, to, seed } => {
            warn_if_inverted(from, to);
            pnl::run(&app_context, from, to, seed).await?;
        }
        Commands::Watermarks { from, to } => {
            warn_if_inverted(from, to);
            watermarks::run(&app_context, from, to).await?;
        }
        Commands::Records {
            symbol,
            search,
            page,
        } => {
            records::run(&app_context, symbol.as_deref(), search.as_deref(), page).await?;
        }
        Commands::Refresh { from, to } => {
            warn_if_inverted(from, to);
            refresh::run(&app_context, from, to).await?;
        }
    }

    app_context.session().unmount();
    Ok(())
}

fn parse_cli_date(raw: &str) -> Result<NaiveDate, String> {
    parse_iso_date(raw).map_err(|err| err.to_string())
}

fn warn_if_inverted(from: NaiveDate, to: NaiveDate) {
    if from > to {
        warn!("--from {} is after --to {}; the range is empty", from, to);
    }
}
