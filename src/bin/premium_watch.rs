use anyhow::Context;
use chrono::NaiveDate;
use clap::Parser;
use premium_watch::utils::{init_from_config, Config};
use premium_watch::{market_today, run, Delivery, RunOptions};
use std::path::PathBuf;
use tracing::info;

/// Daily LOF premium, convertible and IPO watcher for A-share markets
#[derive(Parser, Debug)]
#[command(name = "premium_watch", version, about)]
struct Args {
    /// Configuration file (TOML); missing file means built-in defaults
    #[arg(long, env = "CONFIG_FILE", default_value = "config/default.toml")]
    config: PathBuf,

    /// Print the report instead of pushing it to the webhook
    #[arg(long)]
    dry_run: bool,

    /// Report date, YYYY-MM-DD (defaults to today in China Standard Time)
    #[arg(long, value_parser = parse_date)]
    date: Option<NaiveDate>,

    /// Log level or filter directive, overrides the config file
    #[arg(long)]
    log_level: Option<String>,

    /// Emit JSON logs
    #[arg(long)]
    json_logs: bool,
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("expected YYYY-MM-DD: {}", e))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    let args = Args::parse();

    // Load configuration
    let mut config = Config::from_file(&args.config)
        .with_context(|| format!("invalid configuration {}", args.config.display()))?;

    if let Some(level) = args.log_level {
        config.logging.level = level;
    }
    if args.json_logs {
        config.logging.output = "json".to_string();
    }

    // Initialize logging
    init_from_config(&config.logging)?;
    info!("✓ Configuration loaded from {}", args.config.display());
    info!("✓ Watching {} funds", config.watchlist.funds.len());

    let options = RunOptions {
        today: args.date.unwrap_or_else(market_today),
        dry_run: args.dry_run,
    };

    let summary = run(&config, &options).await?;

    match summary.delivery {
        Some(Delivery::Sent { messages }) => info!("Report delivered in {} message(s)", messages),
        Some(Delivery::Skipped) => info!("Report ready but no webhook configured"),
        None if summary.report.is_some() => info!("Report printed (dry run)"),
        None => info!("Nothing to report today"),
    }

    Ok(())
}
