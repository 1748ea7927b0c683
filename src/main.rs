//! mtfsignal - multi-timeframe futures signal scanner
//!
//! # Usage
//! ```sh
//! mtfsignal analyze --symbol ETHUSDT
//! mtfsignal backtest --offline tests/data --json
//! TELEGRAM_TOKEN=... TELEGRAM_CHAT_ID=... mtfsignal live
//! ```
//!
//! All tuning parameters come from environment variables (see `config`),
//! optionally loaded from a `.env` file.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mtfsignal::application::backtest::Backtester;
use mtfsignal::application::live_monitor::LiveSignalMonitor;
use mtfsignal::application::market_data::MultiTimeframeFusion;
use mtfsignal::config::Config;
use mtfsignal::domain::market::candle::CandleSeries;
use mtfsignal::domain::market::timeframe::Timeframe;
use mtfsignal::domain::ports::{CandleQuery, CandleSource};
use mtfsignal::infrastructure::{BinanceCandleSource, TelegramNotifier, load_dataset_dir};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{Level, info, warn};
use tracing_subscriber::prelude::*;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the latest fused signal for one symbol
    Analyze {
        #[command(flatten)]
        data: DataArgs,
    },
    /// Replay the fused signal over historical candles
    Backtest {
        #[command(flatten)]
        data: DataArgs,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Poll Binance and send alerts on new signals until Ctrl-C
    Live,
}

#[derive(clap::Args)]
struct DataArgs {
    /// Symbol to analyze
    #[arg(long, default_value = "BTCUSDT")]
    symbol: String,
    /// Read `{label}.csv` files from this directory instead of Binance
    #[arg(long, value_name = "DIR")]
    offline: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stdout_layer)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Commands::Analyze { data } => analyze(&config, &data).await,
        Commands::Backtest { data, json } => backtest(&config, &data, json).await,
        Commands::Live => live(&config).await,
    }
}

async fn load_data(
    config: &Config,
    args: &DataArgs,
) -> Result<BTreeMap<Timeframe, CandleSeries>> {
    let mut timeframes = config.fusion_config().fusion_timeframes();
    if !timeframes.contains(&config.live.base_timeframe) {
        timeframes.push(config.live.base_timeframe);
    }

    if let Some(dir) = &args.offline {
        return load_dataset_dir(dir, &args.symbol, &timeframes)
            .with_context(|| format!("Failed to load offline dataset from {}", dir.display()));
    }

    let source = BinanceCandleSource::new(config.live.binance_base_url.clone());
    let mut data = BTreeMap::new();
    for timeframe in timeframes {
        let query =
            CandleQuery::latest(&args.symbol, timeframe, config.live.backtest_candle_limit);
        let series = source.fetch_candles(&query).await;
        if series.is_empty() {
            warn!("No {} candles for {}", timeframe, args.symbol);
        }
        data.insert(timeframe, series);
    }
    Ok(data)
}

async fn analyze(config: &Config, args: &DataArgs) -> Result<()> {
    let data = load_data(config, args).await?;
    let base = config.live.base_timeframe;
    let timestamp = data
        .get(&base)
        .and_then(|series| series.last())
        .map(|candle| candle.open_time)
        .with_context(|| format!("No {} candles available for {}", base, args.symbol))?;

    let result = MultiTimeframeFusion::new(&data, config.fusion_config()).analyze(timestamp);
    let details = result
        .per_timeframe
        .iter()
        .map(|(tf, signal)| format!("{}={}", tf, signal.kind))
        .collect::<Vec<_>>()
        .join(", ");

    println!(
        "Latest Final Signal: {} | Confidence: {:.2} | Details: {}",
        result.final_signal, result.confidence, details
    );
    Ok(())
}

async fn backtest(config: &Config, args: &DataArgs, json: bool) -> Result<()> {
    let data = load_data(config, args).await?;
    info!("Running backtest for {}...", args.symbol);
    let report = Backtester::new(config.fusion_config()).run(&data, config.live.base_timeframe);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "Total Trades: {} | Wins: {} | Losses: {} | Win Rate: {:.2}%",
            report.total_trades(),
            report.wins,
            report.losses,
            report.win_rate_pct
        );
    }
    Ok(())
}

async fn live(config: &Config) -> Result<()> {
    info!("mtfsignal {} starting live monitor", env!("CARGO_PKG_VERSION"));

    let source = Arc::new(BinanceCandleSource::new(config.live.binance_base_url.clone()));
    let notifier = Arc::new(TelegramNotifier::new(
        config.live.telegram_token.clone(),
        config.live.telegram_chat_id.clone(),
    ));
    if !notifier.is_configured() {
        warn!("TELEGRAM_TOKEN/TELEGRAM_CHAT_ID not set: signals will be logged but not delivered");
    }

    LiveSignalMonitor::new(
        source,
        notifier,
        config.fusion_config(),
        config.live_monitor_config(),
    )
    .run()
    .await
}
