//! CLI definition and dispatch.

use chrono::Utc;
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::mpsc;

use crate::adapters::binance_adapter::BinanceAdapter;
use crate::adapters::csv_adapter::{CsvReplayFeed, candle_file, write_candles};
use crate::adapters::csv_ledger_adapter::{CsvLedgerAdapter, read_trades};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::config::{
    DEFAULT_INITIAL_CAPITAL, TRADER_SECTION, TraderConfig, build_trader_config,
};
use crate::domain::error::TraderError;
use crate::domain::ledger::CapitalLedger;
use crate::domain::metrics::Summary;
use crate::domain::scheduler::Trader;
use crate::ports::data_port::{MarketDataPort, ReplayFeedPort};
use crate::ports::ledger_port::TradeLedgerPort;

#[derive(Parser, Debug)]
#[command(name = "spotbot", version, about = "Spot-market trading agent with simulated fills")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Poll live market data and trade until interrupted
    Run {
        #[arg(short, long)]
        config: PathBuf,
        /// Trade ledger CSV, overriding `ledger_path`
        #[arg(short, long)]
        ledger: Option<PathBuf>,
    },
    /// Run the trading loop over CSV candle files
    Replay {
        #[arg(short, long)]
        config: PathBuf,
        /// Directory holding one `{SYMBOL}.csv` per traded symbol
        #[arg(short, long)]
        data: PathBuf,
        #[arg(short, long)]
        ledger: Option<PathBuf>,
    },
    /// Validate a configuration and print what it resolves to
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Download recent candles for every enabled symbol into CSV files
    Fetch {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        out: PathBuf,
    },
    /// Summarize a trade ledger file and flag weak performance
    Report {
        #[arg(short, long)]
        ledger: PathBuf,
        /// Take the starting capital from this configuration
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Run { config, ledger } => run_live(&config, ledger.as_deref()),
        Command::Replay {
            config,
            data,
            ledger,
        } => run_replay(&config, &data, ledger.as_deref()),
        Command::Validate { config } => run_validate(&config),
        Command::Fetch { config, out } => run_fetch(&config, &out),
        Command::Report { ledger, config } => run_report(&ledger, config.as_deref()),
    }
}

const RECENT_TRADES: usize = 5;

fn fail(err: TraderError) -> ExitCode {
    eprintln!("error: {err}");
    ExitCode::from(&err)
}

/// Load, validate and freeze the configuration at `path`.
pub fn load_trader_config(path: &Path) -> Result<TraderConfig, ExitCode> {
    let adapter = FileConfigAdapter::load(path).map_err(fail)?;
    build_trader_config(&adapter).map_err(fail)
}

/// Distinct symbols of the enabled strategies, in configuration order.
pub fn traded_symbols(config: &TraderConfig) -> Vec<String> {
    let mut symbols: Vec<String> = Vec::new();
    for strategy in config.enabled_strategies() {
        if !symbols.contains(&strategy.symbol) {
            symbols.push(strategy.symbol.clone());
        }
    }
    symbols
}

fn open_ledger(config: &TraderConfig, override_path: Option<&Path>) -> Result<CsvLedgerAdapter, ExitCode> {
    let path = override_path.unwrap_or(&config.ledger_path);
    CsvLedgerAdapter::open(path).map_err(fail)
}

fn run_live(config_path: &Path, ledger_path: Option<&Path>) -> ExitCode {
    // Stage 1: Load and validate config
    eprintln!("Loading config from {}", config_path.display());
    let config = match load_trader_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    // Stage 2: Only simulated fills ship with this build
    if !config.simulation {
        return fail(TraderError::ConfigInvalid {
            section: TRADER_SECTION.to_string(),
            key: "simulation".to_string(),
            reason: "live order execution needs an exchange execution adapter, none is available"
                .to_string(),
        });
    }

    // Stage 3: Wire adapters
    let feed = match BinanceAdapter::new(&config.feed_base_url) {
        Ok(f) => f,
        Err(e) => return fail(e),
    };
    let mut ledger = match open_ledger(&config, ledger_path) {
        Ok(l) => l,
        Err(code) => return code,
    };
    eprintln!("Trade ledger: {}", ledger.path().display());

    // Stage 4: Ctrl-C ends the current wait and drains the loop
    let (tx, rx) = mpsc::channel();
    if let Err(e) = ctrlc::set_handler(move || {
        let _ = tx.send(());
    }) {
        eprintln!("error: failed to install interrupt handler: {e}");
        return ExitCode::from(1);
    }

    eprintln!(
        "Trading {} strategies on {} (simulated fills, Ctrl-C to stop)",
        config.enabled_strategies().count(),
        config.feed_base_url
    );
    let mut trader = Trader::simulated(config, &feed, &mut ledger, Utc::now());
    match trader.run(&rx) {
        Ok(summary) => {
            print_summary(&summary);
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}

fn run_replay(config_path: &Path, data_dir: &Path, ledger_path: Option<&Path>) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let config = match load_trader_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let symbols = traded_symbols(&config);
    eprintln!("Loading candles for {} from {}", symbols.join(", "), data_dir.display());
    let feed = match CsvReplayFeed::load(data_dir, &symbols) {
        Ok(f) => f,
        Err(e) => return fail(e),
    };

    let mut ledger = match open_ledger(&config, ledger_path) {
        Ok(l) => l,
        Err(code) => return code,
    };

    match run_replay_pipeline(config, &feed, &mut ledger) {
        Ok(summary) => {
            print_summary(&summary);
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}

/// Replay `feed` from its first candle to its last with simulated fills.
pub fn run_replay_pipeline<F: ReplayFeedPort>(
    config: TraderConfig,
    feed: &F,
    ledger: &mut dyn TradeLedgerPort,
) -> Result<Summary, TraderError> {
    let timeline = feed.timeline();
    let Some(&start) = timeline.first() else {
        return Err(TraderError::Feed {
            symbol: traded_symbols(&config).join(","),
            reason: "replay data is empty".to_string(),
        });
    };
    eprintln!("  Processing: {} timestamps", timeline.len());

    let mut trader = Trader::simulated(config, feed, ledger, start);
    trader.run_replay(feed)
}

fn print_summary(summary: &Summary) {
    eprintln!("\n=== Performance Summary ===");
    eprintln!("{summary}");
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let config = match load_trader_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    eprintln!("\nTrader:");
    eprintln!("  initial_capital:  {:.2}", config.initial_capital);
    eprintln!("  max_leverage:     {}", config.max_leverage);
    eprintln!("  max_drawdown:     {:.1}%", config.max_drawdown * 100.0);
    eprintln!("  max_daily_loss:   {:.1}%", config.max_daily_loss * 100.0);
    eprintln!("  update_interval:  {}s", config.update_interval.as_secs());
    eprintln!("  summary_interval: {}s", config.summary_interval.as_secs());
    eprintln!("  simulation:       {}", config.simulation);
    eprintln!("  slippage / fees:  {:.3}% / {:.3}%", config.slippage * 100.0, config.fees * 100.0);
    eprintln!("  candles:          {} x {}", config.candle_limit, config.timeframe);
    eprintln!("  ledger:           {}", config.ledger_path.display());
    eprintln!("  feed:             {}", config.feed_base_url);

    eprintln!("\nStrategies:");
    for s in &config.strategies {
        eprintln!(
            "  {:<12} {:<16} {:<10} {:<8} lev {:.1}x size {:.0}% sl {:.1}% tp {:.1}% trail {:.1}%",
            s.name,
            s.signal.as_str(),
            s.symbol,
            if s.enabled { "enabled" } else { "disabled" },
            s.leverage,
            s.position_size * 100.0,
            s.stop_loss * 100.0,
            s.take_profit * 100.0,
            s.trailing_stop * 100.0,
        );
    }

    if !config.simulation {
        eprintln!("\nwarning: simulation = false; `run` refuses to start without an execution adapter");
    }

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

fn run_fetch(config_path: &Path, out_dir: &Path) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let config = match load_trader_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let feed = match BinanceAdapter::new(&config.feed_base_url) {
        Ok(f) => f,
        Err(e) => return fail(e),
    };

    if let Err(e) = fs::create_dir_all(out_dir) {
        return fail(e.into());
    }

    match fetch_to_dir(&feed, &config, out_dir) {
        Ok(count) => {
            eprintln!("{count} symbols written to {}", out_dir.display());
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}

/// Write the latest `candle_limit` candles of every traded symbol to `out_dir`.
pub fn fetch_to_dir(
    feed: &dyn MarketDataPort,
    config: &TraderConfig,
    out_dir: &Path,
) -> Result<usize, TraderError> {
    let symbols = traded_symbols(config);
    for symbol in &symbols {
        let candles = feed.fetch_candles(symbol, &config.timeframe, config.candle_limit)?;
        let path = candle_file(out_dir, symbol);
        write_candles(&path, &candles)?;
        eprintln!("  {symbol}: {} candles -> {}", candles.len(), path.display());
    }
    Ok(symbols.len())
}

/// Rebuild the capital ledger from a trade ledger file.
pub fn read_ledger(path: &Path, initial_capital: f64) -> Result<CapitalLedger, TraderError> {
    let mut ledger = CapitalLedger::new(initial_capital);
    for trade in read_trades(path)? {
        ledger.settle(trade);
    }
    Ok(ledger)
}

fn run_report(ledger_path: &Path, config_path: Option<&Path>) -> ExitCode {
    // Stage 1: Starting capital
    let initial_capital = match config_path {
        Some(path) => {
            eprintln!("Loading config from {}", path.display());
            match load_trader_config(path) {
                Ok(c) => c.initial_capital,
                Err(code) => return code,
            }
        }
        None => DEFAULT_INITIAL_CAPITAL,
    };

    // Stage 2: Read trades
    eprintln!("Reading trade ledger {}", ledger_path.display());
    let ledger = match read_ledger(ledger_path, initial_capital) {
        Ok(l) => l,
        Err(e) => return fail(e),
    };
    if ledger.trades.is_empty() {
        eprintln!("No trades recorded yet.");
        return ExitCode::SUCCESS;
    }

    // Stage 3: Summary, latest trades and alerts
    let summary = Summary::compute(&ledger, 0);
    eprintln!("\n=== Ledger Report ===");
    eprintln!("{summary}");

    eprintln!("\nRecent trades:");
    let start = ledger.trades.len().saturating_sub(RECENT_TRADES);
    for t in &ledger.trades[start..] {
        eprintln!(
            "  {:<12} {:<10} {:>10.4} -> {:<10.4} {:>+7.2}% ${:>+9.2} {:<16} {}",
            t.strategy,
            t.symbol,
            t.entry_price,
            t.exit_price,
            t.pnl_pct,
            t.pnl_usd,
            t.reason.as_str(),
            t.exit_time.format("%Y-%m-%d %H:%M"),
        );
    }

    eprintln!("\nRisk alerts:");
    let alerts = summary.alerts();
    if alerts.is_empty() {
        eprintln!("  none");
    }
    for alert in &alerts {
        eprintln!("  warning: {alert}");
    }
    ExitCode::SUCCESS
}
