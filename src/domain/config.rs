//! Immutable trader configuration, built once at startup.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use crate::domain::config_validation::validate_trader_config;
use crate::domain::error::TraderError;
use crate::domain::signal::SignalKind;
use crate::ports::config_port::ConfigPort;

pub const TRADER_SECTION: &str = "trader";
pub const FEED_SECTION: &str = "feed";

pub const DEFAULT_INITIAL_CAPITAL: f64 = 10_000.0;
pub const DEFAULT_MAX_LEVERAGE: f64 = 5.0;
pub const DEFAULT_MAX_DRAWDOWN: f64 = 0.15;
pub const DEFAULT_MAX_DAILY_LOSS: f64 = 0.03;
pub const DEFAULT_UPDATE_INTERVAL_SECS: i64 = 60;
pub const DEFAULT_SUMMARY_INTERVAL_SECS: i64 = 3600;
pub const DEFAULT_SLIPPAGE: f64 = 0.001;
pub const DEFAULT_FEES: f64 = 0.001;
pub const DEFAULT_TIMEFRAME: &str = "1h";
pub const DEFAULT_CANDLE_LIMIT: i64 = 300;
pub const DEFAULT_LEDGER_PATH: &str = "trades.csv";
pub const DEFAULT_FEED_URL: &str = "https://api.binance.com";

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyConfig {
    pub name: String,
    pub signal: SignalKind,
    pub symbol: String,
    pub enabled: bool,
    pub leverage: f64,
    pub position_size: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub trailing_stop: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TraderConfig {
    pub initial_capital: f64,
    pub max_leverage: f64,
    pub max_drawdown: f64,
    pub max_daily_loss: f64,
    pub update_interval: Duration,
    /// Zero disables the periodic summary.
    pub summary_interval: Duration,
    pub simulation: bool,
    pub slippage: f64,
    pub fees: f64,
    pub timeframe: String,
    pub candle_limit: usize,
    pub ledger_path: PathBuf,
    pub feed_base_url: String,
    /// In the order listed by `[trader] strategies`.
    pub strategies: Vec<StrategyConfig>,
}

impl TraderConfig {
    pub fn enabled_strategies(&self) -> impl Iterator<Item = &StrategyConfig> {
        self.strategies.iter().filter(|s| s.enabled)
    }

    pub fn strategy(&self, name: &str) -> Option<&StrategyConfig> {
        self.strategies
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
    }
}

/// Parse the comma-separated `strategies` list. Names keep their case;
/// duplicates are detected case-insensitively.
pub fn parse_strategy_names(input: &str) -> Result<Vec<String>, TraderError> {
    let mut names = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(TraderError::ConfigInvalid {
                section: TRADER_SECTION.to_string(),
                key: "strategies".to_string(),
                reason: "empty name in strategy list".to_string(),
            });
        }
        if !seen.insert(trimmed.to_lowercase()) {
            return Err(TraderError::ConfigInvalid {
                section: TRADER_SECTION.to_string(),
                key: "strategies".to_string(),
                reason: format!("duplicate strategy: {trimmed}"),
            });
        }
        names.push(trimmed.to_string());
    }

    Ok(names)
}

/// Validate and freeze the configuration.
pub fn build_trader_config(adapter: &dyn ConfigPort) -> Result<TraderConfig, TraderError> {
    validate_trader_config(adapter)?;

    let names = match adapter.get_string(TRADER_SECTION, "strategies") {
        Some(s) => parse_strategy_names(&s)?,
        None => {
            return Err(TraderError::ConfigMissing {
                section: TRADER_SECTION.to_string(),
                key: "strategies".to_string(),
            });
        }
    };

    let strategies = names
        .into_iter()
        .map(|name| build_strategy_config(adapter, name))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(TraderConfig {
        initial_capital: adapter.get_double(TRADER_SECTION, "initial_capital", DEFAULT_INITIAL_CAPITAL),
        max_leverage: adapter.get_double(TRADER_SECTION, "max_leverage", DEFAULT_MAX_LEVERAGE),
        max_drawdown: adapter.get_double(TRADER_SECTION, "max_drawdown", DEFAULT_MAX_DRAWDOWN),
        max_daily_loss: adapter.get_double(TRADER_SECTION, "max_daily_loss", DEFAULT_MAX_DAILY_LOSS),
        update_interval: seconds(adapter.get_int(
            TRADER_SECTION,
            "update_interval",
            DEFAULT_UPDATE_INTERVAL_SECS,
        )),
        summary_interval: seconds(adapter.get_int(
            TRADER_SECTION,
            "summary_interval",
            DEFAULT_SUMMARY_INTERVAL_SECS,
        )),
        simulation: adapter.get_bool(TRADER_SECTION, "simulation", true),
        slippage: adapter.get_double(TRADER_SECTION, "slippage", DEFAULT_SLIPPAGE),
        fees: adapter.get_double(TRADER_SECTION, "fees", DEFAULT_FEES),
        timeframe: adapter
            .get_string(TRADER_SECTION, "timeframe")
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|| DEFAULT_TIMEFRAME.to_string()),
        candle_limit: adapter.get_int(TRADER_SECTION, "candle_limit", DEFAULT_CANDLE_LIMIT) as usize,
        ledger_path: adapter
            .get_string(TRADER_SECTION, "ledger_path")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LEDGER_PATH)),
        feed_base_url: adapter
            .get_string(FEED_SECTION, "base_url")
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_FEED_URL.to_string()),
        strategies,
    })
}

fn build_strategy_config(adapter: &dyn ConfigPort, name: String) -> Result<StrategyConfig, TraderError> {
    let section = name.to_lowercase();
    let signal = adapter
        .get_string(&section, "signal")
        .unwrap_or_default()
        .parse::<SignalKind>()
        .map_err(|e| TraderError::ConfigInvalid {
            section: section.clone(),
            key: "signal".to_string(),
            reason: e.to_string(),
        })?;

    Ok(StrategyConfig {
        signal,
        symbol: adapter
            .get_string(&section, "symbol")
            .unwrap_or_default()
            .trim()
            .to_uppercase(),
        enabled: adapter.get_bool(&section, "enabled", true),
        leverage: adapter.get_double(&section, "leverage", 1.0),
        position_size: adapter.get_double(&section, "position_size", 0.0),
        stop_loss: adapter.get_double(&section, "stop_loss", 0.0),
        take_profit: adapter.get_double(&section, "take_profit", 0.0),
        trailing_stop: adapter.get_double(&section, "trailing_stop", 0.0),
        name,
    })
}

fn seconds(value: i64) -> Duration {
    Duration::from_secs(value.max(0) as u64)
}
