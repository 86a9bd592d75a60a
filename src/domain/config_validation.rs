//! Configuration validation.
//!
//! Checks every `[trader]` key and every listed strategy section before the
//! configuration is frozen into a `TraderConfig`.

use std::collections::HashSet;

use crate::domain::config::{
    DEFAULT_MAX_LEVERAGE, FEED_SECTION, TRADER_SECTION, parse_strategy_names,
};
use crate::domain::error::TraderError;
use crate::domain::indicator_row::WARMUP_CANDLES;
use crate::domain::signal::SignalKind;
use crate::ports::config_port::ConfigPort;

pub fn validate_trader_config(config: &dyn ConfigPort) -> Result<(), TraderError> {
    validate_initial_capital(config)?;
    validate_max_leverage(config)?;
    validate_fraction(config, TRADER_SECTION, "max_drawdown", 0.15)?;
    validate_fraction(config, TRADER_SECTION, "max_daily_loss", 0.03)?;
    validate_fraction(config, TRADER_SECTION, "slippage", 0.001)?;
    validate_fraction(config, TRADER_SECTION, "fees", 0.001)?;
    validate_intervals(config)?;
    validate_candle_limit(config)?;
    validate_timeframe(config)?;
    validate_feed(config)?;

    let names = strategy_names(config)?;
    let max_leverage = number(config, TRADER_SECTION, "max_leverage", DEFAULT_MAX_LEVERAGE)?;
    let mut symbols = HashSet::new();
    for name in &names {
        validate_strategy_section(config, name, max_leverage)?;
        let symbol = config
            .get_string(name, "symbol")
            .unwrap_or_default()
            .trim()
            .to_uppercase();
        let enabled = config.get_bool(name, "enabled", true);
        if enabled && !symbols.insert(symbol.clone()) {
            return Err(invalid(
                &name.to_lowercase(),
                "symbol",
                format!("{symbol} is already traded by another enabled strategy"),
            ));
        }
    }
    Ok(())
}

/// Validate one `[NAME]` strategy section.
pub fn validate_strategy_section(
    config: &dyn ConfigPort,
    name: &str,
    max_leverage: f64,
) -> Result<(), TraderError> {
    let section = name.to_lowercase();
    let section = section.as_str();

    match config.get_string(section, "signal") {
        Some(s) => {
            s.parse::<SignalKind>()
                .map_err(|e| invalid(section, "signal", e.to_string()))?;
        }
        None => {
            return Err(TraderError::ConfigMissing {
                section: section.to_string(),
                key: "signal".to_string(),
            });
        }
    }

    require_value(config, section, "symbol")?;

    let leverage = number(config, section, "leverage", 1.0)?;
    if leverage <= 0.0 {
        return Err(invalid(section, "leverage", "leverage must be positive".into()));
    }
    if leverage > max_leverage {
        return Err(invalid(
            section,
            "leverage",
            format!("leverage {leverage} exceeds max_leverage {max_leverage}"),
        ));
    }

    let position_size = number(config, section, "position_size", 0.0)?;
    if position_size <= 0.0 || position_size > 1.0 {
        return Err(invalid(
            section,
            "position_size",
            "position_size must be in (0, 1]".into(),
        ));
    }

    validate_fraction(config, section, "stop_loss", 0.0)?;
    validate_fraction(config, section, "trailing_stop", 0.0)?;

    let take_profit = number(config, section, "take_profit", 0.0)?;
    if take_profit < 0.0 {
        return Err(invalid(
            section,
            "take_profit",
            "take_profit must be non-negative".into(),
        ));
    }

    Ok(())
}

/// Read a float key strictly: absent means `default`, anything present must
/// parse as a finite number.
fn number(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, TraderError> {
    let Some(raw) = config.get_string(section, key) else {
        return Ok(default);
    };
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(invalid(
            section,
            key,
            format!("'{}' is not a finite number", raw.trim()),
        )),
    }
}

fn integer(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: i64,
) -> Result<i64, TraderError> {
    let Some(raw) = config.get_string(section, key) else {
        return Ok(default);
    };
    raw.trim()
        .parse::<i64>()
        .map_err(|_| invalid(section, key, format!("'{}' is not an integer", raw.trim())))
}

fn invalid(section: &str, key: &str, reason: String) -> TraderError {
    TraderError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason,
    }
}

fn strategy_names(config: &dyn ConfigPort) -> Result<Vec<String>, TraderError> {
    match config.get_string(TRADER_SECTION, "strategies") {
        Some(s) if !s.trim().is_empty() => parse_strategy_names(&s),
        _ => Err(TraderError::ConfigMissing {
            section: TRADER_SECTION.to_string(),
            key: "strategies".to_string(),
        }),
    }
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), TraderError> {
    let value = number(config, TRADER_SECTION, "initial_capital", 10_000.0)?;
    if value <= 0.0 {
        return Err(invalid(
            TRADER_SECTION,
            "initial_capital",
            "initial_capital must be positive".into(),
        ));
    }
    Ok(())
}

fn validate_max_leverage(config: &dyn ConfigPort) -> Result<(), TraderError> {
    let value = number(config, TRADER_SECTION, "max_leverage", DEFAULT_MAX_LEVERAGE)?;
    if value <= 0.0 {
        return Err(invalid(
            TRADER_SECTION,
            "max_leverage",
            "max_leverage must be positive".into(),
        ));
    }
    Ok(())
}

/// A fraction in `[0, 1)`.
fn validate_fraction(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<(), TraderError> {
    let value = number(config, section, key, default)?;
    if !(0.0..1.0).contains(&value) {
        return Err(invalid(section, key, format!("{key} must be in [0, 1)")));
    }
    Ok(())
}

fn validate_intervals(config: &dyn ConfigPort) -> Result<(), TraderError> {
    if integer(config, TRADER_SECTION, "update_interval", 60)? < 1 {
        return Err(invalid(
            TRADER_SECTION,
            "update_interval",
            "update_interval must be at least 1 second".into(),
        ));
    }
    if integer(config, TRADER_SECTION, "summary_interval", 3600)? < 0 {
        return Err(invalid(
            TRADER_SECTION,
            "summary_interval",
            "summary_interval must be non-negative".into(),
        ));
    }
    Ok(())
}

fn validate_candle_limit(config: &dyn ConfigPort) -> Result<(), TraderError> {
    let value = integer(config, TRADER_SECTION, "candle_limit", 300)?;
    if value < WARMUP_CANDLES as i64 {
        return Err(invalid(
            TRADER_SECTION,
            "candle_limit",
            format!("candle_limit must be at least {WARMUP_CANDLES}"),
        ));
    }
    Ok(())
}

fn require_value(config: &dyn ConfigPort, section: &str, key: &str) -> Result<(), TraderError> {
    match config.get_string(section, key) {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(TraderError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }),
    }
}

fn validate_timeframe(config: &dyn ConfigPort) -> Result<(), TraderError> {
    match config.get_string(TRADER_SECTION, "timeframe") {
        Some(s) if s.trim().is_empty() => Err(invalid(
            TRADER_SECTION,
            "timeframe",
            "timeframe must not be empty".into(),
        )),
        _ => Ok(()),
    }
}

fn validate_feed(config: &dyn ConfigPort) -> Result<(), TraderError> {
    match config.get_string(FEED_SECTION, "base_url") {
        Some(url) if !(url.starts_with("http://") || url.starts_with("https://")) => Err(invalid(
            FEED_SECTION,
            "base_url",
            "base_url must start with http:// or https://".into(),
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    const VALID: &str = r#"
[trader]
initial_capital = 10000
max_leverage = 5.0
max_drawdown = 0.15
max_daily_loss = 0.03
update_interval = 60
slippage = 0.001
fees = 0.001
strategies = ADA_RSI, SOL_STOCH

[ADA_RSI]
signal = rsi_reversal
symbol = ADA/USDT
leverage = 2.0
position_size = 0.25
stop_loss = 0.08
take_profit = 0.15
trailing_stop = 0.10

[SOL_STOCH]
signal = stoch_crossover
symbol = SOL/USDT
leverage = 2.0
position_size = 0.25
stop_loss = 0.08
take_profit = 0.12
trailing_stop = 0.10
"#;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    fn with(key_line: &str, replacement: &str) -> FileConfigAdapter {
        assert!(VALID.contains(key_line), "fixture lacks {key_line}");
        make_config(&VALID.replacen(key_line, replacement, 1))
    }

    #[test]
    fn valid_config_passes() {
        assert!(validate_trader_config(&make_config(VALID)).is_ok());
    }

    #[test]
    fn initial_capital_must_be_positive() {
        let err = validate_trader_config(&with("initial_capital = 10000", "initial_capital = 0"))
            .unwrap_err();
        assert!(matches!(err, TraderError::ConfigInvalid { key, .. } if key == "initial_capital"));
    }

    #[test]
    fn drawdown_must_be_a_fraction() {
        let err = validate_trader_config(&with("max_drawdown = 0.15", "max_drawdown = 1.5"))
            .unwrap_err();
        assert!(matches!(err, TraderError::ConfigInvalid { key, .. } if key == "max_drawdown"));
    }

    #[test]
    fn negative_slippage_fails() {
        let err =
            validate_trader_config(&with("slippage = 0.001", "slippage = -0.1")).unwrap_err();
        assert!(matches!(err, TraderError::ConfigInvalid { key, .. } if key == "slippage"));
    }

    #[test]
    fn update_interval_must_be_positive() {
        let err = validate_trader_config(&with("update_interval = 60", "update_interval = 0"))
            .unwrap_err();
        assert!(matches!(err, TraderError::ConfigInvalid { key, .. } if key == "update_interval"));
    }

    #[test]
    fn candle_limit_must_cover_warmup() {
        let config = make_config(&VALID.replace("[trader]\n", "[trader]\ncandle_limit = 20\n"));
        let err = validate_trader_config(&config).unwrap_err();
        assert!(matches!(err, TraderError::ConfigInvalid { key, .. } if key == "candle_limit"));
    }

    #[test]
    fn strategies_key_required() {
        let err = validate_trader_config(&with("strategies = ADA_RSI, SOL_STOCH", "")).unwrap_err();
        assert!(matches!(err, TraderError::ConfigMissing { key, .. } if key == "strategies"));
    }

    #[test]
    fn duplicate_strategy_names_rejected() {
        let err = validate_trader_config(&with(
            "strategies = ADA_RSI, SOL_STOCH",
            "strategies = ADA_RSI, ada_rsi",
        ))
        .unwrap_err();
        assert!(matches!(err, TraderError::ConfigInvalid { key, .. } if key == "strategies"));
    }

    #[test]
    fn leverage_above_max_rejected() {
        let err = validate_trader_config(&with("max_leverage = 5.0", "max_leverage = 1.5"))
            .unwrap_err();
        assert!(
            matches!(err, TraderError::ConfigInvalid { section, key, .. } if section == "ada_rsi" && key == "leverage")
        );
    }

    #[test]
    fn position_size_bounds() {
        let config = with("position_size = 0.25\nstop_loss = 0.08\ntake_profit = 0.15", "position_size = 1.5\nstop_loss = 0.08\ntake_profit = 0.15");
        let err = validate_trader_config(&config).unwrap_err();
        assert!(matches!(err, TraderError::ConfigInvalid { key, .. } if key == "position_size"));

        let config = with("position_size = 0.25\nstop_loss = 0.08\ntake_profit = 0.15", "position_size = 0\nstop_loss = 0.08\ntake_profit = 0.15");
        assert!(validate_trader_config(&config).is_err());

        let config = with("position_size = 0.25\nstop_loss = 0.08\ntake_profit = 0.15", "position_size = 1.0\nstop_loss = 0.08\ntake_profit = 0.15");
        assert!(validate_trader_config(&config).is_ok());
    }

    #[test]
    fn unknown_signal_rejected() {
        let err = validate_trader_config(&with("signal = rsi_reversal", "signal = macd_cross"))
            .unwrap_err();
        assert!(matches!(err, TraderError::ConfigInvalid { key, .. } if key == "signal"));
    }

    #[test]
    fn missing_strategy_section_reports_signal() {
        let err = validate_trader_config(&with(
            "strategies = ADA_RSI, SOL_STOCH",
            "strategies = ADA_RSI, XRP_ADX",
        ))
        .unwrap_err();
        assert!(
            matches!(err, TraderError::ConfigMissing { section, key } if section == "xrp_adx" && key == "signal")
        );
    }

    #[test]
    fn missing_symbol_rejected() {
        let err = validate_trader_config(&with("symbol = ADA/USDT\n", "")).unwrap_err();
        assert!(matches!(err, TraderError::ConfigMissing { key, .. } if key == "symbol"));
    }

    #[test]
    fn trailing_stop_must_be_below_one() {
        let err = validate_trader_config(&with("trailing_stop = 0.10\n\n[SOL", "trailing_stop = 1.0\n\n[SOL"))
            .unwrap_err();
        assert!(matches!(err, TraderError::ConfigInvalid { key, .. } if key == "trailing_stop"));
    }

    #[test]
    fn two_enabled_strategies_on_one_symbol_rejected() {
        let err = validate_trader_config(&with("symbol = SOL/USDT", "symbol = ada/usdt"))
            .unwrap_err();
        assert!(
            matches!(err, TraderError::ConfigInvalid { section, key, .. } if section == "sol_stoch" && key == "symbol")
        );

        let config = make_config(
            &VALID.replace("symbol = SOL/USDT", "symbol = ADA/USDT\nenabled = false"),
        );
        assert!(validate_trader_config(&config).is_ok());
    }

    #[test]
    fn malformed_numbers_rejected() {
        let err = validate_trader_config(&with("stop_loss = 0.08", "stop_loss = 8%")).unwrap_err();
        assert!(
            matches!(err, TraderError::ConfigInvalid { section, key, .. } if section == "ada_rsi" && key == "stop_loss")
        );

        let err = validate_trader_config(&with("leverage = 2.0", "leverage = 2x")).unwrap_err();
        assert!(matches!(err, TraderError::ConfigInvalid { key, .. } if key == "leverage"));

        let err = validate_trader_config(&with("leverage = 2.0", "leverage = NaN")).unwrap_err();
        assert!(matches!(err, TraderError::ConfigInvalid { key, .. } if key == "leverage"));

        let err = validate_trader_config(&with("max_drawdown = 0.15", "max_drawdown = inf"))
            .unwrap_err();
        assert!(matches!(err, TraderError::ConfigInvalid { key, .. } if key == "max_drawdown"));
    }

    #[test]
    fn malformed_integers_rejected() {
        let err = validate_trader_config(&with("update_interval = 60", "update_interval = 1m"))
            .unwrap_err();
        assert!(matches!(err, TraderError::ConfigInvalid { key, .. } if key == "update_interval"));

        let config = make_config(&VALID.replace("[trader]\n", "[trader]\ncandle_limit = 300.5\n"));
        let err = validate_trader_config(&config).unwrap_err();
        assert!(matches!(err, TraderError::ConfigInvalid { key, .. } if key == "candle_limit"));
    }

    #[test]
    fn padded_numbers_accepted() {
        let config = with("leverage = 2.0", "leverage =  2.0  ");
        assert!(validate_trader_config(&config).is_ok());
    }

    #[test]
    fn feed_url_scheme_checked() {
        let config = make_config(&format!("{VALID}\n[feed]\nbase_url = ftp://example.com\n"));
        let err = validate_trader_config(&config).unwrap_err();
        assert!(matches!(err, TraderError::ConfigInvalid { key, .. } if key == "base_url"));
    }
}
