//! The trading loop: fetch, enrich, evaluate and manage positions per tick.

use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Instant;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::domain::config::{StrategyConfig, TraderConfig};
use crate::domain::error::TraderError;
use crate::domain::execution::{FillModel, SimulatedFill};
use crate::domain::indicator_row::{WARMUP_CANDLES, compute_indicators};
use crate::domain::ledger::CapitalLedger;
use crate::domain::metrics::Summary;
use crate::domain::position_manager::{PositionManager, TickAction};
use crate::domain::risk::RiskGovernor;
use crate::domain::signal::Signal;
use crate::ports::data_port::{MarketDataPort, ReplayFeedPort};
use crate::ports::ledger_port::TradeLedgerPort;

pub struct Trader<'a> {
    config: TraderConfig,
    manager: PositionManager,
    ledger: CapitalLedger,
    risk: RiskGovernor,
    feed: &'a dyn MarketDataPort,
    trade_log: &'a mut dyn TradeLedgerPort,
}

impl<'a> Trader<'a> {
    pub fn new(
        config: TraderConfig,
        fill_model: Box<dyn FillModel>,
        feed: &'a dyn MarketDataPort,
        trade_log: &'a mut dyn TradeLedgerPort,
        now: DateTime<Utc>,
    ) -> Self {
        let ledger = CapitalLedger::new(config.initial_capital);
        let risk = RiskGovernor::new(
            config.max_drawdown,
            config.max_daily_loss,
            config.initial_capital,
            now,
        );
        Trader {
            config,
            manager: PositionManager::new(fill_model),
            ledger,
            risk,
            feed,
            trade_log,
        }
    }

    /// A trader filling orders with the configured slippage and fee rate.
    pub fn simulated(
        config: TraderConfig,
        feed: &'a dyn MarketDataPort,
        trade_log: &'a mut dyn TradeLedgerPort,
        now: DateTime<Utc>,
    ) -> Self {
        let fill_model = SimulatedFill {
            slippage: config.slippage,
            fee_rate: config.fees,
        };
        Self::new(config, Box::new(fill_model), feed, trade_log, now)
    }

    pub fn config(&self) -> &TraderConfig {
        &self.config
    }

    pub fn ledger(&self) -> &CapitalLedger {
        &self.ledger
    }

    pub fn positions(&self) -> &PositionManager {
        &self.manager
    }

    pub fn summary(&self) -> Summary {
        Summary::compute(&self.ledger, self.manager.open_count())
    }

    /// Run every enabled strategy once, in configuration order.
    ///
    /// A failing strategy is logged and skipped; the others still run.
    /// Returns the action taken by each strategy that completed.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Vec<(String, TickAction)> {
        self.risk.observe(self.ledger.capital, now);

        let strategies: Vec<StrategyConfig> = self.config.enabled_strategies().cloned().collect();
        let mut actions = Vec::with_capacity(strategies.len());
        let mut block_logged = false;

        for strategy in &strategies {
            let (signal, price) = match self.evaluate(strategy) {
                Ok(evaluated) => evaluated,
                Err(e @ TraderError::InsufficientData { .. }) => {
                    debug!(strategy = %strategy.name, symbol = %strategy.symbol, "{e}");
                    continue;
                }
                Err(e) => {
                    warn!(strategy = %strategy.name, symbol = %strategy.symbol, "skipping tick: {e}");
                    continue;
                }
            };

            let action = match self.manager.on_tick(
                strategy,
                signal,
                price,
                now,
                &mut self.ledger,
                &mut self.risk,
            ) {
                Ok(action) => action,
                Err(e) => {
                    error!(strategy = %strategy.name, symbol = %strategy.symbol, price, "order failed: {e}");
                    continue;
                }
            };

            match &action {
                TickAction::Opened(position) => info!(
                    strategy = %strategy.name,
                    symbol = %strategy.symbol,
                    price = position.entry_price,
                    amount = position.amount,
                    stop_loss = position.stop_loss,
                    take_profit = position.take_profit,
                    "opened position"
                ),
                TickAction::Closed(record) => {
                    info!(
                        strategy = %record.strategy,
                        symbol = %record.symbol,
                        price = record.exit_price,
                        reason = %record.reason,
                        pnl_pct = record.pnl_pct,
                        pnl_usd = record.pnl_usd,
                        capital = self.ledger.capital,
                        "closed position"
                    );
                    if let Err(e) = self.trade_log.append(record) {
                        error!(strategy = %record.strategy, "failed to persist trade: {e}");
                    }
                }
                TickAction::EntryBlocked(block) => {
                    if !block_logged {
                        warn!(strategy = %strategy.name, symbol = %strategy.symbol, "entries blocked: {block}");
                        block_logged = true;
                    }
                }
                TickAction::Holding | TickAction::Idle => {}
            }

            actions.push((strategy.name.clone(), action));
        }

        actions
    }

    fn evaluate(&self, strategy: &StrategyConfig) -> Result<(Signal, f64), TraderError> {
        let candles = self.feed.fetch_candles(
            &strategy.symbol,
            &self.config.timeframe,
            self.config.candle_limit,
        )?;
        if candles.len() < WARMUP_CANDLES {
            return Err(TraderError::InsufficientData {
                symbol: strategy.symbol.clone(),
                bars: candles.len(),
                minimum: WARMUP_CANDLES,
            });
        }

        let rows = compute_indicators(&candles);
        let signal = strategy.signal.evaluate(&rows);
        let price = rows.last().map(|r| r.candle.close).unwrap_or_default();
        Ok((signal, price))
    }

    /// Poll until `shutdown` fires, then drain.
    pub fn run(&mut self, shutdown: &Receiver<()>) -> Result<Summary, TraderError> {
        info!(
            strategies = self.config.enabled_strategies().count(),
            capital = self.ledger.capital,
            interval_secs = self.config.update_interval.as_secs(),
            "trader started"
        );

        let mut last_summary = Instant::now();
        loop {
            self.tick(Utc::now());

            let every = self.config.summary_interval;
            if !every.is_zero() && last_summary.elapsed() >= every {
                info!("performance summary\n{}", self.summary());
                last_summary = Instant::now();
            }

            match shutdown.recv_timeout(self.config.update_interval) {
                Err(RecvTimeoutError::Timeout) => continue,
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        info!("stopping trader");
        self.drain()
    }

    /// Step through every timestamp of the replay feed, then drain.
    pub fn run_replay(&mut self, feed: &dyn ReplayFeedPort) -> Result<Summary, TraderError> {
        let timeline = feed.timeline();
        info!(steps = timeline.len(), "replaying candles");

        for now in timeline {
            feed.advance_to(now);
            self.tick(now);
        }

        self.drain()
    }

    /// Log the final summary and flush the trade ledger. Open positions stay open.
    pub fn drain(&mut self) -> Result<Summary, TraderError> {
        let summary = self.summary();
        info!("final summary\n{summary}");
        self.trade_log.flush()?;
        Ok(summary)
    }
}
