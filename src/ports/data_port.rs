//! Market data port trait.

use chrono::{DateTime, Utc};

use crate::domain::candle::Candle;
use crate::domain::error::TraderError;

pub trait MarketDataPort {
    /// Most recent `limit` candles for `symbol` at `timeframe`, oldest first.
    fn fetch_candles(
        &self,
        symbol: &str,
        timeframe: &str,
        limit: usize,
    ) -> Result<Vec<Candle>, TraderError>;
}

/// Historical data replayed against a moving clock.
pub trait ReplayFeedPort: MarketDataPort {
    /// Every distinct candle timestamp, in order.
    fn timeline(&self) -> Vec<DateTime<Utc>>;
    /// Hide candles after `now` from `fetch_candles`.
    fn advance_to(&self, now: DateTime<Utc>);
}
