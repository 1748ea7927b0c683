use crate::domain::errors::NotificationError;
use crate::domain::market::candle::CandleSeries;
use crate::domain::market::timeframe::Timeframe;
use async_trait::async_trait;

/// Parameters of one klines request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandleQuery {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub limit: usize,
    /// Inclusive lower bound on `open_time` (ms)
    pub start_time: Option<i64>,
    /// Inclusive upper bound on `open_time` (ms)
    pub end_time: Option<i64>,
}

impl CandleQuery {
    pub fn latest(symbol: impl Into<String>, timeframe: Timeframe, limit: usize) -> Self {
        Self {
            symbol: symbol.into(),
            timeframe,
            limit,
            start_time: None,
            end_time: None,
        }
    }

    pub fn starting_at(mut self, start_time: i64) -> Self {
        self.start_time = Some(start_time);
        self
    }
}

/// Source of historical candles.
///
/// Implementations never fail: transport or decoding problems are logged and
/// reported as an empty series, which the signal engine treats as NO_SIGNAL.
#[async_trait]
pub trait CandleSource: Send + Sync {
    async fn fetch_candles(&self, query: &CandleQuery) -> CandleSeries;
}

#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn send(&self, message: &str) -> Result<(), NotificationError>;
}
