use crate::domain::errors::CandleSeriesError;
use crate::domain::market::timeframe::Timeframe;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One OHLCV bar. Timestamps are Unix milliseconds; `open_time` marks the
/// start of the interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open_time: i64,
    pub close_time: i64,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

impl Candle {
    /// Checks the OHLC envelope: positive prices, `high >= max(open, close)`,
    /// `min(open, close) >= low` and non-negative volume.
    pub fn validate(&self) -> Result<(), CandleSeriesError> {
        let invalid = |reason: &str| CandleSeriesError::InvalidCandle {
            open_time: self.open_time,
            reason: reason.to_string(),
        };

        if self.open <= Decimal::ZERO
            || self.high <= Decimal::ZERO
            || self.low <= Decimal::ZERO
            || self.close <= Decimal::ZERO
        {
            return Err(invalid("prices must be positive"));
        }
        if self.high < self.open.max(self.close) {
            return Err(invalid("high below open/close"));
        }
        if self.low > self.open.min(self.close) {
            return Err(invalid("low above open/close"));
        }
        if self.volume < Decimal::ZERO {
            return Err(invalid("negative volume"));
        }
        if self.close_time < self.open_time {
            return Err(invalid("close_time before open_time"));
        }
        Ok(())
    }
}

/// Candles for one (symbol, timeframe) pair, strictly ascending by `open_time`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandleSeries {
    symbol: String,
    timeframe: Timeframe,
    candles: Vec<Candle>,
}

impl CandleSeries {
    /// Builds a series, rejecting malformed candles and non-increasing open times.
    pub fn new(
        symbol: impl Into<String>,
        timeframe: Timeframe,
        candles: Vec<Candle>,
    ) -> Result<Self, CandleSeriesError> {
        let mut previous: Option<i64> = None;
        for candle in &candles {
            candle.validate()?;
            if let Some(prev) = previous.filter(|prev| candle.open_time <= *prev) {
                return Err(CandleSeriesError::OutOfOrder {
                    previous: prev,
                    current: candle.open_time,
                });
            }
            previous = Some(candle.open_time);
        }

        Ok(Self {
            symbol: symbol.into(),
            timeframe,
            candles,
        })
    }

    pub fn empty(symbol: impl Into<String>, timeframe: Timeframe) -> Self {
        Self {
            symbol: symbol.into(),
            timeframe,
            candles: Vec::new(),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }

    /// Sliding-window append used by live polling.
    ///
    /// Candles not newer than the current last candle are skipped and the rest
    /// are validated, then appended, then the oldest candles are dropped so that
    /// at most `max_len` remain. Returns the number of candles appended.
    ///
    /// The batch is all-or-nothing: one invalid candle leaves the series as it
    /// was. Trimming shifts the retained candles, which stays cheap for windows
    /// of a few hundred bars.
    pub fn append_window(
        &mut self,
        incoming: impl IntoIterator<Item = Candle>,
        max_len: usize,
    ) -> Result<usize, CandleSeriesError> {
        let mut staged: Vec<Candle> = Vec::new();
        for candle in incoming {
            let newest = staged.last().or(self.candles.last());
            if newest.is_some_and(|last| candle.open_time <= last.open_time) {
                continue;
            }
            candle.validate()?;
            staged.push(candle);
        }

        let appended = staged.len();
        self.candles.extend(staged);
        if self.candles.len() > max_len {
            let excess = self.candles.len() - max_len;
            self.candles.drain(..excess);
        }
        Ok(appended)
    }
}

/// Binary search for the last element whose key is `<= timestamp`.
pub(crate) fn latest_index_at<T>(
    items: &[T],
    timestamp: i64,
    key: impl Fn(&T) -> i64,
) -> Option<usize> {
    let count = items.partition_point(|item| key(item) <= timestamp);
    count.checked_sub(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn candle(open_time: i64, close: Decimal) -> Candle {
        Candle {
            open_time,
            close_time: open_time + 59_999,
            open: close,
            high: close + dec!(1),
            low: close - dec!(1),
            close,
            volume: dec!(10),
        }
    }

    #[test]
    fn test_new_series_accepts_ordered_candles() {
        let series = CandleSeries::new(
            "BTCUSDT",
            Timeframe::OneMin,
            vec![candle(0, dec!(100)), candle(60_000, dec!(101))],
        )
        .unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(series.symbol(), "BTCUSDT");
        assert_eq!(series.timeframe(), Timeframe::OneMin);
    }

    #[test]
    fn test_new_series_rejects_duplicate_open_time() {
        let err = CandleSeries::new(
            "BTCUSDT",
            Timeframe::OneMin,
            vec![candle(60_000, dec!(100)), candle(60_000, dec!(101))],
        )
        .unwrap_err();

        assert_eq!(
            err,
            CandleSeriesError::OutOfOrder {
                previous: 60_000,
                current: 60_000
            }
        );
    }

    #[test]
    fn test_new_series_rejects_high_below_low() {
        let mut bad = candle(0, dec!(100));
        bad.high = dec!(98);

        let err = CandleSeries::new("BTCUSDT", Timeframe::OneMin, vec![bad]).unwrap_err();
        assert!(matches!(err, CandleSeriesError::InvalidCandle { .. }));
    }

    #[test]
    fn test_latest_index_at() {
        let candles = vec![
            candle(0, dec!(100)),
            candle(60_000, dec!(101)),
            candle(120_000, dec!(102)),
        ];
        let open_time = |c: &Candle| c.open_time;

        assert_eq!(latest_index_at(&candles, -1, open_time), None);
        assert_eq!(latest_index_at(&candles, 0, open_time), Some(0));
        assert_eq!(latest_index_at(&candles, 90_000, open_time), Some(1));
        assert_eq!(latest_index_at(&candles, 10_000_000, open_time), Some(2));
        assert_eq!(latest_index_at(&[] as &[Candle], 0, open_time), None);
    }

    #[test]
    fn test_append_window_skips_stale_and_trims() {
        let mut series = CandleSeries::new(
            "BTCUSDT",
            Timeframe::OneMin,
            vec![candle(0, dec!(100)), candle(60_000, dec!(101))],
        )
        .unwrap();

        let appended = series
            .append_window(
                vec![
                    candle(60_000, dec!(999)),
                    candle(120_000, dec!(102)),
                    candle(180_000, dec!(103)),
                ],
                3,
            )
            .unwrap();

        assert_eq!(appended, 2);
        assert_eq!(series.len(), 3);
        assert_eq!(series.candles()[0].open_time, 60_000);
        assert_eq!(series.candles()[0].close, dec!(101));
        assert_eq!(series.last().unwrap().open_time, 180_000);
    }

    #[test]
    fn test_append_window_rejects_whole_batch_on_invalid_candle() {
        let mut series = CandleSeries::new(
            "BTCUSDT",
            Timeframe::OneMin,
            vec![candle(0, dec!(100)), candle(60_000, dec!(101))],
        )
        .unwrap();
        let before = series.clone();

        let mut bad = candle(180_000, dec!(103));
        bad.high = dec!(90);
        let err = series
            .append_window(vec![candle(120_000, dec!(102)), bad], 2)
            .unwrap_err();

        assert!(matches!(err, CandleSeriesError::InvalidCandle { open_time: 180_000, .. }));
        assert_eq!(series, before);
        assert!(series.len() <= 2);
    }

    #[test]
    fn test_append_window_skips_out_of_order_within_batch() {
        let mut series = CandleSeries::empty("BTCUSDT", Timeframe::OneMin);

        let appended = series
            .append_window(
                vec![
                    candle(60_000, dec!(101)),
                    candle(0, dec!(100)),
                    candle(120_000, dec!(102)),
                ],
                10,
            )
            .unwrap();

        assert_eq!(appended, 2);
        let times: Vec<i64> = series.candles().iter().map(|c| c.open_time).collect();
        assert_eq!(times, vec![60_000, 120_000]);
    }
}
