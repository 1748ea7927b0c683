use crate::domain::errors::NotificationError;
use crate::domain::market::candle::{Candle, CandleSeries};
use crate::domain::market::timeframe::Timeframe;
use crate::domain::ports::{AlertSink, CandleQuery, CandleSource};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// In-memory candle source answering queries the way the klines endpoint
/// does: with a start time, the first `limit` candles from it; otherwise the
/// most recent `limit`.
#[derive(Clone, Default)]
pub struct MockCandleSource {
    candles: Arc<RwLock<HashMap<(String, Timeframe), Vec<Candle>>>>,
    requests: Arc<RwLock<Vec<CandleQuery>>>,
}

impl MockCandleSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the stored candles for the series' symbol and timeframe.
    pub async fn set_series(&self, series: &CandleSeries) {
        let key = (series.symbol().to_string(), series.timeframe());
        self.candles
            .write()
            .await
            .insert(key, series.candles().to_vec());
    }

    /// Appends a newly closed candle.
    pub async fn push_candle(&self, symbol: &str, timeframe: Timeframe, candle: Candle) {
        self.candles
            .write()
            .await
            .entry((symbol.to_string(), timeframe))
            .or_default()
            .push(candle);
    }

    /// Every query received so far, in order.
    pub async fn requests(&self) -> Vec<CandleQuery> {
        self.requests.read().await.clone()
    }
}

#[async_trait]
impl CandleSource for MockCandleSource {
    async fn fetch_candles(&self, query: &CandleQuery) -> CandleSeries {
        self.requests.write().await.push(query.clone());

        let store = self.candles.read().await;
        let key = (query.symbol.clone(), query.timeframe);
        let Some(all) = store.get(&key) else {
            return CandleSeries::empty(query.symbol.clone(), query.timeframe);
        };

        let in_range: Vec<&Candle> = all
            .iter()
            .filter(|c| query.start_time.is_none_or(|start| c.open_time >= start))
            .filter(|c| query.end_time.is_none_or(|end| c.open_time <= end))
            .collect();
        let selected: Vec<Candle> = if query.start_time.is_some() {
            in_range.into_iter().take(query.limit).cloned().collect()
        } else {
            let skip = in_range.len().saturating_sub(query.limit);
            in_range.into_iter().skip(skip).cloned().collect()
        };

        debug!(
            "MockCandleSource: {} {} -> {} candles",
            query.symbol,
            query.timeframe,
            selected.len()
        );
        CandleSeries::new(query.symbol.clone(), query.timeframe, selected)
            .unwrap_or_else(|_| CandleSeries::empty(query.symbol.clone(), query.timeframe))
    }
}

/// Alert sink that records every message, optionally failing each delivery.
#[derive(Clone, Default)]
pub struct RecordingAlertSink {
    messages: Arc<RwLock<Vec<String>>>,
    fail: bool,
}

impl RecordingAlertSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink that records messages but reports every delivery as rejected.
    pub fn failing() -> Self {
        Self {
            messages: Arc::default(),
            fail: true,
        }
    }

    pub async fn messages(&self) -> Vec<String> {
        self.messages.read().await.clone()
    }
}

#[async_trait]
impl AlertSink for RecordingAlertSink {
    async fn send(&self, message: &str) -> Result<(), NotificationError> {
        self.messages.write().await.push(message.to_string());
        if self.fail {
            return Err(NotificationError::Rejected { status: 500 });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn candle(minute: i64) -> Candle {
        Candle {
            open_time: minute * 60_000,
            close_time: minute * 60_000 + 59_999,
            open: dec!(10),
            high: dec!(11),
            low: dec!(9),
            close: dec!(10),
            volume: dec!(1),
        }
    }

    #[test]
    fn test_mock_source_latest_and_starting_at() {
        tokio_test::block_on(async {
            let source = MockCandleSource::new();
            for minute in 0..10 {
                source.push_candle("BTCUSDT", Timeframe::OneMin, candle(minute)).await;
            }

            let latest = source
                .fetch_candles(&CandleQuery::latest("BTCUSDT", Timeframe::OneMin, 3))
                .await;
            assert_eq!(latest.len(), 3);
            assert_eq!(latest.candles()[0].open_time, 7 * 60_000);

            let query = CandleQuery::latest("BTCUSDT", Timeframe::OneMin, 2).starting_at(60_001);
            let from = source.fetch_candles(&query).await;
            assert_eq!(from.len(), 2);
            assert_eq!(from.candles()[0].open_time, 2 * 60_000);

            let missing = source
                .fetch_candles(&CandleQuery::latest("ETHUSDT", Timeframe::OneMin, 3))
                .await;
            assert!(missing.is_empty());
            assert_eq!(source.requests().await.len(), 3);
        });
    }

    #[test]
    fn test_failing_sink_records_and_errors() {
        tokio_test::block_on(async {
            let sink = RecordingAlertSink::failing();
            assert!(sink.send("alert").await.is_err());
            assert_eq!(sink.messages().await, vec!["alert".to_string()]);
        });
    }
}
