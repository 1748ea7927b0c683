//! Binance klines source
//!
//! Fetches historical candles from the public REST endpoint and turns them
//! into validated `CandleSeries`. Failures never reach the caller: they are
//! logged and reported as an empty series.

use crate::domain::errors::MarketDataError;
use crate::domain::market::candle::{Candle, CandleSeries};
use crate::domain::ports::{CandleQuery, CandleSource};
use crate::infrastructure::core::http_client_factory::{HttpClientFactory, build_url_with_query};
use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "https://api.binance.com";

/// Binance accepts at most this many klines per request
const MAX_LIMIT: usize = 1000;

pub struct BinanceCandleSource {
    client: ClientWithMiddleware,
    base_url: String,
}

impl BinanceCandleSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(HttpClientFactory::create_client(), base_url)
    }

    pub fn with_client(client: ClientWithMiddleware, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn request_klines(&self, query: &CandleQuery) -> Result<Vec<Value>, MarketDataError> {
        let endpoint = format!("{}/api/v3/klines", self.base_url);
        let api_symbol = api_symbol(&query.symbol);
        let limit = query.limit.clamp(1, MAX_LIMIT).to_string();

        let mut params = vec![
            ("symbol", api_symbol),
            ("interval", query.timeframe.label().to_string()),
            ("limit", limit),
        ];
        if let Some(start) = query.start_time {
            params.push(("startTime", start.to_string()));
        }
        if let Some(end) = query.end_time {
            params.push(("endTime", end.to_string()));
        }

        let url = build_url_with_query(&endpoint, &params).map_err(|e| {
            MarketDataError::Transport {
                endpoint: endpoint.clone(),
                reason: e.to_string(),
            }
        })?;

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| MarketDataError::Transport {
                endpoint: endpoint.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MarketDataError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<Vec<Value>>()
            .await
            .map_err(|e| MarketDataError::Decode {
                symbol: query.symbol.clone(),
                reason: e.to_string(),
            })
    }
}

#[async_trait]
impl CandleSource for BinanceCandleSource {
    async fn fetch_candles(&self, query: &CandleQuery) -> CandleSeries {
        let decoded = match self.request_klines(query).await {
            Ok(klines) => decode_klines(&query.symbol, &klines).and_then(|candles| {
                CandleSeries::new(query.symbol.clone(), query.timeframe, candles).map_err(|e| {
                    MarketDataError::Decode {
                        symbol: query.symbol.clone(),
                        reason: e.to_string(),
                    }
                })
            }),
            Err(e) => Err(e),
        };

        match decoded {
            Ok(series) => {
                debug!(
                    "BinanceCandleSource: fetched {} {} bars for {}",
                    series.len(),
                    query.timeframe,
                    query.symbol
                );
                series
            }
            Err(e) => {
                warn!(
                    "BinanceCandleSource: failed to fetch klines {} {}: {}",
                    query.symbol, query.timeframe, e
                );
                CandleSeries::empty(query.symbol.clone(), query.timeframe)
            }
        }
    }
}

/// "BTC/USDT" -> "BTCUSDT"
fn api_symbol(symbol: &str) -> String {
    symbol.replace('/', "").to_uppercase()
}

/// Decodes `[open_time, open, high, low, close, volume, close_time, ...]` rows.
///
/// Prices and volume arrive as numeric strings.
pub fn decode_klines(symbol: &str, klines: &[Value]) -> Result<Vec<Candle>, MarketDataError> {
    klines
        .iter()
        .map(|kline| decode_kline(kline).ok_or_else(|| MarketDataError::Decode {
            symbol: symbol.to_string(),
            reason: format!("malformed kline: {}", kline),
        }))
        .collect()
}

fn decode_kline(kline: &Value) -> Option<Candle> {
    let arr = kline.as_array()?;
    if arr.len() < 7 {
        return None;
    }

    let decimal = |value: &Value| -> Option<Decimal> {
        match value {
            Value::String(s) => s.parse::<Decimal>().ok(),
            Value::Number(n) => n.to_string().parse::<Decimal>().ok(),
            _ => None,
        }
    };

    Some(Candle {
        open_time: arr[0].as_i64()?,
        open: decimal(&arr[1])?,
        high: decimal(&arr[2])?,
        low: decimal(&arr[3])?,
        close: decimal(&arr[4])?,
        volume: decimal(&arr[5])?,
        close_time: arr[6].as_i64()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_decode_klines() {
        let klines = vec![
            json!([1704067200000i64, "42000.10", "42100.00", "41950.5", "42050.00", "12.5",
                1704067259999i64, "525000.0", 100, "6.1", "256000.0", "0"]),
            json!([1704067260000i64, "42050.00", "42080.00", "42000.0", "42010.00", "3",
                1704067319999i64, "126000.0", 40, "1.0", "42000.0", "0"]),
        ];

        let candles = decode_klines("BTCUSDT", &klines).unwrap();

        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].open_time, 1704067200000);
        assert_eq!(candles[0].close_time, 1704067259999);
        assert_eq!(candles[0].open, dec!(42000.10));
        assert_eq!(candles[0].low, dec!(41950.5));
        assert_eq!(candles[1].close, dec!(42010.00));
        assert_eq!(candles[1].volume, dec!(3));
    }

    #[test]
    fn test_decode_rejects_short_rows() {
        let klines = vec![json!([1704067200000i64, "1", "1", "1"])];
        let err = decode_klines("BTCUSDT", &klines).unwrap_err();
        assert!(matches!(err, MarketDataError::Decode { .. }));
    }

    #[test]
    fn test_decode_rejects_non_numeric_price() {
        let klines = vec![json!([0, "abc", "1", "1", "1", "1", 59999])];
        assert!(decode_klines("BTCUSDT", &klines).is_err());
    }

    #[test]
    fn test_api_symbol_strips_separator() {
        assert_eq!(api_symbol("BTC/USDT"), "BTCUSDT");
        assert_eq!(api_symbol("ethusdt"), "ETHUSDT");
    }

    #[tokio::test]
    async fn test_unreachable_host_yields_empty_series() {
        let client =
            HttpClientFactory::create_client_with(0, std::time::Duration::from_millis(200));
        let source = BinanceCandleSource::with_client(client, "http://127.0.0.1:9");
        let query = CandleQuery::latest("BTCUSDT", crate::domain::market::Timeframe::OneMin, 5);

        let series = source.fetch_candles(&query).await;

        assert!(series.is_empty());
        assert_eq!(series.symbol(), "BTCUSDT");
    }
}
