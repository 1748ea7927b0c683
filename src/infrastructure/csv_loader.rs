//! Offline candle datasets
//!
//! One CSV file per timeframe, named after the exchange label (`1m.csv`,
//! `15m.csv`, ...), with at least the columns
//! `open_time, open, high, low, close, volume, close_time`. Extra columns are
//! ignored. Timestamps may be epoch milliseconds, `YYYY-MM-DD HH:MM:SS` (UTC)
//! or RFC 3339.

use crate::domain::market::candle::{Candle, CandleSeries};
use crate::domain::market::timeframe::Timeframe;
use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, NaiveDateTime};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::info;

#[derive(Debug, Deserialize)]
struct CandleRecord {
    open_time: String,
    open: String,
    high: String,
    low: String,
    close: String,
    volume: String,
    close_time: String,
}

impl CandleRecord {
    fn into_candle(self) -> Result<Candle> {
        Ok(Candle {
            open_time: parse_timestamp_ms(&self.open_time)?,
            close_time: parse_timestamp_ms(&self.close_time)?,
            open: parse_decimal("open", &self.open)?,
            high: parse_decimal("high", &self.high)?,
            low: parse_decimal("low", &self.low)?,
            close: parse_decimal("close", &self.close)?,
            volume: parse_decimal("volume", &self.volume)?,
        })
    }
}

fn parse_decimal(field: &str, raw: &str) -> Result<Decimal> {
    let trimmed = raw.trim();
    trimmed
        .parse::<Decimal>()
        .or_else(|_| Decimal::from_scientific(trimmed))
        .with_context(|| format!("Invalid {} value: {:?}", field, raw))
}

/// Parses a timestamp into epoch milliseconds (UTC).
pub fn parse_timestamp_ms(raw: &str) -> Result<i64> {
    let raw = raw.trim();
    if let Ok(ms) = raw.parse::<i64>() {
        return Ok(ms);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.timestamp_millis());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
        .map(|dt| dt.and_utc().timestamp_millis())
        .map_err(|_| anyhow!("Unrecognized timestamp: {:?}", raw))
}

/// Loads one series from `path`. The resulting series is validated.
pub fn load_series_csv(
    path: impl AsRef<Path>,
    symbol: &str,
    timeframe: Timeframe,
) -> Result<CandleSeries> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(BufReader::new(file));

    let mut candles = Vec::new();
    for (line, result) in reader.deserialize::<CandleRecord>().enumerate() {
        let record =
            result.with_context(|| format!("{}: malformed row {}", path.display(), line + 1))?;
        let candle = record
            .into_candle()
            .with_context(|| format!("{}: row {}", path.display(), line + 1))?;
        candles.push(candle);
    }

    CandleSeries::new(symbol, timeframe, candles)
        .with_context(|| format!("{}: invalid candle sequence", path.display()))
}

/// Loads `{dir}/{label}.csv` for every requested timeframe.
pub fn load_dataset_dir(
    dir: impl AsRef<Path>,
    symbol: &str,
    timeframes: &[Timeframe],
) -> Result<BTreeMap<Timeframe, CandleSeries>> {
    let dir = dir.as_ref();
    let mut data = BTreeMap::new();
    for &timeframe in timeframes {
        let path = dir.join(format!("{}.csv", timeframe.label()));
        let series = load_series_csv(&path, symbol, timeframe)?;
        info!(
            "Loaded {} {} candles for {} from {}",
            series.len(),
            timeframe,
            symbol,
            path.display()
        );
        data.insert(timeframe, series);
    }
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::path::PathBuf;

    fn temp_file(name: &str, contents: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("mtfsignal-csv-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_parse_timestamp_formats() {
        assert_eq!(parse_timestamp_ms("1704067200000").unwrap(), 1704067200000);
        assert_eq!(
            parse_timestamp_ms("2024-01-01 00:00:00").unwrap(),
            1704067200000
        );
        assert_eq!(
            parse_timestamp_ms("2024-01-01 00:00:59.999").unwrap(),
            1704067259999
        );
        assert_eq!(
            parse_timestamp_ms("2024-01-01T01:00:00+01:00").unwrap(),
            1704067200000
        );
        assert!(parse_timestamp_ms("yesterday").is_err());
    }

    #[test]
    fn test_load_series_with_extra_columns() {
        let path = temp_file(
            "extra_columns.csv",
            "open_time,open,high,low,close,volume,close_time,number_of_trades\n\
             2024-01-01 00:00:00,100.5,101,100,100.8,12.25,2024-01-01 00:00:59.999,42\n\
             2024-01-01 00:01:00,100.8,102,100.7,101.9,8,2024-01-01 00:01:59.999,17\n",
        );

        let series = load_series_csv(&path, "BTCUSDT", Timeframe::OneMin).unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(series.symbol(), "BTCUSDT");
        assert_eq!(series.candles()[0].open, dec!(100.5));
        assert_eq!(series.candles()[1].open_time, 1704067260000);
        assert_eq!(series.candles()[1].volume, dec!(8));
    }

    #[test]
    fn test_load_series_rejects_out_of_order_rows() {
        let path = temp_file(
            "out_of_order.csv",
            "open_time,open,high,low,close,volume,close_time\n\
             120000,1,1,1,1,1,179999\n\
             60000,1,1,1,1,1,119999\n",
        );

        let err = load_series_csv(&path, "BTCUSDT", Timeframe::OneMin).unwrap_err();
        assert!(format!("{:#}", err).contains("out of order"));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = load_series_csv("/nonexistent/1m.csv", "BTCUSDT", Timeframe::OneMin);
        assert!(result.is_err());
    }
}
