//! Technical indicators over a candle series
//!
//! Every function is pure and returns a series aligned index-for-index with its
//! input. Values that need more history than is available are `f64::NAN`, and
//! NaN makes every downstream comparison false.

use crate::domain::config::IndicatorPeriods;
use crate::domain::market::candle::{Candle, CandleSeries};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use ta::Next;
use ta::indicators::{ExponentialMovingAverage, SimpleMovingAverage, TrueRange};

/// A candle with its derived indicator values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorRow {
    pub candle: Candle,
    pub close: f64,
    pub volume: f64,
    pub ema_fast: f64,
    pub ema_mid: f64,
    pub ema_slow: f64,
    pub ema_trend: f64,
    pub rsi: f64,
    pub atr: f64,
    pub volume_avg: f64,
}

struct Bar {
    high: f64,
    low: f64,
    close: f64,
}

impl ta::High for Bar {
    fn high(&self) -> f64 {
        self.high
    }
}

impl ta::Low for Bar {
    fn low(&self) -> f64 {
        self.low
    }
}

impl ta::Close for Bar {
    fn close(&self) -> f64 {
        self.close
    }
}

fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(f64::NAN)
}

/// Exponential moving average with α = 2 / (span + 1), seeded with the first value.
pub fn ema(values: &[f64], span: usize) -> Vec<f64> {
    let Ok(mut indicator) = ExponentialMovingAverage::new(span) else {
        return vec![f64::NAN; values.len()];
    };
    values.iter().map(|&value| indicator.next(value)).collect()
}

/// Mean of the trailing `period` values; NaN for the first `period - 1` rows.
pub fn rolling_mean(values: &[f64], period: usize) -> Vec<f64> {
    let Ok(mut indicator) = SimpleMovingAverage::new(period) else {
        return vec![f64::NAN; values.len()];
    };
    let means = values.iter().map(|&value| indicator.next(value)).collect();
    with_warmup(means, period)
}

/// Relative Strength Index over a simple trailing window of `period` close diffs.
///
/// The first `period` rows are NaN. A window without losses yields exactly 100.
pub fn rsi(closes: &[f64], period: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; closes.len()];
    if period == 0 {
        return out;
    }

    // diffs[j] is the change into row j + 1
    let diffs: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();
    let gains: Vec<f64> = diffs.iter().map(|d| d.max(0.0)).collect();
    let losses: Vec<f64> = diffs.iter().map(|d| (-d).max(0.0)).collect();
    let avg_gains = rolling_mean(&gains, period);
    let avg_losses = rolling_mean(&losses, period);

    for (j, (&avg_gain, &avg_loss)) in avg_gains.iter().zip(&avg_losses).enumerate() {
        out[j + 1] = if avg_gain.is_nan() || avg_loss.is_nan() {
            f64::NAN
        } else if avg_loss == 0.0 {
            100.0
        } else {
            let rs = avg_gain / avg_loss;
            100.0 - 100.0 / (1.0 + rs)
        };
    }
    out
}

/// True range per row: the first row uses `high - low` only.
pub fn true_range(high: &[f64], low: &[f64], close: &[f64]) -> Vec<f64> {
    let mut indicator = TrueRange::new();
    high.iter()
        .zip(low)
        .zip(close)
        .map(|((&high, &low), &close)| indicator.next(&Bar { high, low, close }))
        .collect()
}

/// Average True Range as a simple rolling mean of the true range.
pub fn atr(high: &[f64], low: &[f64], close: &[f64], period: usize) -> Vec<f64> {
    rolling_mean(&true_range(high, low, close), period)
}

pub fn volume_avg(volumes: &[f64], period: usize) -> Vec<f64> {
    rolling_mean(volumes, period)
}

/// Masks the first `period - 1` values so a reading only counts once `period`
/// observations exist.
fn with_warmup(mut values: Vec<f64>, period: usize) -> Vec<f64> {
    let masked = period.saturating_sub(1).min(values.len());
    values[..masked].fill(f64::NAN);
    values
}

/// Computes every indicator for `series`. Empty input yields no rows.
pub fn compute_indicators(series: &CandleSeries, periods: &IndicatorPeriods) -> Vec<IndicatorRow> {
    let candles = series.candles();
    let closes: Vec<f64> = candles.iter().map(|c| to_f64(c.close)).collect();
    let highs: Vec<f64> = candles.iter().map(|c| to_f64(c.high)).collect();
    let lows: Vec<f64> = candles.iter().map(|c| to_f64(c.low)).collect();
    let volumes: Vec<f64> = candles.iter().map(|c| to_f64(c.volume)).collect();

    let ema_fast = ema(&closes, periods.ema_fast);
    let ema_mid = ema(&closes, periods.ema_mid);
    let ema_slow = ema(&closes, periods.ema_slow);
    // the trend filter needs a full span of history before it votes
    let ema_trend = with_warmup(ema(&closes, periods.ema_trend), periods.ema_trend);
    let rsi = rsi(&closes, periods.rsi);
    let atr = atr(&highs, &lows, &closes, periods.atr);
    let volume_avg = volume_avg(&volumes, periods.volume_avg);

    candles
        .iter()
        .enumerate()
        .map(|(i, candle)| IndicatorRow {
            candle: candle.clone(),
            close: closes[i],
            volume: volumes[i],
            ema_fast: ema_fast[i],
            ema_mid: ema_mid[i],
            ema_slow: ema_slow[i],
            ema_trend: ema_trend[i],
            rsi: rsi[i],
            atr: atr[i],
            volume_avg: volume_avg[i],
        })
        .collect()
}
