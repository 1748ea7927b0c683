use crate::application::market_data::indicators::{IndicatorRow, compute_indicators};
use crate::domain::config::{ConfidenceMode, SignalConfig};
use crate::domain::market::candle::{CandleSeries, latest_index_at};
use crate::domain::market::timeframe::Timeframe;
use crate::domain::trading::types::{SignalKind, TimeframeSignal};
use tracing::debug;

/// Classifies one timeframe's candles at arbitrary query instants.
///
/// Indicators are computed once from a copy of the input series; every later
/// query is read-only, so an engine can be shared between threads.
#[derive(Debug, Clone)]
pub struct TimeframeSignalEngine {
    timeframe: Timeframe,
    config: SignalConfig,
    confidence_mode: ConfidenceMode,
    rows: Vec<IndicatorRow>,
}

impl TimeframeSignalEngine {
    pub fn new(
        series: &CandleSeries,
        config: &SignalConfig,
        confidence_mode: ConfidenceMode,
    ) -> Self {
        let rows = compute_indicators(series, &config.periods);
        debug!(
            "TimeframeSignalEngine [{} {}]: {} rows, warmup {}",
            series.symbol(),
            series.timeframe(),
            rows.len(),
            config.periods.warmup()
        );

        Self {
            timeframe: series.timeframe(),
            config: config.clone(),
            confidence_mode,
            rows,
        }
    }

    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    pub fn rows(&self) -> &[IndicatorRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Signal for the most recent bar opened at or before `timestamp` (ms).
    ///
    /// Never looks ahead. Returns NO_SIGNAL with zero confidence and levels when
    /// no such bar exists.
    pub fn signal_at(&self, timestamp: i64) -> TimeframeSignal {
        let latest = latest_index_at(&self.rows, timestamp, |row| row.candle.open_time);
        let Some(index) = latest else {
            return TimeframeSignal::none();
        };
        let row = &self.rows[index];
        let kind = self.classify(row);

        let confidence = match self.confidence_mode {
            ConfidenceMode::VolumeConfirmed
                if kind.is_directional()
                    && row.volume >= row.volume_avg * self.config.volume_multiplier =>
            {
                1.0
            }
            _ => 0.0,
        };

        let (stop_loss, take_profit) = self.levels(kind, row);

        TimeframeSignal {
            kind,
            confidence,
            stop_loss,
            take_profit,
        }
    }

    /// Trend-stack classification of a single row.
    ///
    /// Comparisons against NaN are false, so rows without full history are
    /// always NO_SIGNAL.
    pub fn classify(&self, row: &IndicatorRow) -> SignalKind {
        let bullish_stack = row.ema_fast > row.ema_mid
            && row.ema_mid > row.ema_slow
            && row.ema_slow > row.ema_trend;
        let bearish_stack = row.ema_fast < row.ema_mid
            && row.ema_mid < row.ema_slow
            && row.ema_slow < row.ema_trend;

        if row.close > row.ema_trend && bullish_stack && row.rsi > self.config.long_rsi_threshold {
            SignalKind::Long
        } else if row.close < row.ema_trend
            && bearish_stack
            && row.rsi < self.config.short_rsi_threshold
        {
            SignalKind::Short
        } else {
            SignalKind::NoSignal
        }
    }

    fn levels(&self, kind: SignalKind, row: &IndicatorRow) -> (f64, f64) {
        if !self.config.emit_levels || row.atr.is_nan() {
            return (0.0, 0.0);
        }

        let risk = row.atr * self.config.atr_sl_multiplier;
        let reward = row.atr * self.config.atr_tp_multiplier;
        match kind {
            SignalKind::Long => (row.close - risk, row.close + reward),
            SignalKind::Short => (row.close + risk, row.close - reward),
            SignalKind::NoSignal => (0.0, 0.0),
        }
    }
}
