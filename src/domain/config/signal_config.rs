//! Signal Configuration Domain Value Objects
//!
//! Indicator periods and per-timeframe classification thresholds.

use thiserror::Error;

/// Error type for signal/fusion configuration validation
#[derive(Debug, Error, PartialEq)]
pub enum SignalConfigError {
    #[error("Invalid period: {field} = {value}. Must be > 0")]
    InvalidPeriod { field: String, value: usize },

    #[error("Invalid EMA stack: {fast} < {mid} < {slow} < {trend} must hold")]
    UnorderedEmaStack {
        fast: usize,
        mid: usize,
        slow: usize,
        trend: usize,
    },

    #[error("Invalid threshold: {field} = {value}")]
    InvalidThreshold { field: String, value: f64 },

    #[error("Invalid multiplier: {field} = {value}. Must be finite and >= 0")]
    InvalidMultiplier { field: String, value: f64 },

    #[error("No fast timeframes configured for fusion")]
    EmptyFastTimeframes,
}

/// Lookback periods for the indicator set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorPeriods {
    pub ema_fast: usize,
    pub ema_mid: usize,
    pub ema_slow: usize,
    pub ema_trend: usize,
    pub rsi: usize,
    pub atr: usize,
    pub volume_avg: usize,
}

impl Default for IndicatorPeriods {
    fn default() -> Self {
        Self {
            ema_fast: 9,
            ema_mid: 21,
            ema_slow: 50,
            ema_trend: 200,
            rsi: 14,
            atr: 14,
            volume_avg: 20,
        }
    }
}

impl IndicatorPeriods {
    pub fn validate(&self) -> Result<(), SignalConfigError> {
        validate_period("ema_fast", self.ema_fast)?;
        validate_period("ema_mid", self.ema_mid)?;
        validate_period("ema_slow", self.ema_slow)?;
        validate_period("ema_trend", self.ema_trend)?;
        validate_period("rsi", self.rsi)?;
        validate_period("atr", self.atr)?;
        validate_period("volume_avg", self.volume_avg)?;

        if !(self.ema_fast < self.ema_mid
            && self.ema_mid < self.ema_slow
            && self.ema_slow < self.ema_trend)
        {
            return Err(SignalConfigError::UnorderedEmaStack {
                fast: self.ema_fast,
                mid: self.ema_mid,
                slow: self.ema_slow,
                trend: self.ema_trend,
            });
        }
        Ok(())
    }

    /// Number of candles before every indicator is defined.
    pub fn warmup(&self) -> usize {
        self.ema_trend
            .max(self.rsi + 1)
            .max(self.atr)
            .max(self.volume_avg)
    }
}

/// Per-timeframe classification parameters
///
/// # Invariants
///
/// - `short_rsi_threshold <= long_rsi_threshold`, both within [0, 100]
/// - multipliers are finite and non-negative
#[derive(Debug, Clone, PartialEq)]
pub struct SignalConfig {
    pub periods: IndicatorPeriods,
    pub long_rsi_threshold: f64,
    pub short_rsi_threshold: f64,
    pub volume_multiplier: f64,
    pub atr_sl_multiplier: f64,
    pub atr_tp_multiplier: f64,
    /// Attach stop-loss / take-profit levels to directional signals
    pub emit_levels: bool,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            periods: IndicatorPeriods::default(),
            long_rsi_threshold: 55.0,
            short_rsi_threshold: 45.0,
            volume_multiplier: 1.0,
            atr_sl_multiplier: 1.5,
            atr_tp_multiplier: 3.0,
            emit_levels: true,
        }
    }
}

impl SignalConfig {
    pub fn validate(&self) -> Result<(), SignalConfigError> {
        self.periods.validate()?;

        for (field, value) in [
            ("long_rsi_threshold", self.long_rsi_threshold),
            ("short_rsi_threshold", self.short_rsi_threshold),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(SignalConfigError::InvalidThreshold {
                    field: field.to_string(),
                    value,
                });
            }
        }
        if self.short_rsi_threshold > self.long_rsi_threshold {
            return Err(SignalConfigError::InvalidThreshold {
                field: "short_rsi_threshold".to_string(),
                value: self.short_rsi_threshold,
            });
        }

        validate_multiplier("volume_multiplier", self.volume_multiplier)?;
        validate_multiplier("atr_sl_multiplier", self.atr_sl_multiplier)?;
        validate_multiplier("atr_tp_multiplier", self.atr_tp_multiplier)?;
        Ok(())
    }
}

fn validate_period(field: &str, value: usize) -> Result<(), SignalConfigError> {
    if value == 0 {
        return Err(SignalConfigError::InvalidPeriod {
            field: field.to_string(),
            value,
        });
    }
    Ok(())
}

pub(crate) fn validate_multiplier(field: &str, value: f64) -> Result<(), SignalConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(SignalConfigError::InvalidMultiplier {
            field: field.to_string(),
            value,
        });
    }
    Ok(())
}
