//! Indicator and classification parameters from environment variables.

use super::{parse_bool, parse_f64, parse_usize};
use crate::domain::config::{IndicatorPeriods, SignalConfig};
use anyhow::Result;

#[derive(Debug, Clone)]
pub struct SignalEnvConfig {
    // EMA stack
    pub ema_fast_period: usize,
    pub ema_mid_period: usize,
    pub ema_slow_period: usize,
    pub ema_trend_period: usize,

    // Oscillators
    pub rsi_period: usize,
    pub atr_period: usize,
    pub volume_avg_period: usize,

    // Classification
    pub long_rsi_threshold: f64,
    pub short_rsi_threshold: f64,
    pub volume_multiplier: f64,

    // Levels
    pub atr_sl_multiplier: f64,
    pub atr_tp_multiplier: f64,
    pub emit_levels: bool,
}

impl SignalEnvConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            ema_fast_period: parse_usize("EMA_FAST_PERIOD", 9)?,
            ema_mid_period: parse_usize("EMA_MID_PERIOD", 21)?,
            ema_slow_period: parse_usize("EMA_SLOW_PERIOD", 50)?,
            ema_trend_period: parse_usize("EMA_TREND_PERIOD", 200)?,
            rsi_period: parse_usize("RSI_PERIOD", 14)?,
            atr_period: parse_usize("ATR_PERIOD", 14)?,
            volume_avg_period: parse_usize("VOLUME_AVG_PERIOD", 20)?,
            long_rsi_threshold: parse_f64("LONG_RSI_THRESHOLD", 55.0)?,
            short_rsi_threshold: parse_f64("SHORT_RSI_THRESHOLD", 45.0)?,
            volume_multiplier: parse_f64("VOLUME_MULTIPLIER", 1.0)?,
            atr_sl_multiplier: parse_f64("ATR_SL_MULT", 1.5)?,
            atr_tp_multiplier: parse_f64("ATR_TP_MULT", 3.0)?,
            emit_levels: parse_bool("EMIT_LEVELS", true),
        })
    }

    pub fn to_signal_config(&self) -> SignalConfig {
        SignalConfig {
            periods: IndicatorPeriods {
                ema_fast: self.ema_fast_period,
                ema_mid: self.ema_mid_period,
                ema_slow: self.ema_slow_period,
                ema_trend: self.ema_trend_period,
                rsi: self.rsi_period,
                atr: self.atr_period,
                volume_avg: self.volume_avg_period,
            },
            long_rsi_threshold: self.long_rsi_threshold,
            short_rsi_threshold: self.short_rsi_threshold,
            volume_multiplier: self.volume_multiplier,
            atr_sl_multiplier: self.atr_sl_multiplier,
            atr_tp_multiplier: self.atr_tp_multiplier,
            emit_levels: self.emit_levels,
        }
    }
}
