//! Configuration loading from environment variables.
//!
//! Split by concern: indicator/classification parameters, the fusion rule,
//! and the live/backtest runtime. `Config::from_env` validates the combined
//! result before handing out domain value objects.

mod fusion_config;
mod live_config;
mod signal_config;

pub use fusion_config::FusionEnvConfig;
pub use live_config::{DEFAULT_SYMBOLS, LiveEnvConfig};
pub use signal_config::SignalEnvConfig;

use crate::application::live_monitor::LiveMonitorConfig;
use crate::domain::config::FusionConfig;
use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub signal: SignalEnvConfig,
    pub fusion: FusionEnvConfig,
    pub live: LiveEnvConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let config = Self {
            signal: SignalEnvConfig::from_env().context("Failed to load signal config")?,
            fusion: FusionEnvConfig::from_env().context("Failed to load fusion config")?,
            live: LiveEnvConfig::from_env().context("Failed to load live config")?,
        };
        config
            .fusion_config()
            .validate()
            .context("Invalid signal configuration")?;
        Ok(config)
    }

    pub fn fusion_config(&self) -> FusionConfig {
        FusionConfig {
            signal: self.signal.to_signal_config(),
            alignment: self.fusion.alignment,
            confidence: self.fusion.confidence,
            confidence_threshold: self.fusion.confidence_threshold,
            fast_timeframes: self.fusion.fast_timeframes.clone(),
            slow_timeframe: self.fusion.slow_timeframe,
        }
    }

    pub fn live_monitor_config(&self) -> LiveMonitorConfig {
        let mut timeframes = self.fusion_config().fusion_timeframes();
        if !timeframes.contains(&self.live.base_timeframe) {
            timeframes.push(self.live.base_timeframe);
        }
        LiveMonitorConfig {
            symbols: self.live.symbols.clone(),
            timeframes,
            base_timeframe: self.live.base_timeframe,
            candle_window: self.live.candle_window,
            poll_limit: 2,
            poll_interval: Duration::from_secs(self.live.poll_interval_secs),
        }
    }
}

fn parse_usize(key: &str, default: usize) -> Result<usize> {
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse::<usize>()
        .context(format!("Failed to parse {}", key))
}

fn parse_u64(key: &str, default: u64) -> Result<u64> {
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse::<u64>()
        .context(format!("Failed to parse {}", key))
}

fn parse_f64(key: &str, default: f64) -> Result<f64> {
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse::<f64>()
        .context(format!("Failed to parse {}", key))
}

fn parse_bool(key: &str, default: bool) -> bool {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<bool>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market::timeframe::Timeframe;

    #[test]
    fn test_config_from_env_defaults() {
        let config = Config::from_env().expect("Should parse with defaults");
        assert_eq!(config.fusion_config(), FusionConfig::default());
    }

    #[test]
    fn test_live_monitor_config_covers_fusion_timeframes() {
        let config = Config::from_env().expect("Should parse with defaults");
        let live = config.live_monitor_config();
        assert_eq!(live.timeframes, Timeframe::canonical());
        assert_eq!(live.base_timeframe, Timeframe::OneMin);
        assert_eq!(live.poll_interval, Duration::from_secs(60));
        assert_eq!(live.poll_limit, 2);
    }
}
