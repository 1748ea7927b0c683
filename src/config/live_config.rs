//! Market data, polling and alerting settings from environment variables.

use super::{parse_u64, parse_usize};
use crate::domain::market::timeframe::Timeframe;
use crate::infrastructure::binance::DEFAULT_BASE_URL;
use anyhow::{Context, Result};
use std::env;

pub const DEFAULT_SYMBOLS: [&str; 20] = [
    "BTCUSDT", "ETHUSDT", "BNBUSDT", "XRPUSDT", "SOLUSDT", "ADAUSDT", "DOGEUSDT", "TRXUSDT",
    "LINKUSDT", "MATICUSDT", "DOTUSDT", "LTCUSDT", "SHIBUSDT", "ETCUSDT", "ATOMUSDT", "AVAXUSDT",
    "UNIUSDT", "BCHUSDT", "ICPUSDT", "APTUSDT",
];

#[derive(Debug, Clone)]
pub struct LiveEnvConfig {
    pub symbols: Vec<String>,
    pub binance_base_url: String,
    /// Timeframe whose bars drive backtests and live analysis
    pub base_timeframe: Timeframe,
    pub candle_window: usize,
    pub backtest_candle_limit: usize,
    pub poll_interval_secs: u64,
    pub telegram_token: Option<String>,
    pub telegram_chat_id: Option<String>,
}

impl LiveEnvConfig {
    pub fn from_env() -> Result<Self> {
        let symbols = match env::var("SYMBOLS") {
            Ok(list) => list
                .split(',')
                .map(|s| s.trim().to_uppercase())
                .filter(|s| !s.is_empty())
                .collect(),
            Err(_) => DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect(),
        };

        let base_timeframe = env::var("BASE_TIMEFRAME")
            .unwrap_or_else(|_| "1m".to_string())
            .parse::<Timeframe>()
            .context("Failed to parse BASE_TIMEFRAME")?;

        Ok(Self {
            symbols,
            binance_base_url: env::var("BINANCE_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            base_timeframe,
            candle_window: parse_usize("CANDLE_WINDOW", 200)?,
            backtest_candle_limit: parse_usize("BACKTEST_CANDLE_LIMIT", 500)?,
            poll_interval_secs: parse_u64("POLL_INTERVAL_SECS", 60)?,
            telegram_token: env::var("TELEGRAM_TOKEN").ok(),
            telegram_chat_id: env::var("TELEGRAM_CHAT_ID").ok(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_live_env_defaults() {
        let config = LiveEnvConfig::from_env().expect("Should parse with defaults");
        assert_eq!(config.symbols.len(), 20);
        assert_eq!(config.symbols[0], "BTCUSDT");
        assert_eq!(config.base_timeframe, Timeframe::OneMin);
        assert_eq!(config.candle_window, 200);
        assert_eq!(config.backtest_candle_limit, 500);
        assert_eq!(config.poll_interval_secs, 60);
        assert_eq!(config.binance_base_url, "https://api.binance.com");
    }
}
