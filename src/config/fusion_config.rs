//! Fusion rule parameters from environment variables.

use super::parse_f64;
use crate::domain::config::{AlignmentMode, ConfidenceMode};
use crate::domain::market::timeframe::{Timeframe, parse_timeframe_list};
use anyhow::{Context, Result};
use std::env;

#[derive(Debug, Clone)]
pub struct FusionEnvConfig {
    pub alignment: AlignmentMode,
    pub confidence: ConfidenceMode,
    pub confidence_threshold: f64,
    pub fast_timeframes: Vec<Timeframe>,
    pub slow_timeframe: Timeframe,
}

impl FusionEnvConfig {
    pub fn from_env() -> Result<Self> {
        let alignment = env::var("ALIGNMENT_MODE")
            .unwrap_or_else(|_| "tolerant_slow".to_string())
            .parse::<AlignmentMode>()
            .context("Failed to parse ALIGNMENT_MODE")?;

        let confidence = env::var("CONFIDENCE_MODE")
            .unwrap_or_else(|_| "volume".to_string())
            .parse::<ConfidenceMode>()
            .context("Failed to parse CONFIDENCE_MODE")?;

        let fast_str = env::var("FAST_TIMEFRAMES").unwrap_or_else(|_| "1m,3m,5m".to_string());
        let fast_timeframes =
            parse_timeframe_list(&fast_str).context("Failed to parse FAST_TIMEFRAMES")?;

        let slow_timeframe = env::var("SLOW_TIMEFRAME")
            .unwrap_or_else(|_| "15m".to_string())
            .parse::<Timeframe>()
            .context("Failed to parse SLOW_TIMEFRAME")?;

        Ok(Self {
            alignment,
            confidence,
            confidence_threshold: parse_f64("CONFIDENCE_THRESHOLD", 0.75)?,
            fast_timeframes,
            slow_timeframe,
        })
    }
}
