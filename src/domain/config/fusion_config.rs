//! Fusion Configuration Domain Value Object
//!
//! Selects how per-timeframe signals are combined into one decision.

use crate::domain::config::signal_config::{SignalConfig, SignalConfigError};
use crate::domain::market::timeframe::Timeframe;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How the participating timeframes must agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AlignmentMode {
    /// Every fast timeframe and the slow timeframe report the same direction.
    StrictAll,
    /// Every fast timeframe agrees; the slow timeframe agrees or is NO_SIGNAL.
    #[default]
    TolerantSlow,
}

impl FromStr for AlignmentMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "strict_all" | "strict" => Ok(AlignmentMode::StrictAll),
            "tolerant_slow" | "tolerant" => Ok(AlignmentMode::TolerantSlow),
            _ => anyhow::bail!(
                "Invalid ALIGNMENT_MODE: {}. Must be 'strict_all' or 'tolerant_slow'",
                s
            ),
        }
    }
}

impl fmt::Display for AlignmentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlignmentMode::StrictAll => write!(f, "strict_all"),
            AlignmentMode::TolerantSlow => write!(f, "tolerant_slow"),
        }
    }
}

/// Whether per-timeframe confidence is computed and used to gate the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfidenceMode {
    /// Confidence 1.0 for directional rows whose volume clears the volume average.
    #[default]
    VolumeConfirmed,
    Disabled,
}

impl FromStr for ConfidenceMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "volume" | "volume_confirmed" | "enabled" => Ok(ConfidenceMode::VolumeConfirmed),
            "disabled" | "off" | "none" => Ok(ConfidenceMode::Disabled),
            _ => anyhow::bail!(
                "Invalid CONFIDENCE_MODE: {}. Must be 'volume' or 'disabled'",
                s
            ),
        }
    }
}

impl fmt::Display for ConfidenceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfidenceMode::VolumeConfirmed => write!(f, "volume"),
            ConfidenceMode::Disabled => write!(f, "disabled"),
        }
    }
}

/// Fusion policy
///
/// # Invariants
///
/// - `fast_timeframes` is not empty
/// - `confidence_threshold` is finite and >= 0.0 (values above 1.0 block every signal)
#[derive(Debug, Clone, PartialEq)]
pub struct FusionConfig {
    pub signal: SignalConfig,
    pub alignment: AlignmentMode,
    pub confidence: ConfidenceMode,
    pub confidence_threshold: f64,
    pub fast_timeframes: Vec<Timeframe>,
    pub slow_timeframe: Timeframe,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            signal: SignalConfig::default(),
            alignment: AlignmentMode::default(),
            confidence: ConfidenceMode::default(),
            confidence_threshold: 0.75,
            fast_timeframes: vec![Timeframe::OneMin, Timeframe::ThreeMin, Timeframe::FiveMin],
            slow_timeframe: Timeframe::FifteenMin,
        }
    }
}

impl FusionConfig {
    pub fn validate(&self) -> Result<(), SignalConfigError> {
        self.signal.validate()?;

        if !self.confidence_threshold.is_finite() || self.confidence_threshold < 0.0 {
            return Err(SignalConfigError::InvalidThreshold {
                field: "confidence_threshold".to_string(),
                value: self.confidence_threshold,
            });
        }
        if self.fast_timeframes.is_empty() {
            return Err(SignalConfigError::EmptyFastTimeframes);
        }
        Ok(())
    }

    /// Whether `timeframe` votes in the alignment rule.
    pub fn participates(&self, timeframe: Timeframe) -> bool {
        timeframe == self.slow_timeframe || self.fast_timeframes.contains(&timeframe)
    }

    /// Fast timeframes followed by the slow timeframe, without duplicates.
    pub fn fusion_timeframes(&self) -> Vec<Timeframe> {
        let mut timeframes = self.fast_timeframes.clone();
        if !timeframes.contains(&self.slow_timeframe) {
            timeframes.push(self.slow_timeframe);
        }
        timeframes
    }
}
