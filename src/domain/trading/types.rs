use crate::domain::market::timeframe::Timeframe;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalKind {
    Long,
    Short,
    #[default]
    NoSignal,
}

impl SignalKind {
    pub fn is_directional(&self) -> bool {
        !matches!(self, SignalKind::NoSignal)
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalKind::Long => write!(f, "LONG"),
            SignalKind::Short => write!(f, "SHORT"),
            SignalKind::NoSignal => write!(f, "NO_SIGNAL"),
        }
    }
}

/// Classification of a single indicator row.
///
/// `confidence` is 0.0 or 1.0 when volume confirmation is enabled and 0.0
/// otherwise. Levels are 0.0 unless the signal is directional.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TimeframeSignal {
    pub kind: SignalKind,
    pub confidence: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
}

impl TimeframeSignal {
    /// NO_SIGNAL with zero confidence and zero levels.
    pub fn none() -> Self {
        Self::default()
    }
}

/// Outcome of one multi-timeframe analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusionResult {
    pub final_signal: SignalKind,
    pub per_timeframe: BTreeMap<Timeframe, TimeframeSignal>,
    pub confidence: f64,
}

impl FusionResult {
    /// Per-timeframe kind, NO_SIGNAL when the timeframe was not analyzed.
    pub fn kind_of(&self, timeframe: Timeframe) -> SignalKind {
        self.per_timeframe
            .get(&timeframe)
            .map(|signal| signal.kind)
            .unwrap_or_default()
    }
}
