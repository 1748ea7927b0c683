//! Configuration domain module
//!
//! Value objects for the signal engine, independent of how they are loaded.

pub mod fusion_config;
pub mod signal_config;

pub use fusion_config::{AlignmentMode, ConfidenceMode, FusionConfig};
pub use signal_config::{IndicatorPeriods, SignalConfig, SignalConfigError};
