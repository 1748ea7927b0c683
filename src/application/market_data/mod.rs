pub mod fusion;
pub mod indicators;
pub mod signal_generator;

pub use fusion::MultiTimeframeFusion;
pub use indicators::{IndicatorRow, compute_indicators};
pub use signal_generator::TimeframeSignalEngine;
