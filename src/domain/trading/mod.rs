// Signal value objects
pub mod types;

pub use types::{FusionResult, SignalKind, TimeframeSignal};
