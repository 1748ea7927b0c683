// Market data domain
pub mod candle;
pub mod timeframe;

pub use candle::{Candle, CandleSeries};
pub use timeframe::Timeframe;
