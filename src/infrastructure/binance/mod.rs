pub mod market_data;

pub use market_data::{BinanceCandleSource, DEFAULT_BASE_URL};
