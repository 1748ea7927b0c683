pub mod binance;
pub mod core;
pub mod csv_loader;
pub mod mock;
pub mod telegram;

pub use binance::BinanceCandleSource;
pub use csv_loader::{load_dataset_dir, load_series_csv};
pub use mock::{MockCandleSource, RecordingAlertSink};
pub use telegram::TelegramNotifier;
