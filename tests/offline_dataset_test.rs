use chrono::DateTime;
use mtfsignal::application::backtest::{Backtester, TradeOutcome};
use mtfsignal::application::market_data::MultiTimeframeFusion;
use mtfsignal::domain::config::FusionConfig;
use mtfsignal::domain::market::Timeframe;
use mtfsignal::domain::trading::SignalKind;
use mtfsignal::infrastructure::csv_loader::load_dataset_dir;
use std::fmt::Write as _;
use std::path::PathBuf;

const LAST_OPEN: i64 = 1_700_006_400_000;
const ROWS: i64 = 260;

fn format_time(ms: i64) -> String {
    DateTime::from_timestamp_millis(ms)
        .unwrap()
        .format("%Y-%m-%d %H:%M:%S%.3f")
        .to_string()
}

/// Writes `{label}.csv` files shaped like a klines export.
fn write_dataset(name: &str, timeframes: &[Timeframe]) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("mtfsignal-{}-{}", name, std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();

    for &timeframe in timeframes {
        let step = timeframe.to_millis();
        let mut contents =
            String::from("open_time,open,high,low,close,volume,close_time,number_of_trades\n");
        for i in 0..ROWS {
            let open_time = LAST_OPEN - (ROWS - 1 - i) * step;
            let close = 25_000 + i * 3;
            writeln!(
                contents,
                "{},{},{},{},{},{},{},{}",
                format_time(open_time),
                close,
                close + 1,
                close - 1,
                close,
                "12.5",
                format_time(open_time + step - 1),
                100 + i
            )
            .unwrap();
        }
        std::fs::write(dir.join(format!("{}.csv", timeframe.label())), contents).unwrap();
    }
    dir
}

#[test]
fn test_offline_dataset_analyze_and_backtest() {
    let dir = write_dataset("full", &Timeframe::canonical());
    let data = load_dataset_dir(&dir, "BTCUSDT", &Timeframe::canonical()).unwrap();

    assert_eq!(data.len(), 4);
    for series in data.values() {
        assert_eq!(series.len(), ROWS as usize);
        assert_eq!(series.symbol(), "BTCUSDT");
        assert_eq!(series.last().unwrap().open_time, LAST_OPEN);
    }

    let result = MultiTimeframeFusion::new(&data, FusionConfig::default()).analyze(LAST_OPEN);
    assert_eq!(result.final_signal, SignalKind::Long);

    let report = Backtester::new(FusionConfig::default()).run(&data, Timeframe::OneMin);
    assert_eq!(report.bars_evaluated, ROWS as usize);
    assert_eq!(report.total_trades(), 1);
    assert_eq!(report.trades[0].side, SignalKind::Long);
    assert_eq!(report.trades[0].outcome, TradeOutcome::Win);
    assert_eq!(report.win_rate_pct, 100.0);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["trades"][0]["outcome"], "WIN");
    assert_eq!(json["trades"][0]["side"], "LONG");
}

#[test]
fn test_missing_timeframe_file_is_reported() {
    let dir = write_dataset("partial", &[Timeframe::OneMin, Timeframe::ThreeMin]);
    let err = load_dataset_dir(&dir, "BTCUSDT", &Timeframe::canonical()).unwrap_err();

    assert!(format!("{:#}", err).contains("5m.csv"));
}
