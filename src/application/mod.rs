// Backtesting over historical candles
pub mod backtest;

// Live polling and alerting
pub mod live_monitor;

// Indicators, per-timeframe classification and fusion
pub mod market_data;
