//! Bar-by-bar replay of the fused signal over historical data.
//!
//! The fusion engine is built once over the full dataset; because every query
//! only sees bars opened at or before its instant, replaying the base timeframe
//! in order never leaks future candles into a decision.

use crate::application::market_data::fusion::MultiTimeframeFusion;
use crate::domain::config::FusionConfig;
use crate::domain::market::candle::CandleSeries;
use crate::domain::market::timeframe::Timeframe;
use crate::domain::trading::types::SignalKind;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeOutcome {
    Win,
    Loss,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestTrade {
    pub side: SignalKind,
    pub entry_time: i64,
    pub entry_price: Decimal,
    pub exit_time: i64,
    pub exit_price: Decimal,
    pub pnl: Decimal,
    pub outcome: TradeOutcome,
}

impl BacktestTrade {
    fn close(position: &OpenPosition, exit_time: i64, exit_price: Decimal) -> Self {
        let pnl = match position.side {
            SignalKind::Short => position.entry_price - exit_price,
            _ => exit_price - position.entry_price,
        };
        Self {
            side: position.side,
            entry_time: position.entry_time,
            entry_price: position.entry_price,
            exit_time,
            exit_price,
            pnl,
            outcome: if pnl > Decimal::ZERO {
                TradeOutcome::Win
            } else {
                TradeOutcome::Loss
            },
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BacktestReport {
    pub symbol: String,
    pub base_timeframe: Option<Timeframe>,
    pub bars_evaluated: usize,
    pub trades: Vec<BacktestTrade>,
    pub wins: usize,
    pub losses: usize,
    pub win_rate_pct: f64,
}

impl BacktestReport {
    pub fn total_trades(&self) -> usize {
        self.trades.len()
    }

    fn finalize(mut self) -> Self {
        self.wins = self
            .trades
            .iter()
            .filter(|t| t.outcome == TradeOutcome::Win)
            .count();
        self.losses = self.trades.len() - self.wins;
        self.win_rate_pct = if self.trades.is_empty() {
            0.0
        } else {
            self.wins as f64 / self.trades.len() as f64 * 100.0
        };
        self
    }
}

#[derive(Debug, Clone)]
struct OpenPosition {
    side: SignalKind,
    entry_time: i64,
    entry_price: Decimal,
}

pub struct Backtester {
    config: FusionConfig,
}

impl Backtester {
    pub fn new(config: FusionConfig) -> Self {
        Self { config }
    }

    /// Replays every bar of `base_timeframe`.
    ///
    /// Positions open and close at the bar's open price: a directional signal
    /// opens a position when flat, and an opposite directional signal closes
    /// it (then reopens in the new direction on the same bar). Anything still
    /// open is closed at the final base close.
    pub fn run(
        &self,
        data: &BTreeMap<Timeframe, CandleSeries>,
        base_timeframe: Timeframe,
    ) -> BacktestReport {
        let Some(base) = data.get(&base_timeframe) else {
            info!("Backtester: base timeframe {} missing, nothing to replay", base_timeframe);
            return BacktestReport {
                base_timeframe: Some(base_timeframe),
                ..BacktestReport::default()
            };
        };

        let fusion = MultiTimeframeFusion::new(data, self.config.clone());
        let mut position: Option<OpenPosition> = None;
        let mut trades = Vec::new();

        for candle in base.candles() {
            let result = fusion.analyze(candle.open_time);
            let signal = result.final_signal;
            debug!(
                "Backtester [{}] @{}: final={} details={:?}",
                base.symbol(),
                candle.open_time,
                signal,
                result
                    .per_timeframe
                    .iter()
                    .map(|(tf, s)| format!("{}={}", tf, s.kind))
                    .collect::<Vec<_>>()
            );

            let reverses = position
                .as_ref()
                .is_some_and(|open| signal.is_directional() && signal != open.side);
            let closing = if reverses { position.take() } else { None };
            if let Some(open) = closing {
                let trade = BacktestTrade::close(&open, candle.open_time, candle.open);
                info!(
                    "Backtester [{}]: closed {} at {} -> {:?}",
                    base.symbol(),
                    trade.side,
                    trade.exit_price,
                    trade.outcome
                );
                trades.push(trade);
            }

            if signal.is_directional() && position.is_none() {
                position = Some(OpenPosition {
                    side: signal,
                    entry_time: candle.open_time,
                    entry_price: candle.open,
                });
            }
        }

        if let (Some(open), Some(last)) = (position.take(), base.last()) {
            trades.push(BacktestTrade::close(&open, last.open_time, last.close));
        }

        let report = BacktestReport {
            symbol: base.symbol().to_string(),
            base_timeframe: Some(base_timeframe),
            bars_evaluated: base.len(),
            trades,
            ..BacktestReport::default()
        }
        .finalize();

        info!(
            "Backtester [{}]: Total Trades: {} | Wins: {} | Losses: {} | Win Rate: {:.2}%",
            report.symbol,
            report.total_trades(),
            report.wins,
            report.losses,
            report.win_rate_pct
        );
        report
    }
}
