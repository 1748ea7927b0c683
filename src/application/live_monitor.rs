//! Polling loop that keeps a sliding candle window per symbol and timeframe,
//! re-runs the fusion engine after every refresh and alerts on new directions.

use crate::application::market_data::fusion::MultiTimeframeFusion;
use crate::domain::config::FusionConfig;
use crate::domain::market::candle::CandleSeries;
use crate::domain::market::timeframe::Timeframe;
use crate::domain::ports::{AlertSink, CandleQuery, CandleSource};
use crate::domain::trading::types::{FusionResult, SignalKind};
use anyhow::Result;
use chrono::DateTime;
use futures::future::join_all;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct LiveMonitorConfig {
    pub symbols: Vec<String>,
    pub timeframes: Vec<Timeframe>,
    /// Timeframe whose latest bar sets the analysis instant
    pub base_timeframe: Timeframe,
    /// Maximum candles kept per timeframe
    pub candle_window: usize,
    /// Candles requested per timeframe on each incremental poll
    pub poll_limit: usize,
    pub poll_interval: Duration,
}

impl Default for LiveMonitorConfig {
    fn default() -> Self {
        Self {
            symbols: vec!["BTCUSDT".to_string()],
            timeframes: Timeframe::canonical(),
            base_timeframe: Timeframe::OneMin,
            candle_window: 200,
            poll_limit: 2,
            poll_interval: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Default)]
struct SymbolState {
    data: BTreeMap<Timeframe, CandleSeries>,
    last_signal: Option<SignalKind>,
}

pub struct LiveSignalMonitor {
    source: Arc<dyn CandleSource>,
    alerts: Arc<dyn AlertSink>,
    fusion_config: FusionConfig,
    config: LiveMonitorConfig,
    states: HashMap<String, SymbolState>,
}

impl LiveSignalMonitor {
    pub fn new(
        source: Arc<dyn CandleSource>,
        alerts: Arc<dyn AlertSink>,
        fusion_config: FusionConfig,
        config: LiveMonitorConfig,
    ) -> Self {
        Self {
            source,
            alerts,
            fusion_config,
            config,
            states: HashMap::new(),
        }
    }

    /// Current window for `symbol` on `timeframe`, if any has been fetched.
    pub fn series(&self, symbol: &str, timeframe: Timeframe) -> Option<&CandleSeries> {
        self.states.get(symbol)?.data.get(&timeframe)
    }

    /// Last direction alerted for `symbol`.
    pub fn last_signal(&self, symbol: &str) -> Option<SignalKind> {
        self.states.get(symbol)?.last_signal
    }

    /// Refreshes and analyzes every symbol once. Returns the alerts raised.
    pub async fn poll_once(&mut self) -> Vec<(String, FusionResult)> {
        let mut raised = Vec::new();
        for symbol in self.config.symbols.clone() {
            if let Some(result) = self.poll_symbol(&symbol).await {
                raised.push((symbol, result));
            }
        }
        raised
    }

    /// Refreshes one symbol's windows, then alerts when the fused signal is
    /// directional and differs from the last alerted direction.
    pub async fn poll_symbol(&mut self, symbol: &str) -> Option<FusionResult> {
        self.refresh(symbol).await;

        let state = self.states.get_mut(symbol)?;
        let Some(timestamp) = state
            .data
            .get(&self.config.base_timeframe)
            .and_then(|series| series.last())
            .map(|candle| candle.open_time)
        else {
            debug!(
                "LiveSignalMonitor [{}]: no {} candles yet",
                symbol, self.config.base_timeframe
            );
            return None;
        };

        let fusion = MultiTimeframeFusion::new(&state.data, self.fusion_config.clone());
        let result = fusion.analyze(timestamp);

        if !result.final_signal.is_directional()
            || state.last_signal == Some(result.final_signal)
        {
            return None;
        }
        state.last_signal = Some(result.final_signal);

        let message = format_alert(symbol, timestamp, &result, self.config.base_timeframe);
        info!(
            "LiveSignalMonitor [{}]: {} (confidence {:.2})",
            symbol, result.final_signal, result.confidence
        );
        if let Err(e) = self.alerts.send(&message).await {
            warn!("LiveSignalMonitor [{}]: alert delivery failed: {}", symbol, e);
        }
        Some(result)
    }

    async fn refresh(&mut self, symbol: &str) {
        let queries: Vec<CandleQuery> = {
            let state = self.states.entry(symbol.to_string()).or_default();
            self.config
                .timeframes
                .iter()
                .map(|tf| match state.data.get(tf).and_then(|series| series.last()) {
                    Some(last) => CandleQuery::latest(symbol, *tf, self.config.poll_limit)
                        .starting_at(last.open_time + 1),
                    None => CandleQuery::latest(symbol, *tf, self.config.candle_window),
                })
                .collect()
        };

        let source = Arc::clone(&self.source);
        let fetched = join_all(queries.iter().map(|query| source.fetch_candles(query))).await;

        let window = self.config.candle_window;
        let state = self.states.entry(symbol.to_string()).or_default();
        for (query, incoming) in queries.iter().zip(fetched) {
            match state.data.get_mut(&query.timeframe) {
                Some(series) if !series.is_empty() => {
                    match series.append_window(incoming.candles().iter().cloned(), window) {
                        Ok(appended) if appended > 0 => debug!(
                            "LiveSignalMonitor [{} {}]: +{} candles",
                            symbol, query.timeframe, appended
                        ),
                        Ok(_) => {}
                        Err(e) => warn!(
                            "LiveSignalMonitor [{} {}]: rejected update: {}",
                            symbol, query.timeframe, e
                        ),
                    }
                }
                _ => {
                    state.data.insert(query.timeframe, incoming);
                }
            }
        }
    }

    /// Polls on a fixed interval until Ctrl-C.
    pub async fn run(mut self) -> Result<()> {
        info!(
            "LiveSignalMonitor: {} symbols, timeframes {:?}, every {:?}",
            self.config.symbols.len(),
            self.config.timeframes,
            self.config.poll_interval
        );

        let mut ticker = tokio::time::interval(self.config.poll_interval);
        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("LiveSignalMonitor: shutdown signal received");
                    break;
                }
                _ = ticker.tick() => {
                    let raised = self.poll_once().await;
                    debug!("LiveSignalMonitor: cycle done, {} alerts", raised.len());
                }
            }
        }
        Ok(())
    }
}

/// Renders an alert for `result` analyzed at `timestamp` (ms).
pub fn format_alert(
    symbol: &str,
    timestamp: i64,
    result: &FusionResult,
    base_timeframe: Timeframe,
) -> String {
    let time = DateTime::from_timestamp_millis(timestamp)
        .map(|dt| dt.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| timestamp.to_string());
    let details = result
        .per_timeframe
        .iter()
        .map(|(tf, signal)| format!("{}={}", tf, signal.kind))
        .collect::<Vec<_>>()
        .join(", ");

    let mut message = format!(
        "{} | Time: {} | Signal: {} | Conf: {:.2}\nDetails: {}",
        symbol, time, result.final_signal, result.confidence, details
    );
    let base = result
        .per_timeframe
        .get(&base_timeframe)
        .filter(|signal| signal.kind == result.final_signal && signal.stop_loss != 0.0);
    if let Some(base) = base {
        message.push_str(&format!(
            "\nSL: {:.4} | TP: {:.4} ({})",
            base.stop_loss, base.take_profit, base_timeframe
        ));
    }
    message
}
