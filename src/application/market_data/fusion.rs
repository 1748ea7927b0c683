//! Multi-timeframe signal fusion
//!
//! One `TimeframeSignalEngine` per timeframe, queried at a shared instant. The
//! per-timeframe kinds are combined by the configured `AlignmentMode`, then
//! optionally gated by the mean volume confidence of the voting timeframes.

use crate::application::market_data::signal_generator::TimeframeSignalEngine;
use crate::domain::config::{AlignmentMode, ConfidenceMode, FusionConfig};
use crate::domain::market::candle::CandleSeries;
use crate::domain::market::timeframe::Timeframe;
use crate::domain::trading::types::{FusionResult, SignalKind, TimeframeSignal};
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct MultiTimeframeFusion {
    config: FusionConfig,
    engines: BTreeMap<Timeframe, TimeframeSignalEngine>,
}

impl MultiTimeframeFusion {
    /// Builds one engine per entry. Timeframes outside the configured fusion
    /// set are analyzed and reported but never vote.
    pub fn new<'a, I>(data: I, config: FusionConfig) -> Self
    where
        I: IntoIterator<Item = (&'a Timeframe, &'a CandleSeries)>,
    {
        let engines = data
            .into_iter()
            .map(|(timeframe, series)| {
                let engine =
                    TimeframeSignalEngine::new(series, &config.signal, config.confidence);
                (*timeframe, engine)
            })
            .collect();

        Self { config, engines }
    }

    /// Fused decision for the bars known at `timestamp` (ms).
    pub fn analyze(&self, timestamp: i64) -> FusionResult {
        let per_timeframe: BTreeMap<Timeframe, TimeframeSignal> = self
            .engines
            .iter()
            .map(|(timeframe, engine)| (*timeframe, engine.signal_at(timestamp)))
            .collect();

        let aligned = self.aligned_kind(&per_timeframe);

        let (final_signal, confidence) = match self.config.confidence {
            ConfidenceMode::Disabled => (aligned, 0.0),
            ConfidenceMode::VolumeConfirmed => {
                let confidence = self.mean_confidence(&per_timeframe);
                let gated = if aligned.is_directional()
                    && confidence < self.config.confidence_threshold
                {
                    SignalKind::NoSignal
                } else {
                    aligned
                };
                (gated, confidence)
            }
        };

        debug!(
            "MultiTimeframeFusion @{}: aligned={} final={} confidence={:.2}",
            timestamp, aligned, final_signal, confidence
        );

        FusionResult {
            final_signal,
            per_timeframe,
            confidence,
        }
    }

    fn aligned_kind(&self, per_timeframe: &BTreeMap<Timeframe, TimeframeSignal>) -> SignalKind {
        let kind_of = |timeframe: &Timeframe| {
            per_timeframe
                .get(timeframe)
                .map(|signal| signal.kind)
                .unwrap_or_default()
        };

        for candidate in [SignalKind::Long, SignalKind::Short] {
            let fast_agree = self
                .config
                .fast_timeframes
                .iter()
                .all(|timeframe| kind_of(timeframe) == candidate);

            let slow = kind_of(&self.config.slow_timeframe);
            let slow_agrees = match self.config.alignment {
                AlignmentMode::StrictAll => slow == candidate,
                AlignmentMode::TolerantSlow => slow == candidate || slow == SignalKind::NoSignal,
            };

            if fast_agree && slow_agrees {
                return candidate;
            }
        }
        SignalKind::NoSignal
    }

    /// Mean confidence over the voting timeframes that are present.
    fn mean_confidence(&self, per_timeframe: &BTreeMap<Timeframe, TimeframeSignal>) -> f64 {
        let voting: Vec<f64> = per_timeframe
            .iter()
            .filter(|(timeframe, _)| self.config.participates(**timeframe))
            .map(|(_, signal)| signal.confidence)
            .collect();

        if voting.is_empty() {
            return 0.0;
        }
        voting.iter().sum::<f64>() / voting.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market::candle::Candle;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn series(timeframe: Timeframe, count: usize, ascending: bool) -> CandleSeries {
        let step_ms = timeframe.to_millis();
        let candles = (0..count)
            .map(|i| {
                let step = Decimal::from(i as i64);
                let close = if ascending {
                    dec!(100) + step
                } else {
                    dec!(1000) - step
                };
                Candle {
                    open_time: i as i64 * step_ms,
                    close_time: (i as i64 + 1) * step_ms - 1,
                    open: close,
                    high: close + dec!(1),
                    low: close - dec!(1),
                    close,
                    volume: dec!(500),
                }
            })
            .collect();
        CandleSeries::new("TEST", timeframe, candles).unwrap()
    }

    fn dataset(layout: &[(Timeframe, usize, bool)]) -> BTreeMap<Timeframe, CandleSeries> {
        layout
            .iter()
            .map(|&(tf, count, ascending)| (tf, series(tf, count, ascending)))
            .collect()
    }

    #[test]
    fn test_tolerant_slow_accepts_flat_slow_timeframe() {
        let data = dataset(&[
            (Timeframe::OneMin, 250, true),
            (Timeframe::ThreeMin, 250, true),
            (Timeframe::FiveMin, 250, true),
            (Timeframe::FifteenMin, 50, true),
        ]);
        let fusion = MultiTimeframeFusion::new(&data, FusionConfig::default());
        let result = fusion.analyze(i64::MAX);

        assert_eq!(result.kind_of(Timeframe::FifteenMin), SignalKind::NoSignal);
        // three of four voting timeframes confirmed
        assert!((result.confidence - 0.75).abs() < 1e-12);
        assert_eq!(result.final_signal, SignalKind::Long);
    }

    #[test]
    fn test_strict_all_rejects_flat_slow_timeframe() {
        let data = dataset(&[
            (Timeframe::OneMin, 250, true),
            (Timeframe::ThreeMin, 250, true),
            (Timeframe::FiveMin, 250, true),
            (Timeframe::FifteenMin, 50, true),
        ]);
        let result = MultiTimeframeFusion::new(&data, strict_all()).analyze(i64::MAX);

        assert_eq!(result.final_signal, SignalKind::NoSignal);
    }

    fn strict_all() -> FusionConfig {
        FusionConfig {
            alignment: AlignmentMode::StrictAll,
            ..FusionConfig::default()
        }
    }

    #[test]
    fn test_strict_all_emits_when_every_timeframe_agrees() {
        for (ascending, expected) in [(true, SignalKind::Long), (false, SignalKind::Short)] {
            let data = dataset(&[
                (Timeframe::OneMin, 250, ascending),
                (Timeframe::ThreeMin, 250, ascending),
                (Timeframe::FiveMin, 250, ascending),
                (Timeframe::FifteenMin, 250, ascending),
            ]);
            let result = MultiTimeframeFusion::new(&data, strict_all()).analyze(i64::MAX);

            assert_eq!(result.kind_of(Timeframe::FifteenMin), expected);
            assert_eq!(result.final_signal, expected);
            assert_eq!(result.confidence, 1.0);
        }
    }

    #[test]
    fn test_strict_all_missing_slow_timeframe_is_no_signal() {
        let data = dataset(&[
            (Timeframe::OneMin, 250, true),
            (Timeframe::ThreeMin, 250, true),
            (Timeframe::FiveMin, 250, true),
        ]);
        let result = MultiTimeframeFusion::new(&data, strict_all()).analyze(i64::MAX);

        assert_eq!(result.per_timeframe.len(), 3);
        assert_eq!(result.final_signal, SignalKind::NoSignal);
    }

    #[test]
    fn test_opposing_slow_timeframe_blocks_signal() {
        let data = dataset(&[
            (Timeframe::OneMin, 250, true),
            (Timeframe::ThreeMin, 250, true),
            (Timeframe::FiveMin, 250, true),
            (Timeframe::FifteenMin, 250, false),
        ]);
        let result = MultiTimeframeFusion::new(&data, FusionConfig::default()).analyze(i64::MAX);

        assert_eq!(result.kind_of(Timeframe::FifteenMin), SignalKind::Short);
        assert_eq!(result.final_signal, SignalKind::NoSignal);
    }

    #[test]
    fn test_extra_timeframe_does_not_vote() {
        let data = dataset(&[
            (Timeframe::OneMin, 250, false),
            (Timeframe::ThreeMin, 250, false),
            (Timeframe::FiveMin, 250, false),
            (Timeframe::FifteenMin, 250, false),
            (Timeframe::OneHour, 250, true),
        ]);
        let result = MultiTimeframeFusion::new(&data, FusionConfig::default()).analyze(i64::MAX);

        assert_eq!(result.per_timeframe.len(), 5);
        assert_eq!(result.kind_of(Timeframe::OneHour), SignalKind::Long);
        assert_eq!(result.final_signal, SignalKind::Short);
        assert_eq!(result.confidence, 1.0);
    }

    #[test]
    fn test_disabled_confidence_reports_zero_and_never_gates() {
        let data = dataset(&[
            (Timeframe::OneMin, 250, true),
            (Timeframe::ThreeMin, 250, true),
            (Timeframe::FiveMin, 250, true),
        ]);
        let config = FusionConfig {
            confidence: ConfidenceMode::Disabled,
            confidence_threshold: 1.01,
            ..FusionConfig::default()
        };
        let result = MultiTimeframeFusion::new(&data, config).analyze(i64::MAX);

        assert_eq!(result.final_signal, SignalKind::Long);
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn test_empty_dataset_is_no_signal() {
        let data: BTreeMap<Timeframe, CandleSeries> = BTreeMap::new();
        let result = MultiTimeframeFusion::new(&data, FusionConfig::default()).analyze(0);

        assert_eq!(result.final_signal, SignalKind::NoSignal);
        assert!(result.per_timeframe.is_empty());
        assert_eq!(result.confidence, 0.0);
    }
}
