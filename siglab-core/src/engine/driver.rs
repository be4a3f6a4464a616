//! Rolling-window backtest driver.
//!
//! Replays a historical candle series boundary by boundary. At each boundary
//! the driver recomputes indicators over a bounded rolling window of closed
//! candles plus one synthetic forming candle built from the last known
//! close — never from real future data — and keeps only the signals stamped
//! at the boundary just closed.
//!
//! No-look-ahead rule: EXIT signals apply at the boundary candle's close;
//! ENTRY signals fill at the next candle's open; nothing at or after the
//! forming candle influences either.

use chrono::Duration;

use crate::config::{build_generator, StopGranularity, StrategyConfig};
use crate::domain::{validate_series, Candle, Direction, SignalAction};
use crate::error::DetectError;
use crate::exec::{PositionTracker, StopView};
use crate::indicators::Indicator;
use crate::signals::SignalMetrics;

use super::report::BacktestReport;

/// An entry accepted at a boundary, awaiting the next candle's open.
struct PendingEntry {
    direction: Direction,
    /// Stop-policy indicator value at the decision boundary.
    stop_seed: Option<f64>,
}

/// Drives one strategy configuration over one candle series.
pub struct BacktestDriver<'a> {
    config: &'a StrategyConfig,
}

impl<'a> BacktestDriver<'a> {
    /// The configuration must already have passed
    /// [`StrategyConfig::validate`](crate::config::StrategyConfig::validate).
    pub fn new(config: &'a StrategyConfig) -> Self {
        Self { config }
    }

    pub fn run(&self, candles: &[Candle]) -> Result<BacktestReport, DetectError> {
        validate_series(candles)?;

        let warmup = build_generator(&self.config.generator).warmup();
        let rolling = self.config.driver.rolling_window;
        if candles.len() < warmup + 2 || rolling < warmup + 1 {
            return Err(DetectError::InsufficientHistory {
                indicator: "strategy".into(),
                required: warmup + 2,
                len: candles.len().min(rolling),
            });
        }

        // Stop-policy indicator (ATR or VWMA), computed once; indicators
        // are causal, so reading the value at a boundary index never sees
        // data past that boundary.
        let stop_indicator = self.config.stop.as_ref().and_then(|s| s.indicator());
        let stop_series: Option<Vec<f64>> = stop_indicator.map(|ind| ind.compute(candles));
        let stop_at = |t: usize| stop_series.as_ref().map(|s| s[t]);

        let mut tracker = PositionTracker::new();
        let mut pending: Option<PendingEntry> = None;
        let mut metrics = SignalMetrics::new();
        let mut kept = Vec::new();
        let mut positions = Vec::new();

        for t in warmup..candles.len() {
            let candle = &candles[t];

            // 1. Fill the entry decided at the previous boundary at this
            //    candle's open.
            if let Some(entry) = pending.take() {
                let opposite_open = tracker
                    .position()
                    .map(|p| p.direction == entry.direction.opposite())
                    .unwrap_or(false);
                if !opposite_open || self.config.exit_on_opposite {
                    let stop = self
                        .config
                        .stop
                        .as_ref()
                        .map(|s| s.build(entry.direction, candle.open, entry.stop_seed));
                    if let Some(closed) =
                        tracker.on_entry(entry.direction, candle.open_time, candle.open, stop)
                    {
                        positions.push(closed);
                    }
                }
            }

            // 2. Stop check against this candle, using the level carried
            //    over from previous observations.
            if let Some(position) = tracker.position() {
                let price = match self.config.driver.granularity {
                    StopGranularity::Close => candle.close,
                    StopGranularity::Intrabar => match position.direction {
                        Direction::Long => candle.low,
                        Direction::Short => candle.high,
                    },
                };
                if let Some(closed) = tracker.check_stop(candle.open_time, price) {
                    positions.push(closed);
                }
            }

            // 3. Advance extremes and the trailing stop with this candle.
            tracker.observe(&StopView::from_candle(candle, stop_at(t)));

            // 4. Detect at the boundary just closed: rolling window of
            //    closed candles plus the synthetic forming candle.
            let start = (t + 1).saturating_sub(rolling);
            let mut window: Vec<Candle> = candles[start..=t].to_vec();
            let spacing = if t > 0 {
                candle.open_time - candles[t - 1].open_time
            } else {
                Duration::minutes(1)
            };
            window.push(Candle::forming(candle.open_time + spacing, candle.close));

            let mut generator = build_generator(&self.config.generator);
            let detected = generator.detect(&window)?;

            for signal in detected {
                if signal.timestamp != candle.open_time {
                    // Re-detection of an older boundary inside the rolling
                    // window; it was already handled when it was current.
                    continue;
                }
                metrics.record(&signal);
                match signal.action {
                    SignalAction::Exit => {
                        if let Some(closed) =
                            tracker.on_exit(signal.direction, candle.open_time, candle.close)
                        {
                            positions.push(closed);
                        }
                    }
                    SignalAction::Entry => {
                        pending = Some(PendingEntry {
                            direction: signal.direction,
                            stop_seed: stop_at(t),
                        });
                    }
                }
                kept.push(signal);
            }
        }

        // End of data closes whatever is still open at the last close.
        let last = &candles[candles.len() - 1];
        if let Some(closed) = tracker.close_end_of_data(last.open_time, last.close) {
            positions.push(closed);
        }

        Ok(BacktestReport {
            signals: kept,
            positions,
            metrics,
            candles_processed: candles.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DriverConfig, GeneratorConfig, StopConfig};
    use crate::domain::ExitReason;
    use chrono::TimeZone;

    fn candles_from_closes(closes: &[f64]) -> Vec<Candle> {
        let base = chrono::Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| {
                let open = if i == 0 { close } else { closes[i - 1] };
                Candle {
                    open_time: base + Duration::minutes(i as i64),
                    open,
                    high: open.max(close) + 1.0,
                    low: open.min(close) - 1.0,
                    close,
                    volume: 1000.0,
                }
            })
            .collect()
    }

    /// Golden cross at index 8, death cross at index 14 for VWMA 2/5.
    fn round_trip_closes() -> Vec<f64> {
        vec![
            110.0, 108.0, 106.0, 104.0, 102.0, 100.0, 98.0, 96.0, 105.0, 112.0, 120.0, 128.0,
            136.0, 120.0, 100.0, 90.0, 85.0,
        ]
    }

    fn config(stop: Option<StopConfig>) -> StrategyConfig {
        StrategyConfig {
            generator: GeneratorConfig::VwmaCross {
                fast_period: 2,
                slow_period: 5,
                min_gap: 0.0,
                gap_window: 0,
            },
            stop,
            exit_on_opposite: true,
            driver: DriverConfig::default(),
        }
    }

    #[test]
    fn round_trip_without_stop() {
        let candles = candles_from_closes(&round_trip_closes());
        let config = config(None);
        config.validate().unwrap();
        let report = BacktestDriver::new(&config).run(&candles).unwrap();

        assert_eq!(report.positions.len(), 2);

        // Long opened at the open of the candle after the golden-cross
        // boundary, closed by the exit signal at the death-cross close.
        let long = &report.positions[0];
        assert_eq!(long.direction, Direction::Long);
        assert_eq!(long.entry_price, candles[9].open);
        assert_eq!(long.exit_reason, ExitReason::ExitSignal);
        assert_eq!(long.exit_price, candles[14].close);
        assert_eq!(long.entry_time, candles[9].open_time);

        // Short opened at the next open, closed at end of data.
        let short = &report.positions[1];
        assert_eq!(short.direction, Direction::Short);
        assert_eq!(short.entry_price, candles[15].open);
        assert_eq!(short.exit_reason, ExitReason::EndOfData);
        assert_eq!(short.exit_price, candles[16].close);

        // Signal stream carries the long entry, the exit, the short entry.
        assert_eq!(report.metrics.entry_count, 2);
        assert_eq!(report.metrics.exit_count, 1);
    }

    #[test]
    fn percent_stop_preempts_exit_signal() {
        let candles = candles_from_closes(&round_trip_closes());
        let config = config(Some(StopConfig::Percent { trail_pct: 0.05 }));
        config.validate().unwrap();
        let report = BacktestDriver::new(&config).run(&candles).unwrap();

        let long = &report.positions[0];
        assert_eq!(long.direction, Direction::Long);
        assert_eq!(long.exit_reason, ExitReason::StopHit);
        // The stop fires on the first pullback candle, before the
        // death-cross exit signal at index 14.
        assert!(long.exit_time < candles[14].open_time);
        // Closed at the stop level, which had ratcheted above entry.
        assert!(long.exit_price > long.entry_price);
    }

    #[test]
    fn replay_is_byte_identical() {
        let candles = candles_from_closes(&round_trip_closes());
        let config = config(Some(StopConfig::Percent { trail_pct: 0.05 }));
        let a = BacktestDriver::new(&config).run(&candles).unwrap();
        let b = BacktestDriver::new(&config).run(&candles).unwrap();
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn intrabar_stop_fires_no_later_than_close() {
        let candles = candles_from_closes(&round_trip_closes());
        let mut close_config = config(Some(StopConfig::Percent { trail_pct: 0.05 }));
        close_config.driver.granularity = StopGranularity::Close;
        let mut intrabar_config = close_config.clone();
        intrabar_config.driver.granularity = StopGranularity::Intrabar;

        let by_close = BacktestDriver::new(&close_config).run(&candles).unwrap();
        let by_low = BacktestDriver::new(&intrabar_config).run(&candles).unwrap();

        let close_hit = by_close
            .positions
            .iter()
            .find(|p| p.exit_reason == ExitReason::StopHit)
            .unwrap();
        let low_hit = by_low
            .positions
            .iter()
            .find(|p| p.exit_reason == ExitReason::StopHit)
            .unwrap();
        assert!(low_hit.exit_time <= close_hit.exit_time);
    }

    #[test]
    fn too_short_series_is_an_error() {
        let candles = candles_from_closes(&[100.0, 101.0, 102.0]);
        let config = config(None);
        assert!(matches!(
            BacktestDriver::new(&config).run(&candles),
            Err(DetectError::InsufficientHistory { .. })
        ));
    }

    #[test]
    fn rolling_window_below_warmup_is_an_error() {
        let candles = candles_from_closes(&round_trip_closes());
        let mut config = config(None);
        config.driver.rolling_window = 3;
        assert!(matches!(
            BacktestDriver::new(&config).run(&candles),
            Err(DetectError::InsufficientHistory { .. })
        ));
    }

    #[test]
    fn unsorted_series_is_an_error() {
        let mut candles = candles_from_closes(&round_trip_closes());
        candles.swap(3, 4);
        let config = config(None);
        assert!(matches!(
            BacktestDriver::new(&config).run(&candles),
            Err(DetectError::Series(_))
        ));
    }

    #[test]
    fn exit_on_opposite_false_keeps_position() {
        let candles = candles_from_closes(&round_trip_closes());
        let mut config = config(Some(StopConfig::Percent { trail_pct: 0.30 }));
        config.exit_on_opposite = false;
        config.validate().unwrap();
        let report = BacktestDriver::new(&config).run(&candles).unwrap();

        // The explicit exit signal closes the long at the death-cross
        // close; with opposite-exit routing disabled no position may ever
        // close by OppositeEntry.
        let reasons: Vec<_> = report.positions.iter().map(|p| p.exit_reason).collect();
        assert!(reasons.contains(&ExitReason::ExitSignal));
        assert!(!reasons.contains(&ExitReason::OppositeEntry));
    }
}
