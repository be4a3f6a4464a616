//! VWMA crossover signal generator.
//!
//! Fires Long when the fast VWMA crosses above the slow VWMA, Short on the
//! opposite cross. A cross whose gap is initially below the threshold can
//! still confirm if the gap widens within the following `gap_window` closed
//! bars; the scan never reaches past the last closed candle. Deferred
//! confirmation therefore only takes effect in batch detection over a
//! longer closed series: a cross sitting at the last closed bar must
//! already carry a wide-enough gap to fire there, which keeps
//! bar-by-bar replay free of look-ahead.

use crate::domain::{
    Candle, Direction, EntryRef, Signal, SignalAction, SignalDetails, SignalMode,
};
use crate::error::DetectError;
use crate::indicators::{precompute, Indicator, Vwma};

use super::cross::{crossed, gap, gap_valid_within, CrossDirection};
use super::metrics::SignalMetrics;
use super::{SignalGenerator, TrackedSignal};

/// VWMA fast/slow crossover generator with deferred gap confirmation.
pub struct VwmaCross {
    fast_period: usize,
    slow_period: usize,
    /// Minimum absolute fast/slow gap for a cross to count.
    min_gap: f64,
    /// How many bars after the cross the gap may still confirm.
    gap_window: usize,
    fast_key: String,
    slow_key: String,
    indicators: Vec<Box<dyn Indicator>>,
    cursor: Option<usize>,
    open_long: Option<EntryRef>,
    open_short: Option<EntryRef>,
    metrics: SignalMetrics,
    tracked: Vec<TrackedSignal>,
}

impl VwmaCross {
    pub fn new(fast_period: usize, slow_period: usize, min_gap: f64, gap_window: usize) -> Self {
        assert!(fast_period >= 1, "fast_period must be >= 1");
        assert!(
            slow_period > fast_period,
            "slow_period must be > fast_period"
        );

        Self {
            fast_period,
            slow_period,
            min_gap,
            gap_window,
            fast_key: format!("vwma_{fast_period}"),
            slow_key: format!("vwma_{slow_period}"),
            indicators: vec![
                Box::new(Vwma::new(fast_period)),
                Box::new(Vwma::new(slow_period)),
            ],
            cursor: None,
            open_long: None,
            open_short: None,
            metrics: SignalMetrics::new(),
            tracked: Vec::new(),
        }
    }

    fn open_mut(&mut self, direction: Direction) -> &mut Option<EntryRef> {
        match direction {
            Direction::Long => &mut self.open_long,
            Direction::Short => &mut self.open_short,
        }
    }

    fn emit(&mut self, signal: Signal, out: &mut Vec<Signal>) {
        self.metrics.record(&signal);
        out.push(signal);
    }
}

impl SignalGenerator for VwmaCross {
    fn name(&self) -> &str {
        "vwma_cross"
    }

    fn warmup(&self) -> usize {
        // One closed bar past the slow VWMA warm-up, for the previous value
        // of the cross check.
        self.slow_period
    }

    fn detect(&mut self, candles: &[Candle]) -> Result<Vec<Signal>, DetectError> {
        // The last candle is the still-forming one; with fewer than two
        // candles there is nothing closed to evaluate.
        if candles.len() < 2 {
            return Ok(Vec::new());
        }
        let last_closed = candles.len() - 2;
        if last_closed < self.warmup() {
            return Err(DetectError::InsufficientHistory {
                indicator: self.slow_key.clone(),
                required: self.warmup() + 2,
                len: candles.len(),
            });
        }

        let values = precompute(candles, &self.indicators);
        let fast = values
            .get_series(&self.fast_key)
            .expect("fast series was just computed");
        let slow = values
            .get_series(&self.slow_key)
            .expect("slow series was just computed");

        let start = self.cursor.map_or(1, |c| c + 1);
        let mut signals = Vec::new();

        for i in start..=last_closed {
            let cross = match crossed(fast, slow, i) {
                Some(c) => c,
                None => continue,
            };
            let direction = match cross {
                CrossDirection::Up => Direction::Long,
                CrossDirection::Down => Direction::Short,
            };

            let confirmed_after =
                match gap_valid_within(fast, slow, i, self.min_gap, self.gap_window, last_closed) {
                    Some(after) => after,
                    None => {
                        self.tracked.push(TrackedSignal {
                            index: i,
                            direction,
                            window_start: i,
                            window_end: (i + self.gap_window).min(last_closed),
                            found: vec!["cross".into()],
                            missing: vec!["gap".into()],
                            rejection: Some("gap below threshold within window".into()),
                        });
                        continue;
                    }
                };

            let candle = &candles[i];
            let details = SignalDetails::VwmaCross {
                fast: fast[i],
                slow: slow[i],
                gap: gap(fast, slow, i + confirmed_after),
                gap_confirmed_after: confirmed_after,
            };

            // A cross against an open opposite position exits it first.
            if let Some(entry) = self.open_mut(direction.opposite()).take() {
                let exit = Signal {
                    timestamp: candle.open_time,
                    action: SignalAction::Exit,
                    direction: direction.opposite(),
                    price: candle.close,
                    confidence: 1.0,
                    mode: SignalMode::Trend,
                    details: details.clone(),
                    closes: Some(entry),
                };
                self.emit(exit, &mut signals);
            }

            // Per-direction gating: no second entry while one is open.
            if self.open_mut(direction).is_some() {
                self.tracked.push(TrackedSignal {
                    index: i,
                    direction,
                    window_start: i,
                    window_end: i,
                    found: vec!["cross".into(), "gap".into()],
                    missing: Vec::new(),
                    rejection: Some("entry already open".into()),
                });
                continue;
            }

            *self.open_mut(direction) = Some(EntryRef {
                entry_time: candle.open_time,
                entry_price: candle.close,
            });
            let entry = Signal {
                timestamp: candle.open_time,
                action: SignalAction::Entry,
                direction,
                price: candle.close,
                confidence: 1.0,
                mode: SignalMode::Trend,
                details,
                closes: None,
            };
            self.emit(entry, &mut signals);
            self.tracked.push(TrackedSignal {
                index: i,
                direction,
                window_start: i,
                window_end: i,
                found: vec!["cross".into(), "gap".into()],
                missing: Vec::new(),
                rejection: None,
            });
        }

        self.cursor = Some(last_closed);
        Ok(signals)
    }

    fn metrics(&self) -> &SignalMetrics {
        &self.metrics
    }

    fn tracked(&self) -> &[TrackedSignal] {
        &self.tracked
    }
}
