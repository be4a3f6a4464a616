//! Windowed multi-condition signal matcher.
//!
//! One generic state machine replaces a family of per-strategy variants:
//! a *trigger* (a crossover, or a qualifying candle) anchors a candidate
//! window and fixes its direction; enabled [`Condition`] providers must then
//! each be satisfied somewhere inside the window; the candle validation gate
//! must hold on the single trigger bar. The signal fires on the first bar,
//! scanning forward from the anchor, at which everything holds at once —
//! and firing resets both candidate windows, so one underlying move cannot
//! fire twice.

use crate::domain::{
    Candle, Direction, EntryRef, Signal, SignalAction, SignalDetails, SignalMode,
};
use crate::error::DetectError;
use crate::indicators::{max_lookback, precompute, Indicator, IndicatorValues};

use super::conditions::{Condition, ConditionCtx, ConditionGrade, ConditionHit, ConditionState};
use super::cross::{crossed, CrossDirection};
use super::metrics::SignalMetrics;
use super::{SignalGenerator, TrackedSignal};

/// What anchors a candidate window.
#[derive(Debug, Clone)]
pub enum Trigger {
    /// Fast/slow VWMA crossover.
    VwmaCross { fast_key: String, slow_key: String },
    /// +DI/-DI crossover.
    DiCross { plus_key: String, minus_key: String },
    /// Stochastic %K/%D crossover.
    StochCross { k_key: String, d_key: String },
    /// No crossover configured: a candle passing the validation gate is
    /// the trigger, its color fixing the direction.
    Candle,
}

impl Trigger {
    fn is_cross(&self) -> bool {
        !matches!(self, Trigger::Candle)
    }
}

/// Window geometry around the anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowPolicy {
    /// Trailing window `[i - size + 1 ..= i]` sliding per evaluated index;
    /// the anchor expires once it falls out of the window.
    Sliding(usize),
    /// Window `[a - size/2 ..= a + size]` fixed by the anchor `a`; the
    /// candidate expires once the evaluated index passes `a + size`.
    Anchored(usize),
}

impl WindowPolicy {
    pub fn size(self) -> usize {
        match self {
            WindowPolicy::Sliding(s) | WindowPolicy::Anchored(s) => s,
        }
    }
}

/// Candle validation gate, applied on the trigger bar only.
#[derive(Debug, Clone)]
pub struct CandleGate {
    /// ATR series key used to normalize the candle body.
    pub atr_key: String,
    /// Minimum body size as a multiple of ATR.
    pub min_body_atr: f64,
    /// Minimum volume as a multiple of mean volume, when set.
    pub min_volume_ratio: Option<f64>,
    /// Trailing bars over which mean volume is taken.
    pub volume_lookback: usize,
}

impl CandleGate {
    /// Check the gate for one candle. Returns the body/ATR ratio on pass.
    fn check(
        &self,
        candles: &[Candle],
        values: &IndicatorValues,
        index: usize,
        direction: Direction,
    ) -> Option<f64> {
        let candle = &candles[index];
        let color_ok = match direction {
            Direction::Long => candle.is_bullish(),
            Direction::Short => candle.is_bearish(),
        };
        if !color_ok {
            return None;
        }

        let atr = match values.get(&self.atr_key, index) {
            Some(v) if v.is_finite() && v > 0.0 => v,
            _ => return None,
        };
        let ratio = candle.body() / atr;
        if ratio < self.min_body_atr {
            return None;
        }

        if let Some(min_ratio) = self.min_volume_ratio {
            let start = index.saturating_sub(self.volume_lookback.saturating_sub(1));
            let window = &candles[start..=index];
            let mean = window.iter().map(|c| c.volume).sum::<f64>() / window.len() as f64;
            if mean <= 0.0 || candle.volume < min_ratio * mean {
                return None;
            }
        }

        Some(ratio)
    }
}

/// A live candidate window awaiting its trigger bar.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    anchor: usize,
}

/// Generic windowed multi-condition matcher.
pub struct WindowMatcher {
    name: String,
    indicators: Vec<Box<dyn Indicator>>,
    trigger: Trigger,
    policy: WindowPolicy,
    conditions: Vec<Box<dyn Condition>>,
    candle_gate: Option<CandleGate>,
    cursor: Option<usize>,
    long_candidate: Option<Candidate>,
    short_candidate: Option<Candidate>,
    open_long: Option<EntryRef>,
    open_short: Option<EntryRef>,
    metrics: SignalMetrics,
    tracked: Vec<TrackedSignal>,
}

impl WindowMatcher {
    pub fn new(
        name: impl Into<String>,
        indicators: Vec<Box<dyn Indicator>>,
        trigger: Trigger,
        policy: WindowPolicy,
        conditions: Vec<Box<dyn Condition>>,
        candle_gate: Option<CandleGate>,
    ) -> Self {
        assert!(policy.size() >= 1, "window size must be >= 1");
        if matches!(trigger, Trigger::Candle) {
            assert!(
                candle_gate.is_some(),
                "candle trigger requires a candle validation gate"
            );
        }

        Self {
            name: name.into(),
            indicators,
            trigger,
            policy,
            conditions,
            candle_gate,
            cursor: None,
            long_candidate: None,
            short_candidate: None,
            open_long: None,
            open_short: None,
            metrics: SignalMetrics::new(),
            tracked: Vec::new(),
        }
    }

    /// A configuration with zero active gates emits nothing.
    fn has_active_gates(&self) -> bool {
        !self.conditions.is_empty() || self.candle_gate.is_some()
    }

    fn candidate_mut(&mut self, direction: Direction) -> &mut Option<Candidate> {
        match direction {
            Direction::Long => &mut self.long_candidate,
            Direction::Short => &mut self.short_candidate,
        }
    }

    fn open_mut(&mut self, direction: Direction) -> &mut Option<EntryRef> {
        match direction {
            Direction::Long => &mut self.open_long,
            Direction::Short => &mut self.open_short,
        }
    }

    /// Crossover trigger direction at `index`, if any.
    fn cross_trigger(&self, values: &IndicatorValues, index: usize) -> Option<Direction> {
        let (a_key, b_key) = match &self.trigger {
            Trigger::VwmaCross { fast_key, slow_key } => (fast_key, slow_key),
            Trigger::DiCross {
                plus_key,
                minus_key,
            } => (plus_key, minus_key),
            Trigger::StochCross { k_key, d_key } => (k_key, d_key),
            Trigger::Candle => return None,
        };
        let a = values.get_series(a_key)?;
        let b = values.get_series(b_key)?;
        match crossed(a, b, index)? {
            CrossDirection::Up => Some(Direction::Long),
            CrossDirection::Down => Some(Direction::Short),
        }
    }

    /// Window bounds for a candidate with anchor `a`, evaluated at `i`.
    /// `None` when the candidate has expired.
    fn window_bounds(&self, anchor: usize, i: usize) -> Option<(usize, usize)> {
        match self.policy {
            WindowPolicy::Sliding(size) => {
                let start = i.saturating_sub(size - 1);
                if anchor < start {
                    return None;
                }
                Some((start, i))
            }
            WindowPolicy::Anchored(size) => {
                if i > anchor + size {
                    return None;
                }
                Some((anchor.saturating_sub(size / 2), anchor + size))
            }
        }
    }

    /// Evaluate one candidate at bar `i`. Returns the fired signal, if any.
    fn try_fire(
        &mut self,
        direction: Direction,
        anchor: usize,
        i: usize,
        candles: &[Candle],
        values: &IndicatorValues,
    ) -> Option<Signal> {
        let (window_start, window_end) = match self.window_bounds(anchor, i) {
            Some(bounds) => bounds,
            None => {
                *self.candidate_mut(direction) = None;
                return None;
            }
        };
        // Conditions may only accumulate over closed bars up to `i`.
        let scan_end = window_end.min(i);

        let ctx = ConditionCtx { candles, values };
        let mut found = Vec::new();
        let mut missing = Vec::new();
        let mut hits: Vec<ConditionHit> = Vec::new();
        let mut unavailable_at_bar = false;

        for condition in &self.conditions {
            // Rule: a condition that cannot be evaluated at the trigger bar
            // disqualifies that bar, regardless of the rest of the window.
            if condition.check(&ctx, i) == ConditionState::Unavailable {
                unavailable_at_bar = true;
            }

            let mut hit = None;
            for j in window_start..=scan_end {
                if let ConditionState::Met(h) = condition.check(&ctx, j) {
                    if h.supports(direction) {
                        hit = Some(h);
                        break;
                    }
                }
            }
            match hit {
                Some(h) => {
                    hits.push(h);
                    found.push(condition.name().to_string());
                }
                None => missing.push(condition.name().to_string()),
            }
        }

        let record = |rejection: Option<String>| TrackedSignal {
            index: i,
            direction,
            window_start,
            window_end,
            found: found.clone(),
            missing: missing.clone(),
            rejection,
        };

        if unavailable_at_bar {
            let t = record(Some("condition unavailable at bar".into()));
            self.tracked.push(t);
            return None;
        }
        if !missing.is_empty() {
            let t = record(Some("conditions missing in window".into()));
            self.tracked.push(t);
            return None;
        }

        let body_atr_ratio = match &self.candle_gate {
            Some(gate) => match gate.check(candles, values, i, direction) {
                Some(ratio) => ratio,
                None => {
                    let t = record(Some("candle validation failed".into()));
                    self.tracked.push(t);
                    return None;
                }
            },
            None => f64::NAN,
        };

        // Classification: TREND only when every piece of directional
        // evidence is crossover-grade; relative-position or band evidence
        // alone downgrades the signal to COUNTER-TREND.
        let mut directional_grades: Vec<ConditionGrade> = hits
            .iter()
            .filter(|h| h.direction.is_some())
            .map(|h| h.grade)
            .collect();
        if self.trigger.is_cross() {
            directional_grades.push(ConditionGrade::Crossover);
        }
        let mode = if !directional_grades.is_empty()
            && directional_grades
                .iter()
                .all(|g| *g == ConditionGrade::Crossover)
        {
            SignalMode::Trend
        } else {
            SignalMode::CounterTrend
        };

        let mut weights: Vec<f64> = hits.iter().map(|h| h.grade.weight()).collect();
        if self.trigger.is_cross() {
            weights.push(ConditionGrade::Crossover.weight());
        }
        if self.candle_gate.is_some() {
            weights.push(ConditionGrade::Band.weight());
        }
        let confidence = (weights.iter().sum::<f64>() / weights.len() as f64).clamp(0.0, 1.0);

        let candle = &candles[i];
        let signal = Signal {
            timestamp: candle.open_time,
            action: SignalAction::Entry,
            direction,
            price: candle.close,
            confidence,
            mode,
            details: SignalDetails::Windowed {
                anchor_index: anchor,
                window_start,
                window_end,
                trigger_index: i,
                conditions_found: found.len(),
                conditions_enabled: self.conditions.len(),
                body_atr_ratio,
            },
            closes: None,
        };

        let t = record(None);
        self.tracked.push(t);
        Some(signal)
    }

    fn emit(&mut self, signal: Signal, out: &mut Vec<Signal>) {
        self.metrics.record(&signal);
        out.push(signal);
    }

    /// Route a fired entry through the per-direction position gates:
    /// exit an open opposite position first, then enter unless the same
    /// direction is already open.
    fn route(&mut self, fired: Signal, out: &mut Vec<Signal>) {
        let direction = fired.direction;
        if let Some(entry) = self.open_mut(direction.opposite()).take() {
            let exit = Signal {
                timestamp: fired.timestamp,
                action: SignalAction::Exit,
                direction: direction.opposite(),
                price: fired.price,
                confidence: fired.confidence,
                mode: fired.mode,
                details: fired.details.clone(),
                closes: Some(entry),
            };
            self.emit(exit, out);
        }

        if self.open_mut(direction).is_some() {
            // Same-direction position already open; the move was consumed.
            return;
        }
        *self.open_mut(direction) = Some(EntryRef {
            entry_time: fired.timestamp,
            entry_price: fired.price,
        });
        self.emit(fired, out);
    }
}

impl SignalGenerator for WindowMatcher {
    fn name(&self) -> &str {
        &self.name
    }

    fn warmup(&self) -> usize {
        max_lookback(&self.indicators) + 1
    }

    fn detect(&mut self, candles: &[Candle]) -> Result<Vec<Signal>, DetectError> {
        if candles.len() < 2 || !self.has_active_gates() {
            return Ok(Vec::new());
        }
        let last_closed = candles.len() - 2;
        if last_closed < self.warmup() {
            let deepest = self
                .indicators
                .iter()
                .max_by_key(|ind| ind.lookback())
                .map(|ind| ind.name().to_string())
                .unwrap_or_else(|| self.name.clone());
            return Err(DetectError::InsufficientHistory {
                indicator: deepest,
                required: self.warmup() + 2,
                len: candles.len(),
            });
        }

        let values = precompute(candles, &self.indicators);
        // Index 0 is a valid candle-trigger bar; cross triggers and
        // slope-style conditions skip it on their own (no previous value).
        let start = self.cursor.map_or(0, |c| c + 1);
        let mut signals = Vec::new();

        for i in start..=last_closed {
            // Anchor selection: a fresh trigger re-anchors its direction's
            // candidate to the most recent occurrence.
            let mut triggered = [false, false];
            if matches!(self.trigger, Trigger::Candle) {
                let gate = self
                    .candle_gate
                    .as_ref()
                    .expect("candle trigger always carries a gate");
                triggered[0] = gate.check(candles, &values, i, Direction::Long).is_some();
                triggered[1] = gate.check(candles, &values, i, Direction::Short).is_some();
            } else if let Some(direction) = self.cross_trigger(&values, i) {
                match direction {
                    Direction::Long => triggered[0] = true,
                    Direction::Short => triggered[1] = true,
                }
            }
            if triggered[0] {
                self.long_candidate = Some(Candidate { anchor: i });
            }
            if triggered[1] {
                self.short_candidate = Some(Candidate { anchor: i });
            }

            // Long is evaluated before Short when both could fire.
            for direction in [Direction::Long, Direction::Short] {
                let anchor = match *self.candidate_mut(direction) {
                    Some(Candidate { anchor }) => anchor,
                    None => continue,
                };
                if let Some(fired) = self.try_fire(direction, anchor, i, candles, &values) {
                    self.route(fired, &mut signals);
                    // Edge-triggering: one fire consumes both windows.
                    self.long_candidate = None;
                    self.short_candidate = None;
                    break;
                }
            }
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
