//! Pluggable sub-conditions for the windowed matcher.
//!
//! Each provider inspects precomputed indicator series at one candle index
//! and reports whether its gate is met, for which direction, and at what
//! grade. Crossover-grade evidence is required for a TREND classification;
//! relative-position evidence only supports COUNTER-TREND. A NaN input makes
//! the condition `Unavailable`, which disqualifies the inspected bar for
//! triggering (but not the whole window).

use crate::domain::{Candle, Direction};
use crate::indicators::IndicatorValues;

use super::cross::{crossed, CrossDirection};

/// Strength class of a met condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionGrade {
    /// A sign-flip crossover on this bar. Strongest evidence.
    Crossover,
    /// Relative position only (e.g., +DI above -DI without a cross).
    Relative,
    /// Extreme-band membership (oversold/overbought style gates).
    Band,
}

impl ConditionGrade {
    /// Contribution to signal confidence.
    pub fn weight(self) -> f64 {
        match self {
            ConditionGrade::Crossover => 1.0,
            ConditionGrade::Relative => 0.7,
            ConditionGrade::Band => 0.85,
        }
    }
}

/// A met condition: which direction it supports and at what grade.
/// `direction: None` means direction-neutral (regime gates).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConditionHit {
    pub direction: Option<Direction>,
    pub grade: ConditionGrade,
}

impl ConditionHit {
    /// Whether this hit is compatible with a candidate direction.
    pub fn supports(&self, candidate: Direction) -> bool {
        self.direction.map_or(true, |d| d == candidate)
    }
}

/// Outcome of evaluating one condition at one index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConditionState {
    /// An input value is NaN or missing; the bar cannot be evaluated.
    Unavailable,
    NotMet,
    Met(ConditionHit),
}

/// Everything a condition may inspect at evaluation time.
pub struct ConditionCtx<'a> {
    pub candles: &'a [Candle],
    pub values: &'a IndicatorValues,
}

/// Trait for window sub-conditions.
pub trait Condition: Send + Sync {
    /// Stable name used in diagnostics (e.g., "di_cross", "mfi_band").
    fn name(&self) -> &'static str;

    /// Evaluate the condition at candle `index`.
    fn check(&self, ctx: &ConditionCtx<'_>, index: usize) -> ConditionState;
}

fn fetch(ctx: &ConditionCtx<'_>, key: &str, index: usize) -> Option<f64> {
    match ctx.values.get(key, index) {
        Some(v) if !v.is_nan() => Some(v),
        _ => None,
    }
}

fn direction_of(cross: CrossDirection) -> Direction {
    match cross {
        CrossDirection::Up => Direction::Long,
        CrossDirection::Down => Direction::Short,
    }
}

// ─── VWMA slope ──────────────────────────────────────────────────────

/// VWMA slope gate: the percent change of the VWMA over one bar must reach
/// `min_slope_pct` in magnitude. Slope sign fixes the direction.
pub struct VwmaSlope {
    pub key: String,
    pub min_slope_pct: f64,
}

impl Condition for VwmaSlope {
    fn name(&self) -> &'static str {
        "vwma_slope"
    }

    fn check(&self, ctx: &ConditionCtx<'_>, index: usize) -> ConditionState {
        if index == 0 {
            return ConditionState::Unavailable;
        }
        let (prev, cur) = match (fetch(ctx, &self.key, index - 1), fetch(ctx, &self.key, index)) {
            (Some(p), Some(c)) if p != 0.0 => (p, c),
            _ => return ConditionState::Unavailable,
        };
        let slope_pct = (cur - prev) / prev * 100.0;
        if slope_pct.abs() < self.min_slope_pct {
            return ConditionState::NotMet;
        }
        let direction = if slope_pct > 0.0 {
            Direction::Long
        } else {
            Direction::Short
        };
        ConditionState::Met(ConditionHit {
            direction: Some(direction),
            grade: ConditionGrade::Relative,
        })
    }
}

// ─── DI dominance ────────────────────────────────────────────────────

/// How the +DI/-DI pair is compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiMode {
    /// +DI/-DI crossover on this bar (TREND-capable).
    Crossover,
    /// +DI above or below -DI, no cross required (COUNTER-TREND only).
    Position,
}

/// Directional index dominance gate.
pub struct DiBalance {
    pub plus_key: String,
    pub minus_key: String,
    pub mode: DiMode,
}

impl Condition for DiBalance {
    fn name(&self) -> &'static str {
        match self.mode {
            DiMode::Crossover => "di_cross",
            DiMode::Position => "di_position",
        }
    }

    fn check(&self, ctx: &ConditionCtx<'_>, index: usize) -> ConditionState {
        let (plus, minus) = match (
            fetch(ctx, &self.plus_key, index),
            fetch(ctx, &self.minus_key, index),
        ) {
            (Some(p), Some(m)) => (p, m),
            _ => return ConditionState::Unavailable,
        };

        match self.mode {
            DiMode::Crossover => {
                let plus_series = match ctx.values.get_series(&self.plus_key) {
                    Some(s) => s,
                    None => return ConditionState::Unavailable,
                };
                let minus_series = match ctx.values.get_series(&self.minus_key) {
                    Some(s) => s,
                    None => return ConditionState::Unavailable,
                };
                match crossed(plus_series, minus_series, index) {
                    Some(c) => ConditionState::Met(ConditionHit {
                        direction: Some(direction_of(c)),
                        grade: ConditionGrade::Crossover,
                    }),
                    None => ConditionState::NotMet,
                }
            }
            DiMode::Position => {
                if plus == minus {
                    return ConditionState::NotMet;
                }
                let direction = if plus > minus {
                    Direction::Long
                } else {
                    Direction::Short
                };
                ConditionState::Met(ConditionHit {
                    direction: Some(direction),
                    grade: ConditionGrade::Relative,
                })
            }
        }
    }
}

// ─── DX/ADX momentum ─────────────────────────────────────────────────

/// DX vs ADX gate: DX crossing above ADX means directional momentum is
/// building. Direction-neutral — it strengthens whichever candidate
/// direction the window already carries.
pub struct DxAdx {
    pub dx_key: String,
    pub adx_key: String,
}

impl Condition for DxAdx {
    fn name(&self) -> &'static str {
        "dx_adx"
    }

    fn check(&self, ctx: &ConditionCtx<'_>, index: usize) -> ConditionState {
        let (dx, adx) = match (fetch(ctx, &self.dx_key, index), fetch(ctx, &self.adx_key, index)) {
            (Some(d), Some(a)) => (d, a),
            _ => return ConditionState::Unavailable,
        };

        let dx_series = ctx.values.get_series(&self.dx_key);
        let adx_series = ctx.values.get_series(&self.adx_key);
        if let (Some(ds), Some(as_)) = (dx_series, adx_series) {
            if crossed(ds, as_, index) == Some(CrossDirection::Up) {
                return ConditionState::Met(ConditionHit {
                    direction: None,
                    grade: ConditionGrade::Crossover,
                });
            }
        }
        if dx > adx {
            ConditionState::Met(ConditionHit {
                direction: None,
                grade: ConditionGrade::Relative,
            })
        } else {
            ConditionState::NotMet
        }
    }
}

// ─── MACD ────────────────────────────────────────────────────────────

/// Which aspect of MACD the gate inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacdMode {
    /// Sign of the MACD line.
    Sign,
    /// Sign of the histogram.
    Histogram,
    /// MACD/signal-line crossover on this bar.
    Cross,
}

pub struct MacdGate {
    pub macd_key: String,
    pub signal_key: String,
    pub hist_key: String,
    pub mode: MacdMode,
}

impl Condition for MacdGate {
    fn name(&self) -> &'static str {
        match self.mode {
            MacdMode::Sign => "macd_sign",
            MacdMode::Histogram => "macd_hist",
            MacdMode::Cross => "macd_cross",
        }
    }

    fn check(&self, ctx: &ConditionCtx<'_>, index: usize) -> ConditionState {
        match self.mode {
            MacdMode::Sign => match fetch(ctx, &self.macd_key, index) {
                Some(v) if v > 0.0 => ConditionState::Met(ConditionHit {
                    direction: Some(Direction::Long),
                    grade: ConditionGrade::Relative,
                }),
                Some(v) if v < 0.0 => ConditionState::Met(ConditionHit {
                    direction: Some(Direction::Short),
                    grade: ConditionGrade::Relative,
                }),
                Some(_) => ConditionState::NotMet,
                None => ConditionState::Unavailable,
            },
            MacdMode::Histogram => match fetch(ctx, &self.hist_key, index) {
                Some(v) if v > 0.0 => ConditionState::Met(ConditionHit {
                    direction: Some(Direction::Long),
                    grade: ConditionGrade::Relative,
                }),
                Some(v) if v < 0.0 => ConditionState::Met(ConditionHit {
                    direction: Some(Direction::Short),
                    grade: ConditionGrade::Relative,
                }),
                Some(_) => ConditionState::NotMet,
                None => ConditionState::Unavailable,
            },
            MacdMode::Cross => {
                if fetch(ctx, &self.macd_key, index).is_none()
                    || fetch(ctx, &self.signal_key, index).is_none()
                {
                    return ConditionState::Unavailable;
                }
                let macd = ctx.values.get_series(&self.macd_key);
                let signal = ctx.values.get_series(&self.signal_key);
                match (macd, signal) {
                    (Some(m), Some(s)) => match crossed(m, s, index) {
                        Some(c) => ConditionState::Met(ConditionHit {
                            direction: Some(direction_of(c)),
                            grade: ConditionGrade::Crossover,
                        }),
                        None => ConditionState::NotMet,
                    },
                    _ => ConditionState::Unavailable,
                }
            }
        }
    }
}

// ─── Stochastic ──────────────────────────────────────────────────────

/// Which aspect of the stochastic the gate inspects.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StochMode {
    /// %K in an extreme band: oversold supports Long, overbought Short.
    Extreme { oversold: f64, overbought: f64 },
    /// %K/%D crossover on this bar.
    Cross,
}

pub struct StochGate {
    pub k_key: String,
    pub d_key: String,
    pub mode: StochMode,
}

impl Condition for StochGate {
    fn name(&self) -> &'static str {
        match self.mode {
            StochMode::Extreme { .. } => "stoch_extreme",
            StochMode::Cross => "stoch_cross",
        }
    }

    fn check(&self, ctx: &ConditionCtx<'_>, index: usize) -> ConditionState {
        match self.mode {
            StochMode::Extreme {
                oversold,
                overbought,
            } => match fetch(ctx, &self.k_key, index) {
                Some(k) if k <= oversold => ConditionState::Met(ConditionHit {
                    direction: Some(Direction::Long),
                    grade: ConditionGrade::Band,
                }),
                Some(k) if k >= overbought => ConditionState::Met(ConditionHit {
                    direction: Some(Direction::Short),
                    grade: ConditionGrade::Band,
                }),
                Some(_) => ConditionState::NotMet,
                None => ConditionState::Unavailable,
            },
            StochMode::Cross => {
                if fetch(ctx, &self.k_key, index).is_none()
                    || fetch(ctx, &self.d_key, index).is_none()
                {
                    return ConditionState::Unavailable;
                }
                match (
                    ctx.values.get_series(&self.k_key),
                    ctx.values.get_series(&self.d_key),
                ) {
                    (Some(k), Some(d)) => match crossed(k, d, index) {
                        Some(c) => ConditionState::Met(ConditionHit {
                            direction: Some(direction_of(c)),
                            grade: ConditionGrade::Crossover,
                        }),
                        None => ConditionState::NotMet,
                    },
                    _ => ConditionState::Unavailable,
                }
            }
        }
    }
}

// ─── Extreme-band gates (MFI, CCI) ───────────────────────────────────

/// Generic extreme-band gate over a single oscillator series: at or below
/// the lower band supports Long, at or above the upper band supports Short.
pub struct BandGate {
    pub name: &'static str,
    pub key: String,
    pub lower: f64,
    pub upper: f64,
}

impl Condition for BandGate {
    fn name(&self) -> &'static str {
        self.name
    }

    fn check(&self, ctx: &ConditionCtx<'_>, index: usize) -> ConditionState {
        match fetch(ctx, &self.key, index) {
            Some(v) if v <= self.lower => ConditionState::Met(ConditionHit {
                direction: Some(Direction::Long),
                grade: ConditionGrade::Band,
            }),
            Some(v) if v >= self.upper => ConditionState::Met(ConditionHit {
                direction: Some(Direction::Short),
                grade: ConditionGrade::Band,
            }),
            Some(_) => ConditionState::NotMet,
            None => ConditionState::Unavailable,
        }
    }
}

// ─── Choppiness regime gate ──────────────────────────────────────────

/// Direction-neutral regime gate: the market must not be too choppy.
pub struct ChopBelow {
    pub key: String,
    pub max: f64,
}

impl Condition for ChopBelow {
    fn name(&self) -> &'static str {
        "chop_below"
    }

    fn check(&self, ctx: &ConditionCtx<'_>, index: usize) -> ConditionState {
        match fetch(ctx, &self.key, index) {
            Some(v) if v <= self.max => ConditionState::Met(ConditionHit {
                direction: None,
                grade: ConditionGrade::Band,
            }),
            Some(_) => ConditionState::NotMet,
            None => ConditionState::Unavailable,
        }
    }
}
