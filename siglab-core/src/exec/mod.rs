//! Execution model — turns a signal stream into non-overlapping positions.
//!
//! A [`PositionTracker`] holds at most one open position and its trailing
//! stop. Stops obey the ratchet invariant: for a long the level only moves
//! up, for a short only down, once initialized at entry. All policies
//! enforce the ratchet themselves rather than relying on the caller.

pub mod atr_capped;
pub mod percent;
pub mod position;
pub mod staged;
pub mod vwma_anchor;

pub use atr_capped::AtrCapped;
pub use percent::PercentTrail;
pub use position::PositionTracker;
pub use staged::{Stage, StagedPercent};
pub use vwma_anchor::VwmaAnchor;

use crate::domain::{Candle, Direction};

/// One market observation used to advance a trailing stop.
#[derive(Debug, Clone, Copy)]
pub struct StopView {
    /// Latest price (tick or close, depending on driver granularity).
    pub price: f64,
    pub high: f64,
    pub low: f64,
    /// Reference moving-average value, for average-anchored policies.
    pub vwma: Option<f64>,
}

impl StopView {
    /// View from a single price, for tick-granularity checks.
    pub fn from_price(price: f64) -> Self {
        Self {
            price,
            high: price,
            low: price,
            vwma: None,
        }
    }

    /// View from a closed candle.
    pub fn from_candle(candle: &Candle, vwma: Option<f64>) -> Self {
        Self {
            price: candle.close,
            high: candle.high,
            low: candle.low,
            vwma,
        }
    }
}

/// Trait for trailing-stop policies.
///
/// A policy is constructed at entry with the position's direction and entry
/// price, then fed observations in time order.
pub trait TrailingStop: Send {
    /// Policy name (e.g., "percent_trail", "atr_capped").
    fn name(&self) -> &str;

    /// Current stop level.
    fn level(&self) -> f64;

    /// Advance the stop from one market observation. The level may only
    /// move in the position's favor.
    fn observe(&mut self, view: &StopView);

    /// Whether `price` breaches the stop; returns the level at the hit.
    fn check_hit(&self, price: f64) -> Option<f64>;
}

/// Move `current` toward `candidate` only if that is favorable for the
/// position, enforcing the ratchet invariant.
pub(crate) fn ratchet(direction: Direction, current: f64, candidate: f64) -> f64 {
    match direction {
        Direction::Long => current.max(candidate),
        Direction::Short => current.min(candidate),
    }
}

/// Stop-hit test shared by all policies.
pub(crate) fn breached(direction: Direction, level: f64, price: f64) -> bool {
    match direction {
        Direction::Long => price <= level,
        Direction::Short => price >= level,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratchet_long_only_rises() {
        assert_eq!(ratchet(Direction::Long, 95.0, 97.0), 97.0);
        assert_eq!(ratchet(Direction::Long, 95.0, 90.0), 95.0);
    }

    #[test]
    fn ratchet_short_only_falls() {
        assert_eq!(ratchet(Direction::Short, 105.0, 103.0), 103.0);
        assert_eq!(ratchet(Direction::Short, 105.0, 110.0), 105.0);
    }

    #[test]
    fn breach_direction() {
        assert!(breached(Direction::Long, 95.0, 94.0));
        assert!(breached(Direction::Long, 95.0, 95.0));
        assert!(!breached(Direction::Long, 95.0, 96.0));
        assert!(breached(Direction::Short, 105.0, 106.0));
        assert!(!breached(Direction::Short, 105.0, 104.0));
    }
}
