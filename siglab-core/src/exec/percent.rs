//! Percent trailing stop — trails the extreme reached since entry.
//!
//! For longs: stop = highest high since entry * (1 - trail_pct).
//! For shorts: stop = lowest low since entry * (1 + trail_pct).
//! Recomputed only when a new extreme is reached; ratcheted regardless.

use crate::domain::Direction;

use super::{breached, ratchet, StopView, TrailingStop};

#[derive(Debug, Clone)]
pub struct PercentTrail {
    direction: Direction,
    trail_pct: f64,
    extreme: f64,
    level: f64,
}

impl PercentTrail {
    /// `trail_pct` is a fraction (e.g., 0.10 for 10%).
    pub fn new(direction: Direction, entry_price: f64, trail_pct: f64) -> Self {
        assert!(entry_price > 0.0, "entry_price must be positive");
        assert!(
            trail_pct > 0.0 && trail_pct < 1.0,
            "trail_pct must be in (0, 1)"
        );

        let level = match direction {
            Direction::Long => entry_price * (1.0 - trail_pct),
            Direction::Short => entry_price * (1.0 + trail_pct),
        };
        Self {
            direction,
            trail_pct,
            extreme: entry_price,
            level,
        }
    }
}

impl TrailingStop for PercentTrail {
    fn name(&self) -> &str {
        "percent_trail"
    }

    fn level(&self) -> f64 {
        self.level
    }

    fn observe(&mut self, view: &StopView) {
        let new_extreme = match self.direction {
            Direction::Long => view.high > self.extreme,
            Direction::Short => view.low < self.extreme,
        };
        if !new_extreme {
            return;
        }

        self.extreme = match self.direction {
            Direction::Long => view.high,
            Direction::Short => view.low,
        };
        let candidate = match self.direction {
            Direction::Long => self.extreme * (1.0 - self.trail_pct),
            Direction::Short => self.extreme * (1.0 + self.trail_pct),
        };
        self.level = ratchet(self.direction, self.level, candidate);
    }

    fn check_hit(&self, price: f64) -> Option<f64> {
        breached(self.direction, self.level, price).then_some(self.level)
    }
}
