//! Multi-stage percent trailing stop.
//!
//! Behaves like [`PercentTrail`](super::PercentTrail), but the trail
//! fraction switches in stages as unrealized profit crosses configured
//! thresholds — a wide stop while profit is small, tighter as it grows.
//! Even when a stage widens the fraction, the ratchet keeps the level
//! monotonic.

use crate::domain::Direction;
use serde::{Deserialize, Serialize};

use super::{breached, ratchet, StopView, TrailingStop};

/// One stage: once unrealized profit reaches `profit_pct` (percent of
/// entry), trail at `trail_pct` (fraction) instead.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub profit_pct: f64,
    pub trail_pct: f64,
}

#[derive(Debug, Clone)]
pub struct StagedPercent {
    direction: Direction,
    entry_price: f64,
    base_pct: f64,
    stages: Vec<Stage>,
    extreme: f64,
    level: f64,
}

impl StagedPercent {
    pub fn new(direction: Direction, entry_price: f64, base_pct: f64, stages: Vec<Stage>) -> Self {
        assert!(entry_price > 0.0, "entry_price must be positive");
        assert!(
            base_pct > 0.0 && base_pct < 1.0,
            "base_pct must be in (0, 1)"
        );
        assert!(
            stages
                .windows(2)
                .all(|w| w[0].profit_pct < w[1].profit_pct),
            "stage thresholds must be strictly increasing"
        );
        for stage in &stages {
            assert!(
                stage.trail_pct > 0.0 && stage.trail_pct < 1.0,
                "stage trail_pct must be in (0, 1)"
            );
        }

        let level = match direction {
            Direction::Long => entry_price * (1.0 - base_pct),
            Direction::Short => entry_price * (1.0 + base_pct),
        };
        Self {
            direction,
            entry_price,
            base_pct,
            stages,
            extreme: entry_price,
            level,
        }
    }

    /// Trail fraction for the current unrealized profit at the extreme.
    fn current_pct(&self) -> f64 {
        let raw = (self.extreme - self.entry_price) / self.entry_price * 100.0;
        let profit = match self.direction {
            Direction::Long => raw,
            Direction::Short => -raw,
        };
        let mut pct = self.base_pct;
        for stage in &self.stages {
            if profit >= stage.profit_pct {
                pct = stage.trail_pct;
            }
        }
        pct
    }
}

impl TrailingStop for StagedPercent {
    fn name(&self) -> &str {
        "staged_percent"
    }

    fn level(&self) -> f64 {
        self.level
    }

    fn observe(&mut self, view: &StopView) {
        self.extreme = match self.direction {
            Direction::Long => self.extreme.max(view.high),
            Direction::Short => self.extreme.min(view.low),
        };
        let pct = self.current_pct();
        let candidate = match self.direction {
            Direction::Long => self.extreme * (1.0 - pct),
            Direction::Short => self.extreme * (1.0 + pct),
        };
        self.level = ratchet(self.direction, self.level, candidate);
    }

    fn check_hit(&self, price: f64) -> Option<f64> {
        breached(self.direction, self.level, price).then_some(self.level)
    }
}
