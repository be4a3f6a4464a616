//! VWMA-anchored trailing stop.
//!
//! The stop follows a moving-average value directly, offset by a fraction
//! of the average itself. Updates are accepted only when they improve the
//! stop in the position's favor; unavailable (NaN/absent) average values
//! are ignored.

use crate::domain::Direction;

use super::{breached, ratchet, StopView, TrailingStop};

#[derive(Debug, Clone)]
pub struct VwmaAnchor {
    direction: Direction,
    offset_pct: f64,
    level: f64,
}

impl VwmaAnchor {
    /// `offset_pct` is a fraction of the average (e.g., 0.01 for 1%).
    pub fn new(direction: Direction, entry_price: f64, offset_pct: f64) -> Self {
        assert!(entry_price > 0.0, "entry_price must be positive");
        assert!(
            offset_pct > 0.0 && offset_pct < 1.0,
            "offset_pct must be in (0, 1)"
        );

        let level = match direction {
            Direction::Long => entry_price * (1.0 - offset_pct),
            Direction::Short => entry_price * (1.0 + offset_pct),
        };
        Self {
            direction,
            offset_pct,
            level,
        }
    }
}

impl TrailingStop for VwmaAnchor {
    fn name(&self) -> &str {
        "vwma_anchor"
    }

    fn level(&self) -> f64 {
        self.level
    }

    fn observe(&mut self, view: &StopView) {
        let vwma = match view.vwma {
            Some(v) if v.is_finite() => v,
            _ => return,
        };
        let candidate = match self.direction {
            Direction::Long => vwma * (1.0 - self.offset_pct),
            Direction::Short => vwma * (1.0 + self.offset_pct),
        };
        self.level = ratchet(self.direction, self.level, candidate);
    }

    fn check_hit(&self, price: f64) -> Option<f64> {
        breached(self.direction, self.level, price).then_some(self.level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(vwma: Option<f64>) -> StopView {
        StopView {
            price: 100.0,
            high: 101.0,
            low: 99.0,
            vwma,
        }
    }

    #[test]
    fn follows_rising_average() {
        let mut stop = VwmaAnchor::new(Direction::Long, 100.0, 0.01);
        assert_eq!(stop.level(), 99.0);

        stop.observe(&view(Some(105.0)));
        assert!((stop.level() - 103.95).abs() < 1e-12);
    }

    #[test]
    fn falling_average_does_not_widen() {
        let mut stop = VwmaAnchor::new(Direction::Long, 100.0, 0.01);
        stop.observe(&view(Some(105.0)));
        let before = stop.level();
        stop.observe(&view(Some(98.0)));
        assert_eq!(stop.level(), before);
    }

    #[test]
    fn unavailable_average_ignored() {
        let mut stop = VwmaAnchor::new(Direction::Long, 100.0, 0.01);
        let before = stop.level();
        stop.observe(&view(None));
        stop.observe(&view(Some(f64::NAN)));
        assert_eq!(stop.level(), before);
    }

    #[test]
    fn short_mirrors() {
        let mut stop = VwmaAnchor::new(Direction::Short, 100.0, 0.01);
        assert_eq!(stop.level(), 101.0);

        stop.observe(&view(Some(95.0)));
        assert!((stop.level() - 95.95).abs() < 1e-12);

        stop.observe(&view(Some(99.0)));
        assert!((stop.level() - 95.95).abs() < 1e-12);
    }
}
