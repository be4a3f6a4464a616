//! Fixed-offset trailing stop, capped by ATR at entry.
//!
//! The offset is fixed at entry: min(ATR-at-entry, entry_price * cap_pct).
//! The stop trails the latest price by that offset and only tightens.

use crate::domain::Direction;

use super::{breached, ratchet, StopView, TrailingStop};

#[derive(Debug, Clone)]
pub struct AtrCapped {
    direction: Direction,
    offset: f64,
    level: f64,
}

impl AtrCapped {
    /// `cap_pct` is a fraction of the entry price (e.g., 0.02 for 2%).
    pub fn new(direction: Direction, entry_price: f64, atr_at_entry: f64, cap_pct: f64) -> Self {
        assert!(entry_price > 0.0, "entry_price must be positive");
        assert!(
            atr_at_entry.is_finite() && atr_at_entry > 0.0,
            "atr_at_entry must be finite and positive"
        );
        assert!(
            cap_pct > 0.0 && cap_pct < 1.0,
            "cap_pct must be in (0, 1)"
        );

        let offset = atr_at_entry.min(entry_price * cap_pct);
        let level = match direction {
            Direction::Long => entry_price - offset,
            Direction::Short => entry_price + offset,
        };
        Self {
            direction,
            offset,
            level,
        }
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }
}

impl TrailingStop for AtrCapped {
    fn name(&self) -> &str {
        "atr_capped"
    }

    fn level(&self) -> f64 {
        self.level
    }

    fn observe(&mut self, view: &StopView) {
        let candidate = match self.direction {
            Direction::Long => view.price - self.offset,
            Direction::Short => view.price + self.offset,
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

    #[test]
    fn offset_capped_by_percent() {
        // ATR 5.0 exceeds the 2% cap (2.0), so the cap wins.
        let stop = AtrCapped::new(Direction::Long, 100.0, 5.0, 0.02);
        assert_eq!(stop.offset(), 2.0);
        assert_eq!(stop.level(), 98.0);
    }

    #[test]
    fn offset_uses_atr_when_smaller() {
        let stop = AtrCapped::new(Direction::Long, 100.0, 1.5, 0.05);
        assert_eq!(stop.offset(), 1.5);
        assert_eq!(stop.level(), 98.5);
    }

    #[test]
    fn long_stop_tightens_never_widens() {
        let mut stop = AtrCapped::new(Direction::Long, 100.0, 2.0, 0.05);
        assert_eq!(stop.level(), 98.0);

        stop.observe(&StopView::from_price(105.0));
        assert_eq!(stop.level(), 103.0);

        // Price retreats; the stop must not.
        stop.observe(&StopView::from_price(101.0));
        assert_eq!(stop.level(), 103.0);
    }

    #[test]
    fn short_stop_mirrors() {
        let mut stop = AtrCapped::new(Direction::Short, 100.0, 2.0, 0.05);
        assert_eq!(stop.level(), 102.0);

        stop.observe(&StopView::from_price(95.0));
        assert_eq!(stop.level(), 97.0);

        stop.observe(&StopView::from_price(99.0));
        assert_eq!(stop.level(), 97.0);
    }

    #[test]
    fn hit_reports_level() {
        let mut stop = AtrCapped::new(Direction::Long, 100.0, 2.0, 0.05);
        stop.observe(&StopView::from_price(105.0));
        assert_eq!(stop.check_hit(104.0), None);
        assert_eq!(stop.check_hit(103.0), Some(103.0));
        assert_eq!(stop.check_hit(100.0), Some(103.0));
    }

    #[test]
    #[should_panic(expected = "atr_at_entry must be finite and positive")]
    fn rejects_nan_atr() {
        AtrCapped::new(Direction::Long, 100.0, f64::NAN, 0.02);
    }
}
