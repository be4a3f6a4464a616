//! Position tracker — at most one open position per tracker.

use chrono::{DateTime, Utc};

use crate::domain::{ClosedPosition, Direction, ExitReason, Position};

use super::{StopView, TrailingStop};

/// Routes entry/exit signals and stop checks into a sequence of
/// non-overlapping closed positions.
#[derive(Default)]
pub struct PositionTracker {
    position: Option<Position>,
    stop: Option<Box<dyn TrailingStop>>,
}

impl PositionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    pub fn stop_level(&self) -> Option<f64> {
        self.stop.as_ref().map(|s| s.level())
    }

    fn close(
        &mut self,
        exit_time: DateTime<Utc>,
        exit_price: f64,
        exit_reason: ExitReason,
    ) -> Option<ClosedPosition> {
        let position = self.position.take()?;
        self.stop = None;
        Some(ClosedPosition {
            direction: position.direction,
            entry_time: position.entry_time,
            entry_price: position.entry_price,
            exit_time,
            exit_price,
            exit_reason,
            captured_pct: position.captured_pct(exit_price),
        })
    }

    /// Accept an entry signal.
    ///
    /// An opposite-direction open position is closed first (implicit
    /// close-then-reopen); a same-direction duplicate is dropped and the
    /// provided stop discarded. Returns the closed position, if any.
    pub fn on_entry(
        &mut self,
        direction: Direction,
        time: DateTime<Utc>,
        price: f64,
        stop: Option<Box<dyn TrailingStop>>,
    ) -> Option<ClosedPosition> {
        let closed = match self.position.as_ref().map(|p| p.direction) {
            Some(open) if open == direction => return None,
            Some(_) => self.close(time, price, ExitReason::OppositeEntry),
            None => None,
        };

        self.position = Some(Position::open(direction, time, price));
        self.stop = stop;
        closed
    }

    /// Accept an exit signal; a mismatched or absent position is a no-op.
    pub fn on_exit(
        &mut self,
        direction: Direction,
        time: DateTime<Utc>,
        price: f64,
    ) -> Option<ClosedPosition> {
        if self.position.as_ref().map(|p| p.direction) != Some(direction) {
            return None;
        }
        self.close(time, price, ExitReason::ExitSignal)
    }

    /// Feed one market observation to the position extremes and the stop.
    pub fn observe(&mut self, view: &StopView) {
        if let Some(position) = self.position.as_mut() {
            position.observe(view.high, view.low);
        }
        if let Some(stop) = self.stop.as_mut() {
            stop.observe(view);
        }
    }

    /// Check the trailing stop against the latest price; closing at the
    /// stop level, not the observed price.
    pub fn check_stop(&mut self, time: DateTime<Utc>, price: f64) -> Option<ClosedPosition> {
        let level = self.stop.as_ref()?.check_hit(price)?;
        self.close(time, level, ExitReason::StopHit)
    }

    /// Close any open position at the end of the replayed series.
    pub fn close_end_of_data(
        &mut self,
        time: DateTime<Utc>,
        price: f64,
    ) -> Option<ClosedPosition> {
        self.close(time, price, ExitReason::EndOfData)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::PercentTrail;
    use chrono::TimeZone;

    fn t(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap() + chrono::Duration::minutes(minutes)
    }

    #[test]
    fn entry_then_exit_captures_five_percent() {
        let mut tracker = PositionTracker::new();
        assert!(tracker
            .on_entry(Direction::Long, t(0), 100.0, None)
            .is_none());
        let closed = tracker
            .on_exit(Direction::Long, t(30), 105.0)
            .expect("exit closes the long");

        assert_eq!(closed.direction, Direction::Long);
        assert_eq!(closed.exit_reason, ExitReason::ExitSignal);
        assert!((closed.captured_pct - 5.0).abs() < 1e-12);
        assert!(tracker.position().is_none());
    }

    #[test]
    fn duplicate_entry_dropped() {
        let mut tracker = PositionTracker::new();
        tracker.on_entry(Direction::Long, t(0), 100.0, None);
        assert!(tracker
            .on_entry(Direction::Long, t(5), 102.0, None)
            .is_none());
        // The original entry survives.
        assert_eq!(tracker.position().unwrap().entry_price, 100.0);
    }

    #[test]
    fn opposite_entry_closes_then_reopens() {
        let mut tracker = PositionTracker::new();
        tracker.on_entry(Direction::Long, t(0), 100.0, None);
        let closed = tracker
            .on_entry(Direction::Short, t(10), 98.0, None)
            .expect("opposite entry closes the long");

        assert_eq!(closed.exit_reason, ExitReason::OppositeEntry);
        assert_eq!(closed.direction, Direction::Long);
        assert!((closed.captured_pct + 2.0).abs() < 1e-12);
        assert_eq!(tracker.position().unwrap().direction, Direction::Short);
    }

    #[test]
    fn mismatched_exit_is_noop() {
        let mut tracker = PositionTracker::new();
        tracker.on_entry(Direction::Long, t(0), 100.0, None);
        assert!(tracker.on_exit(Direction::Short, t(5), 99.0).is_none());
        assert!(tracker.position().is_some());
    }

    #[test]
    fn stop_hit_closes_at_stop_level() {
        let mut tracker = PositionTracker::new();
        let stop = PercentTrail::new(Direction::Long, 100.0, 0.05);
        tracker.on_entry(Direction::Long, t(0), 100.0, Some(Box::new(stop)));

        // Rally to 120: stop ratchets to 114.
        tracker.observe(&StopView::from_price(120.0));
        assert_eq!(tracker.stop_level(), Some(114.0));
        assert!(tracker.check_stop(t(10), 118.0).is_none());

        let closed = tracker
            .check_stop(t(20), 110.0)
            .expect("price fell through the stop");
        assert_eq!(closed.exit_reason, ExitReason::StopHit);
        assert_eq!(closed.exit_price, 114.0);
        assert!((closed.captured_pct - 14.0).abs() < 1e-12);
    }

    #[test]
    fn end_of_data_closes_open_position() {
        let mut tracker = PositionTracker::new();
        tracker.on_entry(Direction::Short, t(0), 100.0, None);
        let closed = tracker.close_end_of_data(t(60), 97.0).unwrap();
        assert_eq!(closed.exit_reason, ExitReason::EndOfData);
        assert!((closed.captured_pct - 3.0).abs() < 1e-12);

        // Idempotent once flat.
        assert!(tracker.close_end_of_data(t(61), 97.0).is_none());
    }
}
