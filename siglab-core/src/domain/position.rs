//! Position tracking — one open position at a time per tracker.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Direction;

/// Why a position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitReason {
    /// An exit signal for the position's direction.
    ExitSignal,
    /// An opposite-direction entry signal (implicit close-then-reopen).
    OppositeEntry,
    /// The trailing stop was hit.
    StopHit,
    /// End of the replayed series.
    EndOfData,
}

/// An open position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub direction: Direction,
    pub entry_time: DateTime<Utc>,
    pub entry_price: f64,
    /// Highest price seen since entry (longs trail this).
    pub highest_since_entry: f64,
    /// Lowest price seen since entry (shorts trail this).
    pub lowest_since_entry: f64,
}

impl Position {
    pub fn open(direction: Direction, entry_time: DateTime<Utc>, entry_price: f64) -> Self {
        Self {
            direction,
            entry_time,
            entry_price,
            highest_since_entry: entry_price,
            lowest_since_entry: entry_price,
        }
    }

    /// Record a new observed price, updating the extremes.
    pub fn observe(&mut self, high: f64, low: f64) {
        if high > self.highest_since_entry {
            self.highest_since_entry = high;
        }
        if low < self.lowest_since_entry {
            self.lowest_since_entry = low;
        }
    }

    /// Unrealized captured percent at `price` (positive = favorable).
    pub fn captured_pct(&self, price: f64) -> f64 {
        let raw = (price - self.entry_price) / self.entry_price * 100.0;
        match self.direction {
            Direction::Long => raw,
            Direction::Short => -raw,
        }
    }
}

/// A completed round trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClosedPosition {
    pub direction: Direction,
    pub entry_time: DateTime<Utc>,
    pub entry_price: f64,
    pub exit_time: DateTime<Utc>,
    pub exit_price: f64,
    pub exit_reason: ExitReason,
    /// Captured price movement as a percent of entry (positive = favorable).
    pub captured_pct: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap()
    }

    #[test]
    fn long_captured_pct() {
        let pos = Position::open(Direction::Long, t0(), 100.0);
        assert!((pos.captured_pct(105.0) - 5.0).abs() < 1e-12);
        assert!((pos.captured_pct(95.0) + 5.0).abs() < 1e-12);
    }

    #[test]
    fn short_captured_pct() {
        let pos = Position::open(Direction::Short, t0(), 100.0);
        assert!((pos.captured_pct(95.0) - 5.0).abs() < 1e-12);
        assert!((pos.captured_pct(105.0) + 5.0).abs() < 1e-12);
    }

    #[test]
    fn extremes_track_observed_range() {
        let mut pos = Position::open(Direction::Long, t0(), 100.0);
        pos.observe(110.0, 99.0);
        pos.observe(105.0, 95.0);
        assert_eq!(pos.highest_since_entry, 110.0);
        assert_eq!(pos.lowest_since_entry, 95.0);
    }

    #[test]
    fn extremes_start_at_entry() {
        let pos = Position::open(Direction::Short, t0(), 100.0);
        assert_eq!(pos.highest_since_entry, 100.0);
        assert_eq!(pos.lowest_since_entry, 100.0);
    }
}
