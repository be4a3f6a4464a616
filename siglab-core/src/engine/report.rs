//! Backtest results — the serializable output of one driver run.

use serde::{Deserialize, Serialize};

use crate::domain::{ClosedPosition, Signal};
use crate::signals::SignalMetrics;

/// Everything one backtest run produced.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BacktestReport {
    /// Signals kept at their decision boundaries, in emission order.
    pub signals: Vec<Signal>,
    /// Completed round trips, in close order.
    pub positions: Vec<ClosedPosition>,
    pub metrics: SignalMetrics,
    /// Candles replayed, including those consumed by warm-up.
    pub candles_processed: usize,
}

impl BacktestReport {
    /// Sum of captured percents across all closed positions.
    pub fn total_captured_pct(&self) -> f64 {
        self.positions.iter().map(|p| p.captured_pct).sum()
    }

    /// Fraction of closed positions with positive capture, if any closed.
    pub fn win_rate(&self) -> Option<f64> {
        if self.positions.is_empty() {
            return None;
        }
        let wins = self
            .positions
            .iter()
            .filter(|p| p.captured_pct > 0.0)
            .count();
        Some(wins as f64 / self.positions.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Direction, ExitReason};
    use chrono::TimeZone;

    fn closed(captured_pct: f64) -> ClosedPosition {
        let t0 = chrono::Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        ClosedPosition {
            direction: Direction::Long,
            entry_time: t0,
            entry_price: 100.0,
            exit_time: t0 + chrono::Duration::minutes(30),
            exit_price: 100.0 * (1.0 + captured_pct / 100.0),
            exit_reason: ExitReason::ExitSignal,
            captured_pct,
        }
    }

    #[test]
    fn totals_and_win_rate() {
        let report = BacktestReport {
            positions: vec![closed(5.0), closed(-2.0), closed(3.0)],
            ..Default::default()
        };
        assert!((report.total_captured_pct() - 6.0).abs() < 1e-12);
        assert!((report.win_rate().unwrap() - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn empty_report() {
        let report = BacktestReport::default();
        assert_eq!(report.total_captured_pct(), 0.0);
        assert!(report.win_rate().is_none());
    }

    #[test]
    fn report_serializes() {
        let report = BacktestReport {
            positions: vec![closed(5.0)],
            candles_processed: 100,
            ..Default::default()
        };
        let json = serde_json::to_string(&report).unwrap();
        let deser: BacktestReport = serde_json::from_str(&json).unwrap();
        assert_eq!(deser.positions.len(), 1);
        assert_eq!(deser.candles_processed, 100);
    }
}
