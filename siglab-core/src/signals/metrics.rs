//! Aggregate metrics over the signals a generator has emitted.

use crate::domain::{Direction, Signal, SignalAction};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Running counters over emitted signals.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignalMetrics {
    pub total_signals: usize,
    pub entry_count: usize,
    pub exit_count: usize,
    pub long_count: usize,
    pub short_count: usize,
    /// Mean confidence across all emitted signals.
    pub avg_confidence: f64,
    pub last_signal_time: Option<DateTime<Utc>>,
    confidence_sum: f64,
}

impl SignalMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one emitted signal into the counters.
    pub fn record(&mut self, signal: &Signal) {
        self.total_signals += 1;
        match signal.action {
            SignalAction::Entry => self.entry_count += 1,
            SignalAction::Exit => self.exit_count += 1,
        }
        match signal.direction {
            Direction::Long => self.long_count += 1,
            Direction::Short => self.short_count += 1,
        }
        self.confidence_sum += signal.confidence;
        self.avg_confidence = self.confidence_sum / self.total_signals as f64;
        self.last_signal_time = Some(signal.timestamp);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{SignalDetails, SignalMode};
    use chrono::TimeZone;

    fn make_signal(action: SignalAction, direction: Direction, confidence: f64) -> Signal {
        Signal {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
            action,
            direction,
            price: 100.0,
            confidence,
            mode: SignalMode::Trend,
            details: SignalDetails::VwmaCross {
                fast: 0.0,
                slow: 0.0,
                gap: 0.0,
                gap_confirmed_after: 0,
            },
            closes: None,
        }
    }

    #[test]
    fn counters_accumulate() {
        let mut m = SignalMetrics::new();
        m.record(&make_signal(SignalAction::Entry, Direction::Long, 1.0));
        m.record(&make_signal(SignalAction::Exit, Direction::Long, 0.5));
        m.record(&make_signal(SignalAction::Entry, Direction::Short, 0.75));

        assert_eq!(m.total_signals, 3);
        assert_eq!(m.entry_count, 2);
        assert_eq!(m.exit_count, 1);
        assert_eq!(m.long_count, 2);
        assert_eq!(m.short_count, 1);
        assert!((m.avg_confidence - 0.75).abs() < 1e-12);
        assert!(m.last_signal_time.is_some());
    }

    #[test]
    fn empty_metrics() {
        let m = SignalMetrics::new();
        assert_eq!(m.total_signals, 0);
        assert_eq!(m.avg_confidence, 0.0);
        assert!(m.last_signal_time.is_none());
    }
}
