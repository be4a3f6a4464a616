//! Signal — an immutable event emitted by a signal generator.
//!
//! Signals are created on closed candles only; the still-forming candle at
//! the end of the evaluated series is never eligible. Signals describe the
//! market event, not a downstream execution decision.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Enter a new position or exit the open one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalAction {
    Entry,
    Exit,
}

/// Directional intent of a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    pub fn opposite(self) -> Self {
        match self {
            Direction::Long => Direction::Short,
            Direction::Short => Direction::Long,
        }
    }
}

/// Classification of the evidence behind a signal.
///
/// `Trend` requires crossover-grade directional conditions; relative-position
/// evidence alone only supports `CounterTrend`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalMode {
    Trend,
    CounterTrend,
}

/// Reference to the entry a given exit signal closes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EntryRef {
    pub entry_time: DateTime<Utc>,
    pub entry_price: f64,
}

/// Typed diagnostic payload, one variant per generator family.
///
/// Each generator's diagnostic fields are compile-time checked instead of
/// living in an open-ended key/value map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SignalDetails {
    /// Simple moving-average crossover variant.
    VwmaCross {
        fast: f64,
        slow: f64,
        gap: f64,
        /// Bars after the cross at which the gap reached the threshold
        /// (0 when it was wide enough immediately).
        gap_confirmed_after: usize,
    },
    /// Windowed multi-condition matcher variants.
    Windowed {
        anchor_index: usize,
        window_start: usize,
        window_end: usize,
        trigger_index: usize,
        conditions_found: usize,
        conditions_enabled: usize,
        body_atr_ratio: f64,
    },
}

/// An immutable signal event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    pub timestamp: DateTime<Utc>,
    pub action: SignalAction,
    pub direction: Direction,
    pub price: f64,
    /// Signal strength in [0, 1]; higher means more conditions confirmed
    /// at crossover grade.
    pub confidence: f64,
    pub mode: SignalMode,
    pub details: SignalDetails,
    /// For exit signals, the entry this exit closes (filled by the
    /// generator from its own per-direction gate state).
    pub closes: Option<EntryRef>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn direction_opposite() {
        assert_eq!(Direction::Long.opposite(), Direction::Short);
        assert_eq!(Direction::Short.opposite(), Direction::Long);
    }

    #[test]
    fn signal_serialization_roundtrip() {
        let sig = Signal {
            timestamp: Utc.with_ymd_and_hms(2024, 3, 15, 10, 30, 0).unwrap(),
            action: SignalAction::Entry,
            direction: Direction::Long,
            price: 152.25,
            confidence: 0.85,
            mode: SignalMode::Trend,
            details: SignalDetails::Windowed {
                anchor_index: 40,
                window_start: 38,
                window_end: 45,
                trigger_index: 42,
                conditions_found: 3,
                conditions_enabled: 3,
                body_atr_ratio: 0.6,
            },
            closes: None,
        };
        let json = serde_json::to_string(&sig).unwrap();
        let deser: Signal = serde_json::from_str(&json).unwrap();
        assert_eq!(sig.direction, deser.direction);
        assert_eq!(sig.mode, deser.mode);
        assert_eq!(sig.details, deser.details);
    }

    #[test]
    fn exit_carries_entry_ref() {
        let entry_time = Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap();
        let sig = Signal {
            timestamp: entry_time + chrono::Duration::minutes(30),
            action: SignalAction::Exit,
            direction: Direction::Long,
            price: 105.0,
            confidence: 1.0,
            mode: SignalMode::Trend,
            details: SignalDetails::VwmaCross {
                fast: 104.0,
                slow: 104.5,
                gap: 0.5,
                gap_confirmed_after: 0,
            },
            closes: Some(EntryRef {
                entry_time,
                entry_price: 100.0,
            }),
        };
        assert_eq!(sig.closes.unwrap().entry_price, 100.0);
    }
}
