//! Candle — the fundamental market data unit.

use crate::error::SeriesError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OHLCV candle for a single symbol over one fixed time interval.
///
/// A series is valid when sorted ascending by `open_time` with no duplicate
/// timestamps; callers must deduplicate and sort before any computation runs
/// (`validate_series` enforces this at the boundary).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candle {
    pub open_time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    /// Returns true if any OHLCV field is NaN.
    pub fn is_void(&self) -> bool {
        self.open.is_nan()
            || self.high.is_nan()
            || self.low.is_nan()
            || self.close.is_nan()
            || self.volume.is_nan()
    }

    /// Basic OHLC sanity check: high bounds the range from above, low from below.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.open > 0.0
            && self.close > 0.0
    }

    /// Absolute body size (|close - open|).
    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    /// True for a bullish (green) candle.
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    /// True for a bearish (red) candle.
    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }

    /// Typical price (H+L+C)/3, used by MFI and CCI.
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    /// Synthetic still-forming candle built from the last known close.
    ///
    /// Used by the rolling-window driver: the forming candle carries no real
    /// future data (OHLC all equal the last close, zero volume) and is never
    /// evaluated for signal generation.
    pub fn forming(open_time: DateTime<Utc>, last_close: f64) -> Self {
        Self {
            open_time,
            open: last_close,
            high: last_close,
            low: last_close,
            close: last_close,
            volume: 0.0,
        }
    }
}

/// Validate the series ordering invariant: strictly increasing `open_time`.
pub fn validate_series(candles: &[Candle]) -> Result<(), SeriesError> {
    for i in 1..candles.len() {
        if candles[i].open_time < candles[i - 1].open_time {
            return Err(SeriesError::NotSorted { index: i });
        }
        if candles[i].open_time == candles[i - 1].open_time {
            return Err(SeriesError::Duplicate { index: i });
        }
    }
    Ok(())
}
