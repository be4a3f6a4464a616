//! Concrete indicator implementations.
//!
//! All indicators implement the `Indicator` trait: full candle series in,
//! same-length numeric series out, with the first `lookback()` values NaN
//! (warm-up). Downstream logic treats NaN as "condition cannot be evaluated",
//! never as false.
//!
//! Multi-line indicators (DMI/ADX, Stochastic, MACD) are exposed as separate
//! named instances per line, keeping the single-series `Indicator` trait
//! unchanged.

pub mod atr;
pub mod cci;
pub mod chop;
pub mod dmi;
pub mod ema;
pub mod macd;
pub mod mfi;
pub mod sma;
pub mod stochastic;
pub mod vwma;

pub use atr::Atr;
pub use cci::Cci;
pub use chop::Choppiness;
pub use dmi::{Dmi, DmiLine};
pub use ema::Ema;
pub use macd::{Macd, MacdLine};
pub use mfi::Mfi;
pub use sma::Sma;
pub use stochastic::{StochLine, Stochastic};
pub use vwma::Vwma;

use crate::domain::Candle;
use std::collections::HashMap;

/// Trait for indicators.
///
/// Indicators take a full candle series and produce a numeric output series
/// of the same length. The first `lookback()` values are `f64::NAN`.
///
/// # Look-ahead contamination guard
/// No indicator value at candle t may depend on price data from candle t+1
/// or later.
pub trait Indicator: Send + Sync {
    /// Series key (e.g., "atr_14", "plus_di_14").
    fn name(&self) -> &str;

    /// Number of candles consumed before the first valid output.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire candle series.
    fn compute(&self, candles: &[Candle]) -> Vec<f64>;
}

/// Container for precomputed indicator values.
///
/// Built once per evaluated window, then queried by candle index.
#[derive(Debug, Clone, Default)]
pub struct IndicatorValues {
    series: HashMap<String, Vec<f64>>,
}

impl IndicatorValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a named indicator series.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) {
        self.series.insert(name.into(), values);
    }

    /// Get the indicator value at a specific candle index.
    pub fn get(&self, name: &str, index: usize) -> Option<f64> {
        self.series.get(name).and_then(|v| v.get(index).copied())
    }

    /// Get the full series for a named indicator.
    pub fn get_series(&self, name: &str) -> Option<&[f64]> {
        self.series.get(name).map(|v| v.as_slice())
    }

    /// Number of indicator series stored.
    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// Precompute a set of indicators over one candle series.
pub fn precompute(candles: &[Candle], indicators: &[Box<dyn Indicator>]) -> IndicatorValues {
    let mut values = IndicatorValues::new();
    for indicator in indicators {
        let series = indicator.compute(candles);
        debug_assert_eq!(
            series.len(),
            candles.len(),
            "indicator '{}' produced {} values for {} candles",
            indicator.name(),
            series.len(),
            candles.len()
        );
        values.insert(indicator.name(), series);
    }
    values
}

/// Maximum lookback across a set of indicators.
pub fn max_lookback(indicators: &[Box<dyn Indicator>]) -> usize {
    indicators.iter().map(|i| i.lookback()).max().unwrap_or(0)
}

/// Create synthetic candles from close prices for testing.
///
/// Generates plausible OHLV: open = prev close (or close for the first
/// candle), high = max(open, close) + 1.0, low = min(open, close) - 1.0,
/// volume = 1000.
#[cfg(test)]
pub fn make_candles(closes: &[f64]) -> Vec<Candle> {
    use chrono::TimeZone;
    let base = chrono::Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Candle {
                open_time: base + chrono::Duration::minutes(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

/// Create candles from (open, high, low, close) tuples for testing.
#[cfg(test)]
pub fn make_ohlc_candles(data: &[(f64, f64, f64, f64)]) -> Vec<Candle> {
    use chrono::TimeZone;
    let base = chrono::Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    data.iter()
        .enumerate()
        .map(|(i, &(open, high, low, close))| Candle {
            open_time: base + chrono::Duration::minutes(i as i64),
            open,
            high,
            low,
            close,
            volume: 1000.0,
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indicator_values_insert_and_get() {
        let mut iv = IndicatorValues::new();
        iv.insert(
            "sma_3",
            vec![f64::NAN, f64::NAN, 100.0, 101.0].into_iter().collect(),
        );
        assert!(iv.get("sma_3", 0).unwrap().is_nan());
        assert_eq!(iv.get("sma_3", 2), Some(100.0));
        assert_eq!(iv.get("sma_3", 4), None); // out of bounds
    }

    #[test]
    fn indicator_values_missing_name() {
        let iv = IndicatorValues::new();
        assert_eq!(iv.get("nonexistent", 0), None);
    }

    #[test]
    fn precompute_all_series_aligned() {
        let candles = make_candles(&[10.0, 11.0, 12.0, 13.0, 14.0]);
        let indicators: Vec<Box<dyn Indicator>> =
            vec![Box::new(Sma::new(3)), Box::new(Ema::new(3))];
        let iv = precompute(&candles, &indicators);
        assert_eq!(iv.len(), 2);
        assert_eq!(iv.get_series("sma_3").unwrap().len(), 5);
        assert_eq!(iv.get_series("ema_3").unwrap().len(), 5);
    }

    #[test]
    fn max_lookback_across_set() {
        let indicators: Vec<Box<dyn Indicator>> = vec![
            Box::new(Sma::new(5)),
            Box::new(Ema::new(20)),
            Box::new(Sma::new(10)),
        ];
        assert_eq!(max_lookback(&indicators), 19);
    }

    #[test]
    fn max_lookback_empty() {
        let indicators: Vec<Box<dyn Indicator>> = vec![];
        assert_eq!(max_lookback(&indicators), 0);
    }
}
