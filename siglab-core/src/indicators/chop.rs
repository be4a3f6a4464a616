//! Choppiness Index.
//!
//! CHOP = 100 * log10(sum(TR, period) / (maxHigh(period) - minLow(period)))
//!        / log10(period),
//! clamped to 0 when the high/low range is zero. High values mean a choppy,
//! range-bound market; low values mean a trending one.
//!
//! Lookback: period - 1.

use crate::domain::Candle;

use super::atr::true_range;
use super::Indicator;

#[derive(Debug, Clone)]
pub struct Choppiness {
    period: usize,
    name: String,
}

impl Choppiness {
    pub fn new(period: usize) -> Self {
        assert!(period >= 2, "Choppiness period must be >= 2");
        Self {
            period,
            name: format!("chop_{period}"),
        }
    }
}

impl Indicator for Choppiness {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        let n = candles.len();
        let mut result = vec![f64::NAN; n];
        let tr = true_range(candles);
        let log_period = (self.period as f64).log10();

        for i in (self.period - 1)..n {
            let window = &candles[i + 1 - self.period..=i];
            let tr_window = &tr[i + 1 - self.period..=i];
            if tr_window.iter().any(|v| v.is_nan())
                || window.iter().any(|c| c.high.is_nan() || c.low.is_nan())
            {
                continue;
            }

            let max_high = window.iter().map(|c| c.high).fold(f64::MIN, f64::max);
            let min_low = window.iter().map(|c| c.low).fold(f64::MAX, f64::min);
            let range = max_high - min_low;

            result[i] = if range == 0.0 {
                0.0
            } else {
                100.0 * (tr_window.iter().sum::<f64>() / range).log10() / log_period
            };
        }

        result
    }
}
