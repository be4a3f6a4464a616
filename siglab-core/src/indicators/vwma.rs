//! Volume Weighted Moving Average (VWMA).
//!
//! VWMA[i] = sum(close * volume) / sum(volume) over the trailing `period`
//! candles. A zero volume sum yields NaN (no trade weight to average).
//! Lookback: period - 1.

use crate::domain::Candle;

use super::Indicator;

#[derive(Debug, Clone)]
pub struct Vwma {
    period: usize,
    name: String,
}

impl Vwma {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "VWMA period must be >= 1");
        Self {
            period,
            name: format!("vwma_{period}"),
        }
    }
}

impl Indicator for Vwma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        let n = candles.len();
        let mut result = vec![f64::NAN; n];

        for i in (self.period - 1)..n {
            let window = &candles[i + 1 - self.period..=i];
            if window.iter().any(|c| c.close.is_nan() || c.volume.is_nan()) {
                continue;
            }
            let weighted: f64 = window.iter().map(|c| c.close * c.volume).sum();
            let volume: f64 = window.iter().map(|c| c.volume).sum();
            if volume > 0.0 {
                result[i] = weighted / volume;
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_candles, DEFAULT_EPSILON};

    #[test]
    fn vwma_equal_volume_is_sma() {
        // make_candles uses constant volume, so VWMA collapses to SMA.
        let candles = make_candles(&[10.0, 11.0, 12.0, 13.0]);
        let result = Vwma::new(3).compute(&candles);
        assert!(result[1].is_nan());
        assert_approx(result[2], 11.0, DEFAULT_EPSILON);
        assert_approx(result[3], 12.0, DEFAULT_EPSILON);
    }

    #[test]
    fn vwma_weights_by_volume() {
        let mut candles = make_candles(&[10.0, 20.0]);
        candles[0].volume = 3000.0;
        candles[1].volume = 1000.0;
        let result = Vwma::new(2).compute(&candles);
        // (10*3000 + 20*1000) / 4000 = 12.5
        assert_approx(result[1], 12.5, DEFAULT_EPSILON);
    }

    #[test]
    fn vwma_zero_volume_window_is_nan() {
        let mut candles = make_candles(&[10.0, 11.0]);
        candles[0].volume = 0.0;
        candles[1].volume = 0.0;
        let result = Vwma::new(2).compute(&candles);
        assert!(result[1].is_nan());
    }
}
