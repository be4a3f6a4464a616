//! Commodity Channel Index (CCI).
//!
//! CCI = (typical_price - SMA(typical_price, period))
//!       / (0.015 * mean_absolute_deviation(period)).
//! A zero mean absolute deviation resolves to 0 rather than NaN.
//!
//! Lookback: period - 1.

use crate::domain::Candle;

use super::Indicator;

#[derive(Debug, Clone)]
pub struct Cci {
    period: usize,
    name: String,
}

impl Cci {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "CCI period must be >= 1");
        Self {
            period,
            name: format!("cci_{period}"),
        }
    }
}

impl Indicator for Cci {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        let n = candles.len();
        let mut result = vec![f64::NAN; n];

        let tp: Vec<f64> = candles.iter().map(|c| c.typical_price()).collect();

        for i in (self.period - 1)..n {
            let window = &tp[i + 1 - self.period..=i];
            if window.iter().any(|v| v.is_nan()) {
                continue;
            }
            let mean = window.iter().sum::<f64>() / self.period as f64;
            let mad = window.iter().map(|v| (v - mean).abs()).sum::<f64>() / self.period as f64;

            result[i] = if mad == 0.0 {
                0.0
            } else {
                (tp[i] - mean) / (0.015 * mad)
            };
        }

        result
    }
}
