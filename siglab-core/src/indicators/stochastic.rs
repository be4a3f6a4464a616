//! Stochastic oscillator (%K / %D).
//!
//! Raw %K = 100 * (close - minLow(k_period)) / (maxHigh(k_period) - minLow(k_period)),
//! smoothed by an SMA over `smooth_k`; %D is the SMA of smoothed %K over
//! `d_period`. A flat high/low range resolves raw %K to 50 (mid-scale).
//!
//! Exposed one line per instance via `StochLine`.

use crate::domain::Candle;

use super::sma::sma_series;
use super::Indicator;

/// Which output line this instance exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StochLine {
    K,
    D,
}

#[derive(Debug, Clone)]
pub struct Stochastic {
    k_period: usize,
    smooth_k: usize,
    d_period: usize,
    line: StochLine,
    name: String,
}

impl Stochastic {
    pub fn new(k_period: usize, smooth_k: usize, d_period: usize, line: StochLine) -> Self {
        assert!(k_period >= 1, "stochastic k_period must be >= 1");
        assert!(smooth_k >= 1, "stochastic smooth_k must be >= 1");
        assert!(d_period >= 1, "stochastic d_period must be >= 1");
        let suffix = match line {
            StochLine::K => "k",
            StochLine::D => "d",
        };
        Self {
            k_period,
            smooth_k,
            d_period,
            line,
            name: format!("stoch_{suffix}_{k_period}_{smooth_k}_{d_period}"),
        }
    }

    fn raw_k(&self, candles: &[Candle]) -> Vec<f64> {
        let n = candles.len();
        let mut raw = vec![f64::NAN; n];

        for i in (self.k_period - 1)..n {
            let window = &candles[i + 1 - self.k_period..=i];
            if window.iter().any(|c| c.high.is_nan() || c.low.is_nan()) || candles[i].close.is_nan()
            {
                continue;
            }
            let max_high = window.iter().map(|c| c.high).fold(f64::MIN, f64::max);
            let min_low = window.iter().map(|c| c.low).fold(f64::MAX, f64::min);
            let range = max_high - min_low;
            raw[i] = if range == 0.0 {
                50.0
            } else {
                100.0 * (candles[i].close - min_low) / range
            };
        }

        raw
    }
}

impl Indicator for Stochastic {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        let k = self.k_period - 1 + self.smooth_k - 1;
        match self.line {
            StochLine::K => k,
            StochLine::D => k + self.d_period - 1,
        }
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        let smoothed = sma_series(&self.raw_k(candles), self.smooth_k);
        match self.line {
            StochLine::K => smoothed,
            StochLine::D => sma_series(&smoothed, self.d_period),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_ohlc_candles, DEFAULT_EPSILON};

    #[test]
    fn raw_k_at_extremes() {
        let candles = make_ohlc_candles(&[
            (100.0, 110.0, 90.0, 95.0),
            (95.0, 112.0, 92.0, 100.0),
            (100.0, 115.0, 95.0, 115.0), // close at the window high
        ]);
        let stoch = Stochastic::new(3, 1, 1, StochLine::K);
        let result = stoch.compute(&candles);
        // max_high = 115, min_low = 90, close = 115 -> %K = 100
        assert_approx(result[2], 100.0, DEFAULT_EPSILON);
    }

    #[test]
    fn raw_k_midpoint() {
        let candles = make_ohlc_candles(&[
            (100.0, 110.0, 90.0, 95.0),
            (95.0, 110.0, 90.0, 100.0), // close at (110+90)/2
        ]);
        let stoch = Stochastic::new(2, 1, 1, StochLine::K);
        let result = stoch.compute(&candles);
        assert_approx(result[1], 50.0, DEFAULT_EPSILON);
    }

    #[test]
    fn flat_range_resolves_to_50() {
        let candles = make_ohlc_candles(&[(100.0, 100.0, 100.0, 100.0); 3]);
        let stoch = Stochastic::new(3, 1, 1, StochLine::K);
        let result = stoch.compute(&candles);
        assert_approx(result[2], 50.0, DEFAULT_EPSILON);
    }

    #[test]
    fn d_line_is_sma_of_k() {
        let candles = make_ohlc_candles(&[
            (100.0, 110.0, 90.0, 95.0),
            (95.0, 110.0, 90.0, 100.0),
            (100.0, 110.0, 90.0, 105.0),
            (105.0, 110.0, 90.0, 110.0),
        ]);
        let k = Stochastic::new(2, 1, 1, StochLine::K).compute(&candles);
        let d = Stochastic::new(2, 1, 2, StochLine::D).compute(&candles);
        assert!(d[1].is_nan());
        assert_approx(d[2], (k[1] + k[2]) / 2.0, DEFAULT_EPSILON);
        assert_approx(d[3], (k[2] + k[3]) / 2.0, DEFAULT_EPSILON);
    }

    #[test]
    fn lookbacks() {
        assert_eq!(Stochastic::new(14, 3, 3, StochLine::K).lookback(), 15);
        assert_eq!(Stochastic::new(14, 3, 3, StochLine::D).lookback(), 17);
    }
}
