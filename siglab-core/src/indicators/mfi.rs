//! Money Flow Index (MFI) — a volume-weighted RSI analogue.
//!
//! Raw money flow = typical price * volume, signed by the direction of the
//! typical-price change. MFI = 100 - 100 / (1 + positive_flow / negative_flow)
//! over the trailing `period` flows. Zero negative flow resolves to 100.
//!
//! Lookback: period (flows start at index 1).

use crate::domain::Candle;

use super::Indicator;

#[derive(Debug, Clone)]
pub struct Mfi {
    period: usize,
    name: String,
}

impl Mfi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "MFI period must be >= 1");
        Self {
            period,
            name: format!("mfi_{period}"),
        }
    }
}

impl Indicator for Mfi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        let n = candles.len();
        let mut result = vec![f64::NAN; n];
        if n < 2 {
            return result;
        }

        // Signed flow per candle: positive when typical price rises,
        // negative when it falls, zero when unchanged.
        let mut flow = vec![f64::NAN; n];
        for i in 1..n {
            let tp = candles[i].typical_price();
            let prev_tp = candles[i - 1].typical_price();
            if tp.is_nan() || prev_tp.is_nan() || candles[i].volume.is_nan() {
                continue;
            }
            let raw = tp * candles[i].volume;
            flow[i] = if tp > prev_tp {
                raw
            } else if tp < prev_tp {
                -raw
            } else {
                0.0
            };
        }

        for i in self.period..n {
            let window = &flow[i + 1 - self.period..=i];
            if window.iter().any(|v| v.is_nan()) {
                continue;
            }
            let positive: f64 = window.iter().filter(|v| **v > 0.0).sum();
            let negative: f64 = -window.iter().filter(|v| **v < 0.0).sum::<f64>();

            result[i] = if negative == 0.0 {
                100.0
            } else {
                100.0 - 100.0 / (1.0 + positive / negative)
            };
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_candles, DEFAULT_EPSILON};

    #[test]
    fn all_up_moves_saturate_at_100() {
        let candles = make_candles(&[10.0, 11.0, 12.0, 13.0, 14.0]);
        let result = Mfi::new(3).compute(&candles);
        assert!(result[2].is_nan());
        assert_approx(result[3], 100.0, DEFAULT_EPSILON);
        assert_approx(result[4], 100.0, DEFAULT_EPSILON);
    }

    #[test]
    fn all_down_moves_saturate_at_0() {
        let candles = make_candles(&[14.0, 13.0, 12.0, 11.0, 10.0]);
        let result = Mfi::new(3).compute(&candles);
        assert_approx(result[4], 0.0, DEFAULT_EPSILON);
    }

    #[test]
    fn mixed_flows_in_bounds() {
        let candles = make_candles(&[10.0, 12.0, 11.0, 13.0, 12.0, 14.0]);
        let result = Mfi::new(3).compute(&candles);
        for v in result.iter().filter(|v| !v.is_nan()) {
            assert!((0.0..=100.0).contains(v));
        }
    }

    #[test]
    fn lookback_is_period() {
        assert_eq!(Mfi::new(14).lookback(), 14);
    }
}
