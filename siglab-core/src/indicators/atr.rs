//! Average True Range (ATR).
//!
//! True Range: max(high-low, |high-prev_close|, |low-prev_close|), with
//! TR[0] = high[0] - low[0] (no previous close). ATR is Wilder's running
//! moving average of TR: RMA[i] = RMA[i-1] + (TR[i] - RMA[i-1]) / period,
//! seeded by the simple mean of the first `period` true-range values.
//!
//! Lookback: period - 1 (exactly the first period-1 outputs are NaN).

use crate::domain::Candle;

use super::Indicator;

#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    name: String,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ATR period must be >= 1");
        Self {
            period,
            name: format!("atr_{period}"),
        }
    }
}

/// Compute the True Range series from candles.
///
/// TR[0] = high[0] - low[0]; later entries use the previous close.
pub fn true_range(candles: &[Candle]) -> Vec<f64> {
    let n = candles.len();
    let mut tr = vec![f64::NAN; n];

    if n == 0 {
        return tr;
    }

    let h = candles[0].high;
    let l = candles[0].low;
    if h.is_nan() || l.is_nan() {
        tr[0] = f64::NAN;
    } else {
        tr[0] = h - l;
    }

    for i in 1..n {
        let h = candles[i].high;
        let l = candles[i].low;
        let pc = candles[i - 1].close;
        if h.is_nan() || l.is_nan() || pc.is_nan() {
            tr[i] = f64::NAN;
        } else {
            tr[i] = (h - l).max((h - pc).abs()).max((l - pc).abs());
        }
    }

    tr
}

/// Wilder's running moving average (RMA). Alpha = 1/period.
///
/// Seed: simple mean of the first `period` consecutive non-NaN values;
/// the seed lands at the last index of that window. A NaN after the seed
/// truncates the remainder of the output to NaN.
pub fn rma(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    if n < period || period == 0 {
        return result;
    }

    // First index with `period` consecutive non-NaN values.
    let seed_start = (0..n).find(|&i| {
        i + period <= n && values[i..i + period].iter().all(|v| !v.is_nan())
    });
    let seed_start = match seed_start {
        Some(s) => s,
        None => return result,
    };
    let seed_end = seed_start + period;

    let seed: f64 = values[seed_start..seed_end].iter().sum::<f64>() / period as f64;
    result[seed_end - 1] = seed;

    let mut prev = seed;
    for i in seed_end..n {
        if values[i].is_nan() {
            return result;
        }
        let smoothed = prev + (values[i] - prev) / period as f64;
        result[i] = smoothed;
        prev = smoothed;
    }

    result
}

impl Indicator for Atr {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        rma(&true_range(candles), self.period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_ohlc_candles, DEFAULT_EPSILON};

    #[test]
    fn true_range_basic() {
        let candles = make_ohlc_candles(&[
            (100.0, 105.0, 95.0, 102.0),  // TR = 105-95 = 10
            (102.0, 108.0, 100.0, 106.0), // TR = max(8, |108-102|, |100-102|) = 8
            (106.0, 107.0, 98.0, 99.0),   // TR = max(9, |107-106|, |98-106|) = 9
        ]);
        let tr = true_range(&candles);
        assert_approx(tr[0], 10.0, DEFAULT_EPSILON);
        assert_approx(tr[1], 8.0, DEFAULT_EPSILON);
        assert_approx(tr[2], 9.0, DEFAULT_EPSILON);
    }

    #[test]
    fn true_range_gap_up() {
        // Gap up: prev close 100, current bar 110-115-108.
        let candles = make_ohlc_candles(&[
            (98.0, 102.0, 97.0, 100.0),
            (110.0, 115.0, 108.0, 112.0), // TR = max(7, |115-100|, |108-100|) = 15
        ]);
        let tr = true_range(&candles);
        assert_approx(tr[1], 15.0, DEFAULT_EPSILON);
    }

    #[test]
    fn atr_period_3_reference_series() {
        // Reference series: TR = [5, 5, 6, ...], seed = (5+5+6)/3.
        let candles = make_ohlc_candles(&[
            (101.0, 105.0, 100.0, 102.0), // TR = 5
            (103.0, 107.0, 103.0, 105.0), // TR = max(4, 5, 1) = 5
            (104.0, 108.0, 102.0, 104.0), // TR = max(6, 3, 3) = 6
            (104.0, 106.0, 101.0, 103.0), // TR = max(5, 2, 3) = 5
            (104.0, 109.0, 104.0, 107.0), // TR = max(5, 6, 1) = 6
        ]);
        let atr = Atr::new(3);
        let result = atr.compute(&candles);

        // Exactly the first period-1 entries are NaN.
        assert!(result[0].is_nan());
        assert!(result[1].is_nan());
        assert_approx(result[2], 16.0 / 3.0, DEFAULT_EPSILON);
        // RMA recurrence: ATR[3] = ATR[2] + (TR[3] - ATR[2]) / 3.
        let expected3 = 16.0 / 3.0 + (5.0 - 16.0 / 3.0) / 3.0;
        assert_approx(result[3], expected3, DEFAULT_EPSILON);
        let expected4 = expected3 + (6.0 - expected3) / 3.0;
        assert_approx(result[4], expected4, DEFAULT_EPSILON);
    }

    #[test]
    fn rma_recurrence_holds_beyond_warmup() {
        let values: Vec<f64> = (0..30).map(|i| 5.0 + (i as f64 * 0.37).sin()).collect();
        let period = 5;
        let out = rma(&values, period);
        for i in period..values.len() {
            let expected = out[i - 1] + (values[i] - out[i - 1]) / period as f64;
            assert_approx(out[i], expected, DEFAULT_EPSILON);
        }
    }

    #[test]
    fn atr_warmup_count_exact() {
        let candles = make_ohlc_candles(&[
            (100.0, 105.0, 95.0, 102.0),
            (102.0, 108.0, 100.0, 106.0),
            (106.0, 107.0, 98.0, 99.0),
            (99.0, 103.0, 97.0, 101.0),
            (101.0, 106.0, 100.0, 105.0),
        ]);
        let atr = Atr::new(4);
        let result = atr.compute(&candles);
        let nan_count = result.iter().take_while(|v| v.is_nan()).count();
        assert_eq!(nan_count, 3);
        assert!(result[3..].iter().all(|v| v.is_finite()));
    }

    #[test]
    fn atr_insufficient_history_all_nan() {
        let candles = make_ohlc_candles(&[(100.0, 105.0, 95.0, 102.0)]);
        let atr = Atr::new(3);
        assert!(atr.compute(&candles).iter().all(|v| v.is_nan()));
    }

    #[test]
    fn atr_lookback() {
        assert_eq!(Atr::new(14).lookback(), 13);
        assert_eq!(Atr::new(1).lookback(), 0);
    }
}
