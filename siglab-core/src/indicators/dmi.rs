//! DMI/ADX — Directional Movement Index (Wilder).
//!
//! Steps:
//! 1. +DM and -DM from consecutive high/low deltas: only the larger,
//!    same-sign delta counts; ties cancel both. DM[0] = 0 (no delta yet).
//! 2. +DM, -DM, and TR are smoothed with the same RMA as ATR.
//! 3. +DI = 100 * RMA(+DM) / RMA(TR), -DI symmetric.
//! 4. DX = 100 * |+DI - -DI| / (+DI + -DI); zero denominator resolves to 0.
//! 5. ADX = RMA of DX over the same period.
//!
//! Exposed one line per instance via `DmiLine`. Lookback: period - 1 for
//! the DI/DX lines, 2 * (period - 1) for ADX.

use crate::domain::Candle;

use super::atr::{rma, true_range};
use super::Indicator;

/// Which output line of the DMI calculation this instance exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DmiLine {
    PlusDi,
    MinusDi,
    Dx,
    Adx,
}

impl DmiLine {
    fn prefix(&self) -> &'static str {
        match self {
            DmiLine::PlusDi => "plus_di",
            DmiLine::MinusDi => "minus_di",
            DmiLine::Dx => "dx",
            DmiLine::Adx => "adx",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Dmi {
    period: usize,
    line: DmiLine,
    name: String,
}

impl Dmi {
    pub fn new(period: usize, line: DmiLine) -> Self {
        assert!(period >= 1, "DMI period must be >= 1");
        Self {
            period,
            line,
            name: format!("{}_{period}", line.prefix()),
        }
    }
}

/// Raw directional movement series. Ties and inside bars produce 0 for both.
fn directional_movement(candles: &[Candle]) -> (Vec<f64>, Vec<f64>) {
    let n = candles.len();
    let mut plus_dm = vec![f64::NAN; n];
    let mut minus_dm = vec![f64::NAN; n];
    if n == 0 {
        return (plus_dm, minus_dm);
    }

    plus_dm[0] = 0.0;
    minus_dm[0] = 0.0;

    for i in 1..n {
        let high_diff = candles[i].high - candles[i - 1].high;
        let low_diff = candles[i - 1].low - candles[i].low;

        if high_diff.is_nan() || low_diff.is_nan() {
            plus_dm[i] = f64::NAN;
            minus_dm[i] = f64::NAN;
            continue;
        }

        plus_dm[i] = if high_diff > low_diff && high_diff > 0.0 {
            high_diff
        } else {
            0.0
        };
        minus_dm[i] = if low_diff > high_diff && low_diff > 0.0 {
            low_diff
        } else {
            0.0
        };
    }

    (plus_dm, minus_dm)
}

/// Compute every line of the DMI pipeline at once.
pub fn compute_dmi(candles: &[Candle], period: usize) -> DmiOutput {
    let n = candles.len();
    let (plus_dm, minus_dm) = directional_movement(candles);

    let smooth_tr = rma(&true_range(candles), period);
    let smooth_plus = rma(&plus_dm, period);
    let smooth_minus = rma(&minus_dm, period);

    let mut plus_di = vec![f64::NAN; n];
    let mut minus_di = vec![f64::NAN; n];
    let mut dx = vec![f64::NAN; n];

    for i in 0..n {
        if smooth_tr[i].is_nan()
            || smooth_plus[i].is_nan()
            || smooth_minus[i].is_nan()
            || smooth_tr[i] == 0.0
        {
            continue;
        }

        let p = 100.0 * smooth_plus[i] / smooth_tr[i];
        let m = 100.0 * smooth_minus[i] / smooth_tr[i];
        plus_di[i] = p;
        minus_di[i] = m;

        let di_sum = p + m;
        dx[i] = if di_sum == 0.0 {
            0.0
        } else {
            100.0 * (p - m).abs() / di_sum
        };
    }

    let adx = rma(&dx, period);

    DmiOutput {
        plus_di,
        minus_di,
        dx,
        adx,
    }
}

/// All four DMI output series.
pub struct DmiOutput {
    pub plus_di: Vec<f64>,
    pub minus_di: Vec<f64>,
    pub dx: Vec<f64>,
    pub adx: Vec<f64>,
}

impl Indicator for Dmi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        match self.line {
            DmiLine::Adx => 2 * (self.period - 1),
            _ => self.period - 1,
        }
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        let out = compute_dmi(candles, self.period);
        match self.line {
            DmiLine::PlusDi => out.plus_di,
            DmiLine::MinusDi => out.minus_di,
            DmiLine::Dx => out.dx,
            DmiLine::Adx => out.adx,
        }
    }
}
