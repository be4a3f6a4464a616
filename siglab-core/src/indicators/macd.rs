//! MACD — Moving Average Convergence Divergence.
//!
//! MACD line = EMA(close, fast) - EMA(close, slow); the signal line is an
//! EMA of the MACD line; the histogram is their difference.
//!
//! Exposed one line per instance via `MacdLine`.

use crate::domain::Candle;

use super::ema::ema_series;
use super::Indicator;

/// Which output line this instance exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacdLine {
    Macd,
    Signal,
    Histogram,
}

impl MacdLine {
    fn prefix(&self) -> &'static str {
        match self {
            MacdLine::Macd => "macd",
            MacdLine::Signal => "macd_signal",
            MacdLine::Histogram => "macd_hist",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Macd {
    fast: usize,
    slow: usize,
    signal: usize,
    line: MacdLine,
    name: String,
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize, line: MacdLine) -> Self {
        assert!(fast >= 1, "MACD fast period must be >= 1");
        assert!(slow > fast, "MACD slow period must be > fast period");
        assert!(signal >= 1, "MACD signal period must be >= 1");
        Self {
            fast,
            slow,
            signal,
            line,
            name: format!("{}_{fast}_{slow}_{signal}", line.prefix()),
        }
    }

    fn macd_line(&self, candles: &[Candle]) -> Vec<f64> {
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let fast = ema_series(&closes, self.fast);
        let slow = ema_series(&closes, self.slow);
        fast.iter()
            .zip(slow.iter())
            .map(|(f, s)| {
                if f.is_nan() || s.is_nan() {
                    f64::NAN
                } else {
                    f - s
                }
            })
            .collect()
    }
}

impl Indicator for Macd {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        let macd = self.slow - 1;
        match self.line {
            MacdLine::Macd => macd,
            MacdLine::Signal | MacdLine::Histogram => macd + self.signal - 1,
        }
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        let macd = self.macd_line(candles);
        match self.line {
            MacdLine::Macd => macd,
            MacdLine::Signal => ema_series(&macd, self.signal),
            MacdLine::Histogram => {
                let signal = ema_series(&macd, self.signal);
                macd.iter()
                    .zip(signal.iter())
                    .map(|(m, s)| {
                        if m.is_nan() || s.is_nan() {
                            f64::NAN
                        } else {
                            m - s
                        }
                    })
                    .collect()
            }
        }
    }
}
