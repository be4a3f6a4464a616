//! Signal generation.
//!
//! A [`SignalGenerator`] is a stateful state machine over a candle series:
//! it computes its own indicator series, keeps a cursor over already
//! processed indices, and emits [`Signal`] events on closed candles only.
//! The last element of the evaluated series is treated as the still-forming
//! candle and is never eligible for signal generation.

pub mod conditions;
pub mod cross;
pub mod matcher;
pub mod metrics;
pub mod vwma_cross;

pub use conditions::{
    BandGate, ChopBelow, Condition, ConditionCtx, ConditionGrade, ConditionHit, ConditionState,
    DiBalance, DiMode, DxAdx, MacdGate, MacdMode, StochGate, StochMode, VwmaSlope,
};
pub use cross::{crossed, gap, gap_valid_within, CrossDirection};
pub use matcher::{CandleGate, Trigger, WindowMatcher, WindowPolicy};
pub use metrics::SignalMetrics;
pub use vwma_cross::VwmaCross;

use crate::domain::{Candle, Direction, Signal};
use crate::error::DetectError;

/// Per-bar diagnostic record: which sub-conditions were found in the window,
/// which were missing, and why the bar was rejected. Recording has no effect
/// on signal output.
#[derive(Debug, Clone)]
pub struct TrackedSignal {
    pub index: usize,
    pub direction: Direction,
    pub window_start: usize,
    pub window_end: usize,
    pub found: Vec<String>,
    pub missing: Vec<String>,
    /// `None` when the bar fired a signal.
    pub rejection: Option<String>,
}

/// Trait for stateful signal generators.
///
/// `detect` evaluates the inclusive range `[cursor+1 ..= len-2]` and advances
/// the cursor, so calling it again on the same series returns nothing new;
/// a fresh instance replaying the same series produces the identical signal
/// list.
pub trait SignalGenerator: Send {
    /// Stable generator name for reports and diagnostics.
    fn name(&self) -> &str;

    /// Number of closed candles required before any bar can fire.
    fn warmup(&self) -> usize;

    /// Evaluate all newly closed candles and return the signals they fire.
    ///
    /// Returns [`DetectError::InsufficientHistory`] when the closed portion
    /// of the series is too short to ever produce a signal.
    fn detect(&mut self, candles: &[Candle]) -> Result<Vec<Signal>, DetectError>;

    /// Running counters over all signals this instance has emitted.
    fn metrics(&self) -> &SignalMetrics;

    /// Per-bar diagnostic records accumulated so far.
    fn tracked(&self) -> &[TrackedSignal];
}
