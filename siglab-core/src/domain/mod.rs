//! Domain types for SigLab.

pub mod candle;
pub mod position;
pub mod signal;

pub use candle::{validate_series, Candle};
pub use position::{ClosedPosition, ExitReason, Position};
pub use signal::{Direction, EntryRef, Signal, SignalAction, SignalDetails, SignalMode};
