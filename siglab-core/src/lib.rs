//! SigLab Core — indicator library, windowed signal matcher, trailing stops,
//! and backtest driver.
//!
//! This crate contains the deterministic analytical pipeline:
//! - Domain types (candles, signals, positions)
//! - Indicator library (ATR, DMI/ADX, VWMA, Stochastic, MFI, CCI, MACD, Choppiness)
//! - Crossover/gap utilities with bounded deferred validation
//! - Generic windowed condition matcher with pluggable condition providers
//! - Trailing-stop execution model with four interchangeable stop policies
//! - Rolling-window backtest driver with a strict no-look-ahead rule
//!
//! The pipeline is single-threaded and synchronous: raw OHLCV in, closed
//! positions out, byte-identical on replay.

pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod exec;
pub mod indicators;
pub mod signals;

pub use error::{ConfigError, DetectError, SeriesError};
