//! Error types shared across the crate.
//!
//! Configuration errors are fatal to the generator instance that carries
//! them and are reported synchronously at construction. Insufficient but
//! warmable history is not an error — affected indicator entries are NaN
//! and generators skip those bars.

/// Errors detected while validating a strategy or driver configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("period for {name} must be >= 1, got {value}")]
    NonPositivePeriod { name: &'static str, value: usize },

    #[error("window size must be >= 1")]
    ZeroWindow,

    #[error("fast period {fast} must be < slow period {slow}")]
    FastNotBelowSlow { fast: usize, slow: usize },

    #[error("no exit condition enabled")]
    NoExitCondition,

    #[error("{name} must be in ({min}, {max}), got {value}")]
    ThresholdOutOfRange {
        name: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },

    #[error("stage thresholds must be strictly increasing")]
    UnorderedStages,

    #[error("candle trigger requires a candle validation gate")]
    CandleTriggerWithoutGate,
}

/// Errors raised while detecting signals over a candle series.
#[derive(Debug, thiserror::Error)]
pub enum DetectError {
    #[error("series of {len} candles can never warm up {indicator} (needs {required})")]
    InsufficientHistory {
        indicator: String,
        required: usize,
        len: usize,
    },

    #[error(transparent)]
    Series(#[from] SeriesError),
}

/// Errors detected while validating a candle series.
#[derive(Debug, thiserror::Error)]
pub enum SeriesError {
    #[error("candles not sorted ascending at index {index}")]
    NotSorted { index: usize },

    #[error("duplicate open_time at index {index}")]
    Duplicate { index: usize },
}
