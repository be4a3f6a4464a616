//! Backtest engine — replays a candle series through a strategy.

pub mod driver;
pub mod report;

pub use driver::BacktestDriver;
pub use report::BacktestReport;
