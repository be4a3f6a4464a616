//! SigLab CLI — signal detection and backtest commands.
//!
//! Commands:
//! - `detect` — run one strategy's signal detection over a candle CSV
//! - `run` — replay a candle CSV through the rolling-window backtest driver

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};

use siglab_core::config::{build_generator, StrategyConfig};
use siglab_core::domain::{validate_series, Candle};
use siglab_core::engine::{BacktestDriver, BacktestReport};

#[derive(Parser)]
#[command(name = "siglab", about = "SigLab — candlestick signal lab")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect signals over a candle CSV with a strategy config.
    Detect {
        /// Path to a TOML strategy config.
        #[arg(long)]
        config: PathBuf,

        /// Path to a candle CSV (open_time,open,high,low,close,volume).
        #[arg(long)]
        data: PathBuf,

        /// Write the detected signals as JSON to this path.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Run a full rolling-window backtest over a candle CSV.
    Run {
        /// Path to a TOML strategy config.
        #[arg(long)]
        config: PathBuf,

        /// Path to a candle CSV (open_time,open,high,low,close,volume).
        #[arg(long)]
        data: PathBuf,

        /// Write the full report as JSON to this path.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Detect {
            config,
            data,
            output,
        } => run_detect(&config, &data, output.as_deref()),
        Commands::Run {
            config,
            data,
            output,
        } => run_backtest(&config, &data, output.as_deref()),
    }
}

fn load_config(path: &Path) -> Result<StrategyConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config: StrategyConfig =
        toml::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("validating config {}", path.display()))?;
    Ok(config)
}

fn load_candles(path: &Path) -> Result<Vec<Candle>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("opening candle CSV {}", path.display()))?;
    let mut candles = Vec::new();
    for (i, record) in reader.deserialize::<Candle>().enumerate() {
        let candle = record.with_context(|| format!("candle CSV row {}", i + 1))?;
        candles.push(candle);
    }
    if candles.is_empty() {
        bail!("candle CSV {} contains no rows", path.display());
    }
    validate_series(&candles)?;
    Ok(candles)
}

fn run_detect(config_path: &Path, data_path: &Path, output: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let candles = load_candles(data_path)?;

    let mut generator = build_generator(&config.generator);
    let signals = generator.detect(&candles)?;

    println!("Generator:   {}", generator.name());
    println!("Candles:     {}", candles.len());
    println!("Signals:     {}", signals.len());
    for signal in &signals {
        println!(
            "  {} {:?} {:?} @ {:.4} (confidence {:.2}, {:?})",
            signal.timestamp, signal.action, signal.direction, signal.price, signal.confidence,
            signal.mode
        );
    }
    let metrics = generator.metrics();
    println!(
        "Entries: {}  Exits: {}  Long: {}  Short: {}  Avg confidence: {:.2}",
        metrics.entry_count,
        metrics.exit_count,
        metrics.long_count,
        metrics.short_count,
        metrics.avg_confidence
    );

    if let Some(path) = output {
        let json = serde_json::to_string_pretty(&signals)?;
        fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        println!("Signals saved to: {}", path.display());
    }
    Ok(())
}

fn run_backtest(config_path: &Path, data_path: &Path, output: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let candles = load_candles(data_path)?;

    let report = BacktestDriver::new(&config).run(&candles)?;
    print_summary(&report);

    if let Some(path) = output {
        let json = serde_json::to_string_pretty(&report)?;
        fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        println!("Report saved to: {}", path.display());
    }
    Ok(())
}

fn print_summary(report: &BacktestReport) {
    println!("Candles processed:  {}", report.candles_processed);
    println!("Signals kept:       {}", report.signals.len());
    println!("Closed positions:   {}", report.positions.len());
    println!("Total captured:     {:+.2}%", report.total_captured_pct());
    match report.win_rate() {
        Some(rate) => println!("Win rate:           {:.1}%", rate * 100.0),
        None => println!("Win rate:           n/a"),
    }
    for position in &report.positions {
        println!(
            "  {:?} {} -> {} entry {:.4} exit {:.4} ({:?}, {:+.2}%)",
            position.direction,
            position.entry_time,
            position.exit_time,
            position.entry_price,
            position.exit_price,
            position.exit_reason,
            position.captured_pct
        );
    }
}
