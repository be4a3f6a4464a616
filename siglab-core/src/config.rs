//! Serializable strategy configuration and the factory that turns it into
//! runtime trait objects.
//!
//! Configuration errors are fatal to the instance being built and are
//! reported synchronously by [`StrategyConfig::validate`]; the factory
//! functions assume a validated config.

use serde::{Deserialize, Serialize};

use crate::domain::Direction;
use crate::error::ConfigError;
use crate::exec::{AtrCapped, PercentTrail, Stage, StagedPercent, TrailingStop, VwmaAnchor};
use crate::indicators::{
    Atr, Cci, Choppiness, Dmi, DmiLine, Indicator, Macd, MacdLine, Mfi, StochLine, Stochastic,
    Vwma,
};
use crate::signals::{
    BandGate, CandleGate, ChopBelow, Condition, DiBalance, DiMode, DxAdx, MacdGate, MacdMode,
    SignalGenerator, StochGate, StochMode, Trigger, VwmaCross, VwmaSlope, WindowMatcher,
    WindowPolicy,
};

fn default_true() -> bool {
    true
}

fn default_rolling_window() -> usize {
    300
}

fn default_volume_lookback() -> usize {
    20
}

/// Top-level strategy configuration, loadable from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyConfig {
    pub generator: GeneratorConfig,
    /// Trailing-stop policy; `None` means signal-driven exits only.
    pub stop: Option<StopConfig>,
    /// Whether an opposite-direction entry closes the open position.
    #[serde(default = "default_true")]
    pub exit_on_opposite: bool,
    #[serde(default)]
    pub driver: DriverConfig,
}

/// Which generator family to run, with its parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GeneratorConfig {
    VwmaCross {
        fast_period: usize,
        slow_period: usize,
        /// Minimum absolute fast/slow gap; 0 accepts every cross.
        #[serde(default)]
        min_gap: f64,
        /// Bars after the cross the gap may still confirm.
        #[serde(default)]
        gap_window: usize,
    },
    Windowed(WindowedConfig),
}

/// Configuration for the windowed multi-condition matcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowedConfig {
    pub trigger: TriggerConfig,
    pub window: usize,
    /// Anchored window around the trigger; otherwise sliding per index.
    #[serde(default)]
    pub anchored: bool,
    #[serde(default)]
    pub conditions: ConditionsConfig,
    pub candle: Option<CandleGateConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TriggerConfig {
    VwmaCross {
        fast_period: usize,
        slow_period: usize,
    },
    DiCross {
        period: usize,
    },
    StochCross {
        k_period: usize,
        smooth_k: usize,
        d_period: usize,
    },
    Candle,
}

/// Optional sub-conditions; each entry present is an enabled gate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConditionsConfig {
    pub vwma_slope: Option<VwmaSlopeConfig>,
    pub di: Option<DiConfig>,
    pub dx_adx: Option<DxAdxConfig>,
    pub macd: Option<MacdConfig>,
    pub stoch: Option<StochConfig>,
    pub mfi: Option<BandConfig>,
    pub cci: Option<BandConfig>,
    pub chop: Option<ChopConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VwmaSlopeConfig {
    pub period: usize,
    pub min_slope_pct: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiConfig {
    pub period: usize,
    /// Crossover-grade when true, relative-position otherwise.
    #[serde(default)]
    pub crossover: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DxAdxConfig {
    pub period: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MacdConfig {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
    pub mode: MacdModeConfig,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MacdModeConfig {
    Sign,
    Histogram,
    Cross,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StochConfig {
    pub k_period: usize,
    pub smooth_k: usize,
    pub d_period: usize,
    pub mode: StochModeConfig,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StochModeConfig {
    Extreme { oversold: f64, overbought: f64 },
    Cross,
}

/// Extreme-band gate over one oscillator (MFI, CCI).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BandConfig {
    pub period: usize,
    pub lower: f64,
    pub upper: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChopConfig {
    pub period: usize,
    pub max: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandleGateConfig {
    pub atr_period: usize,
    pub min_body_atr: f64,
    pub min_volume_ratio: Option<f64>,
    #[serde(default = "default_volume_lookback")]
    pub volume_lookback: usize,
}

/// Trailing-stop policy selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StopConfig {
    AtrCapped { atr_period: usize, cap_pct: f64 },
    Percent { trail_pct: f64 },
    VwmaAnchor { vwma_period: usize, offset_pct: f64 },
    Staged { base_pct: f64, stages: Vec<Stage> },
}

/// How the backtest driver checks stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopGranularity {
    /// Against each boundary candle's close only.
    #[default]
    Close,
    /// Against each closed candle's high/low range.
    Intrabar,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverConfig {
    /// Closed candles kept in the rolling recomputation window.
    #[serde(default = "default_rolling_window")]
    pub rolling_window: usize,
    #[serde(default)]
    pub granularity: StopGranularity,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            rolling_window: default_rolling_window(),
            granularity: StopGranularity::default(),
        }
    }
}

// ─── Validation ──────────────────────────────────────────────────────

fn check_period(name: &'static str, value: usize) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::NonPositivePeriod { name, value });
    }
    Ok(())
}

fn check_fraction(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if !(value > 0.0 && value < 1.0) {
        return Err(ConfigError::ThresholdOutOfRange {
            name,
            min: 0.0,
            max: 1.0,
            value,
        });
    }
    Ok(())
}

impl StrategyConfig {
    /// Validate the whole configuration. Errors are fatal to the instance.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match &self.generator {
            GeneratorConfig::VwmaCross {
                fast_period,
                slow_period,
                ..
            } => {
                check_period("vwma fast_period", *fast_period)?;
                check_period("vwma slow_period", *slow_period)?;
                if fast_period >= slow_period {
                    return Err(ConfigError::FastNotBelowSlow {
                        fast: *fast_period,
                        slow: *slow_period,
                    });
                }
            }
            GeneratorConfig::Windowed(w) => w.validate()?,
        }

        if let Some(stop) = &self.stop {
            stop.validate()?;
        }
        if self.stop.is_none() && !self.exit_on_opposite {
            return Err(ConfigError::NoExitCondition);
        }
        if self.driver.rolling_window == 0 {
            return Err(ConfigError::ZeroWindow);
        }
        Ok(())
    }
}

impl WindowedConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.window == 0 {
            return Err(ConfigError::ZeroWindow);
        }
        match &self.trigger {
            TriggerConfig::VwmaCross {
                fast_period,
                slow_period,
            } => {
                check_period("trigger fast_period", *fast_period)?;
                check_period("trigger slow_period", *slow_period)?;
                if fast_period >= slow_period {
                    return Err(ConfigError::FastNotBelowSlow {
                        fast: *fast_period,
                        slow: *slow_period,
                    });
                }
            }
            TriggerConfig::DiCross { period } => check_period("trigger di period", *period)?,
            TriggerConfig::StochCross {
                k_period,
                smooth_k,
                d_period,
            } => {
                check_period("trigger k_period", *k_period)?;
                check_period("trigger smooth_k", *smooth_k)?;
                check_period("trigger d_period", *d_period)?;
            }
            TriggerConfig::Candle => {}
        }

        let c = &self.conditions;
        if let Some(cfg) = &c.vwma_slope {
            check_period("vwma_slope period", cfg.period)?;
        }
        if let Some(cfg) = &c.di {
            check_period("di period", cfg.period)?;
        }
        if let Some(cfg) = &c.dx_adx {
            check_period("dx_adx period", cfg.period)?;
        }
        if let Some(cfg) = &c.macd {
            check_period("macd fast", cfg.fast)?;
            check_period("macd signal", cfg.signal)?;
            if cfg.slow <= cfg.fast {
                return Err(ConfigError::FastNotBelowSlow {
                    fast: cfg.fast,
                    slow: cfg.slow,
                });
            }
        }
        if let Some(cfg) = &c.stoch {
            check_period("stoch k_period", cfg.k_period)?;
            check_period("stoch smooth_k", cfg.smooth_k)?;
            check_period("stoch d_period", cfg.d_period)?;
            if let StochModeConfig::Extreme {
                oversold,
                overbought,
            } = cfg.mode
            {
                if !(0.0 <= oversold && oversold < overbought && overbought <= 100.0) {
                    return Err(ConfigError::ThresholdOutOfRange {
                        name: "stoch bands",
                        min: 0.0,
                        max: 100.0,
                        value: oversold.max(overbought),
                    });
                }
            }
        }
        if let Some(cfg) = &c.mfi {
            check_period("mfi period", cfg.period)?;
        }
        if let Some(cfg) = &c.cci {
            check_period("cci period", cfg.period)?;
        }
        if let Some(cfg) = &c.chop {
            if cfg.period < 2 {
                return Err(ConfigError::NonPositivePeriod {
                    name: "chop period",
                    value: cfg.period,
                });
            }
        }
        if let Some(candle) = &self.candle {
            check_period("candle atr_period", candle.atr_period)?;
            check_period("candle volume_lookback", candle.volume_lookback)?;
        }
        if matches!(self.trigger, TriggerConfig::Candle) && self.candle.is_none() {
            return Err(ConfigError::CandleTriggerWithoutGate);
        }
        Ok(())
    }
}

impl StopConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        match self {
            StopConfig::AtrCapped {
                atr_period,
                cap_pct,
            } => {
                check_period("stop atr_period", *atr_period)?;
                check_fraction("stop cap_pct", *cap_pct)
            }
            StopConfig::Percent { trail_pct } => check_fraction("stop trail_pct", *trail_pct),
            StopConfig::VwmaAnchor {
                vwma_period,
                offset_pct,
            } => {
                check_period("stop vwma_period", *vwma_period)?;
                check_fraction("stop offset_pct", *offset_pct)
            }
            StopConfig::Staged { base_pct, stages } => {
                check_fraction("stop base_pct", *base_pct)?;
                if !stages.windows(2).all(|w| w[0].profit_pct < w[1].profit_pct) {
                    return Err(ConfigError::UnorderedStages);
                }
                for stage in stages {
                    check_fraction("stage trail_pct", stage.trail_pct)?;
                }
                Ok(())
            }
        }
    }

    /// Indicator series the driver must compute for this stop, if any.
    pub fn indicator(&self) -> Option<Box<dyn Indicator>> {
        match self {
            StopConfig::AtrCapped { atr_period, .. } => Some(Box::new(Atr::new(*atr_period))),
            StopConfig::VwmaAnchor { vwma_period, .. } => Some(Box::new(Vwma::new(*vwma_period))),
            StopConfig::Percent { .. } | StopConfig::Staged { .. } => None,
        }
    }

    /// Build the stop for a position opened at `entry_price`.
    ///
    /// `indicator_at_entry` is the value of [`StopConfig::indicator`]'s
    /// series at the entry bar; an unavailable ATR falls back to the
    /// percent cap alone.
    pub fn build(
        &self,
        direction: Direction,
        entry_price: f64,
        indicator_at_entry: Option<f64>,
    ) -> Box<dyn TrailingStop> {
        match self {
            StopConfig::AtrCapped { cap_pct, .. } => {
                let cap = entry_price * cap_pct;
                let atr = indicator_at_entry
                    .filter(|v| v.is_finite() && *v > 0.0)
                    .unwrap_or(cap);
                Box::new(AtrCapped::new(direction, entry_price, atr.min(cap), *cap_pct))
            }
            StopConfig::Percent { trail_pct } => {
                Box::new(PercentTrail::new(direction, entry_price, *trail_pct))
            }
            StopConfig::VwmaAnchor { offset_pct, .. } => {
                Box::new(VwmaAnchor::new(direction, entry_price, *offset_pct))
            }
            StopConfig::Staged { base_pct, stages } => Box::new(StagedPercent::new(
                direction,
                entry_price,
                *base_pct,
                stages.clone(),
            )),
        }
    }
}

// ─── Factory ─────────────────────────────────────────────────────────

/// Build a signal generator from a validated configuration.
pub fn build_generator(config: &GeneratorConfig) -> Box<dyn SignalGenerator> {
    match config {
        GeneratorConfig::VwmaCross {
            fast_period,
            slow_period,
            min_gap,
            gap_window,
        } => Box::new(VwmaCross::new(
            *fast_period,
            *slow_period,
            *min_gap,
            *gap_window,
        )),
        GeneratorConfig::Windowed(w) => Box::new(build_matcher(w)),
    }
}

fn build_matcher(config: &WindowedConfig) -> WindowMatcher {
    let mut indicators: Vec<Box<dyn Indicator>> = Vec::new();
    let mut conditions: Vec<Box<dyn Condition>> = Vec::new();

    let trigger = match &config.trigger {
        TriggerConfig::VwmaCross {
            fast_period,
            slow_period,
        } => {
            indicators.push(Box::new(Vwma::new(*fast_period)));
            indicators.push(Box::new(Vwma::new(*slow_period)));
            Trigger::VwmaCross {
                fast_key: format!("vwma_{fast_period}"),
                slow_key: format!("vwma_{slow_period}"),
            }
        }
        TriggerConfig::DiCross { period } => {
            indicators.push(Box::new(Dmi::new(*period, DmiLine::PlusDi)));
            indicators.push(Box::new(Dmi::new(*period, DmiLine::MinusDi)));
            Trigger::DiCross {
                plus_key: format!("plus_di_{period}"),
                minus_key: format!("minus_di_{period}"),
            }
        }
        TriggerConfig::StochCross {
            k_period,
            smooth_k,
            d_period,
        } => {
            indicators.push(Box::new(Stochastic::new(
                *k_period,
                *smooth_k,
                *d_period,
                StochLine::K,
            )));
            indicators.push(Box::new(Stochastic::new(
                *k_period,
                *smooth_k,
                *d_period,
                StochLine::D,
            )));
            Trigger::StochCross {
                k_key: format!("stoch_k_{k_period}_{smooth_k}_{d_period}"),
                d_key: format!("stoch_d_{k_period}_{smooth_k}_{d_period}"),
            }
        }
        TriggerConfig::Candle => Trigger::Candle,
    };

    let c = &config.conditions;
    if let Some(cfg) = &c.vwma_slope {
        indicators.push(Box::new(Vwma::new(cfg.period)));
        conditions.push(Box::new(VwmaSlope {
            key: format!("vwma_{}", cfg.period),
            min_slope_pct: cfg.min_slope_pct,
        }));
    }
    if let Some(cfg) = &c.di {
        indicators.push(Box::new(Dmi::new(cfg.period, DmiLine::PlusDi)));
        indicators.push(Box::new(Dmi::new(cfg.period, DmiLine::MinusDi)));
        conditions.push(Box::new(DiBalance {
            plus_key: format!("plus_di_{}", cfg.period),
            minus_key: format!("minus_di_{}", cfg.period),
            mode: if cfg.crossover {
                DiMode::Crossover
            } else {
                DiMode::Position
            },
        }));
    }
    if let Some(cfg) = &c.dx_adx {
        indicators.push(Box::new(Dmi::new(cfg.period, DmiLine::Dx)));
        indicators.push(Box::new(Dmi::new(cfg.period, DmiLine::Adx)));
        conditions.push(Box::new(DxAdx {
            dx_key: format!("dx_{}", cfg.period),
            adx_key: format!("adx_{}", cfg.period),
        }));
    }
    if let Some(cfg) = &c.macd {
        indicators.push(Box::new(Macd::new(
            cfg.fast,
            cfg.slow,
            cfg.signal,
            MacdLine::Macd,
        )));
        indicators.push(Box::new(Macd::new(
            cfg.fast,
            cfg.slow,
            cfg.signal,
            MacdLine::Signal,
        )));
        indicators.push(Box::new(Macd::new(
            cfg.fast,
            cfg.slow,
            cfg.signal,
            MacdLine::Histogram,
        )));
        let suffix = format!("{}_{}_{}", cfg.fast, cfg.slow, cfg.signal);
        conditions.push(Box::new(MacdGate {
            macd_key: format!("macd_{suffix}"),
            signal_key: format!("macd_signal_{suffix}"),
            hist_key: format!("macd_hist_{suffix}"),
            mode: match cfg.mode {
                MacdModeConfig::Sign => MacdMode::Sign,
                MacdModeConfig::Histogram => MacdMode::Histogram,
                MacdModeConfig::Cross => MacdMode::Cross,
            },
        }));
    }
    if let Some(cfg) = &c.stoch {
        indicators.push(Box::new(Stochastic::new(
            cfg.k_period,
            cfg.smooth_k,
            cfg.d_period,
            StochLine::K,
        )));
        indicators.push(Box::new(Stochastic::new(
            cfg.k_period,
            cfg.smooth_k,
            cfg.d_period,
            StochLine::D,
        )));
        let suffix = format!("{}_{}_{}", cfg.k_period, cfg.smooth_k, cfg.d_period);
        conditions.push(Box::new(StochGate {
            k_key: format!("stoch_k_{suffix}"),
            d_key: format!("stoch_d_{suffix}"),
            mode: match cfg.mode {
                StochModeConfig::Extreme {
                    oversold,
                    overbought,
                } => StochMode::Extreme {
                    oversold,
                    overbought,
                },
                StochModeConfig::Cross => StochMode::Cross,
            },
        }));
    }
    if let Some(cfg) = &c.mfi {
        indicators.push(Box::new(Mfi::new(cfg.period)));
        conditions.push(Box::new(BandGate {
            name: "mfi_band",
            key: format!("mfi_{}", cfg.period),
            lower: cfg.lower,
            upper: cfg.upper,
        }));
    }
    if let Some(cfg) = &c.cci {
        indicators.push(Box::new(Cci::new(cfg.period)));
        conditions.push(Box::new(BandGate {
            name: "cci_band",
            key: format!("cci_{}", cfg.period),
            lower: cfg.lower,
            upper: cfg.upper,
        }));
    }
    if let Some(cfg) = &c.chop {
        indicators.push(Box::new(Choppiness::new(cfg.period)));
        conditions.push(Box::new(ChopBelow {
            key: format!("chop_{}", cfg.period),
            max: cfg.max,
        }));
    }

    let candle_gate = config.candle.as_ref().map(|cfg| {
        indicators.push(Box::new(Atr::new(cfg.atr_period)));
        CandleGate {
            atr_key: format!("atr_{}", cfg.atr_period),
            min_body_atr: cfg.min_body_atr,
            min_volume_ratio: cfg.min_volume_ratio,
            volume_lookback: cfg.volume_lookback,
        }
    });

    let policy = if config.anchored {
        WindowPolicy::Anchored(config.window)
    } else {
        WindowPolicy::Sliding(config.window)
    };

    WindowMatcher::new("windowed", indicators, trigger, policy, conditions, candle_gate)
}
