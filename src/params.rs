//! Analyzer parameters and their metadata
//!
//! Every analyzer takes a small parameter struct whose `Default` reproduces the
//! stock narration constants. The [`ParamMeta`] tables describe each knob so
//! heuristic thresholds (Bollinger squeeze quantile, volatility windows, ...)
//! can be tuned or grid-searched without touching analyzer code.
//!
//! # Example
//!
//! ```rust
//! use std::collections::HashMap;
//! use narrata::params::{IndicatorParams, Parameterized};
//!
//! for meta in IndicatorParams::param_meta() {
//!     println!("{}: {:?} (default: {})", meta.name, meta.param_type, meta.default);
//! }
//!
//! let mut overrides = HashMap::new();
//! overrides.insert("rsi_period", 21.0);
//! let params = IndicatorParams::with_params(&overrides).unwrap();
//! assert_eq!(params.rsi_period.get(), 21);
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{NarrataError, Period, Ratio, Result};

// ============================================================
// PARAMETER TYPES
// ============================================================

/// Type of parameter value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    /// Fraction in 0.0..=1.0
    Ratio,
    /// Positive integer count of samples
    Period,
    /// Unbounded real (penalties, band widths)
    Float,
}

/// Metadata for a single analyzer parameter
#[derive(Debug, Clone)]
pub struct ParamMeta {
    pub name: &'static str,
    pub param_type: ParamType,
    pub default: f64,
    /// Range for optimization: (min, max, step)
    pub range: (f64, f64, f64),
    pub description: &'static str,
}

impl ParamMeta {
    pub const fn ratio(
        name: &'static str,
        default: f64,
        range: (f64, f64, f64),
        description: &'static str,
    ) -> Self {
        Self { name, param_type: ParamType::Ratio, default, range, description }
    }

    pub const fn period(
        name: &'static str,
        default: f64,
        range: (f64, f64, f64),
        description: &'static str,
    ) -> Self {
        Self { name, param_type: ParamType::Period, default, range, description }
    }

    pub const fn float(
        name: &'static str,
        default: f64,
        range: (f64, f64, f64),
        description: &'static str,
    ) -> Self {
        Self { name, param_type: ParamType::Float, default, range, description }
    }

    /// Generate all values for grid search
    pub fn generate_grid(&self) -> Vec<f64> {
        let (min, max, step) = self.range;
        let mut values = Vec::new();
        let mut i = 0u32;
        loop {
            let v = min + step * f64::from(i);
            if v > max + 1e-9 {
                break;
            }
            values.push(v);
            i += 1;
        }
        values
    }

    /// Validate a value against this parameter's range and type
    pub fn validate(&self, value: f64) -> Result<()> {
        let (min, max, _) = self.range;
        if !value.is_finite() || value < min || value > max {
            return Err(NarrataError::validation(format!(
                "{} = {value} out of range [{min}, {max}].",
                self.name
            )));
        }
        if self.param_type == ParamType::Period && value.fract() != 0.0 {
            return Err(NarrataError::validation(format!(
                "{} must be a positive integer.",
                self.name
            )));
        }
        Ok(())
    }
}

// ============================================================
// PARAMETERIZED TRAIT
// ============================================================

/// Parameter sets that can be discovered and built from name/value maps
pub trait Parameterized: Sized {
    /// Metadata for all configurable parameters
    fn param_meta() -> &'static [ParamMeta];

    /// Build from a name/value map. Missing names keep their defaults;
    /// unknown names and out-of-range values are rejected.
    fn with_params(params: &HashMap<&str, f64>) -> Result<Self>;

    /// Cross-field checks (e.g. fast period below slow period)
    fn validate(&self) -> Result<()>;
}

// ============================================================
// PARAMETER VALUE HELPERS
// ============================================================

fn check_known(params: &HashMap<&str, f64>, meta: &[ParamMeta]) -> Result<()> {
    for (key, value) in params {
        let m = meta
            .iter()
            .find(|m| m.name == *key)
            .ok_or_else(|| NarrataError::validation(format!("Unknown parameter '{key}'.")))?;
        m.validate(*value)?;
    }
    Ok(())
}

/// Helper to get a Ratio from params with default fallback
pub fn get_ratio(params: &HashMap<&str, f64>, key: &str, default: f64) -> Result<Ratio> {
    let value = params.get(key).copied().unwrap_or(default);
    Ratio::new(value)
}

/// Helper to get a Period from params with default fallback
pub fn get_period(params: &HashMap<&str, f64>, key: &str, default: usize) -> Result<Period> {
    let value = params.get(key).copied().unwrap_or(default as f64);
    if value < 0.0 || value.fract() != 0.0 {
        return Err(NarrataError::validation(format!("{key} must be a positive integer.")));
    }
    Period::new(value as usize)
}

pub fn get_float(params: &HashMap<&str, f64>, key: &str, default: f64) -> f64 {
    params.get(key).copied().unwrap_or(default)
}

fn check_alphabet(alphabet_size: Period) -> Result<()> {
    if !(2..=26).contains(&alphabet_size.get()) {
        return Err(NarrataError::validation("alphabet_size must be between 2 and 26."));
    }
    Ok(())
}

// ============================================================
// INDICATORS
// ============================================================

/// Indicator engine settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorParams {
    pub rsi_period: Period,
    pub macd_fast: Period,
    pub macd_slow: Period,
    pub macd_signal: Period,
    pub bb_period: Period,
    pub bb_std: f64,
    /// Bandwidth quantile at or under which the bands count as squeezed
    pub squeeze_quantile: Ratio,
    pub ma_fast: Period,
    pub ma_slow: Period,
    pub volume_lookback: Period,
    /// Rolling window for return volatility
    pub volatility_window: Period,
    /// Ranking horizon for the volatility percentile
    pub volatility_lookback: Period,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            rsi_period: Period::new_const(14),
            macd_fast: Period::new_const(12),
            macd_slow: Period::new_const(26),
            macd_signal: Period::new_const(9),
            bb_period: Period::new_const(20),
            bb_std: 2.0,
            squeeze_quantile: Ratio::new_const(0.20),
            ma_fast: Period::new_const(50),
            ma_slow: Period::new_const(200),
            volume_lookback: Period::new_const(20),
            volatility_window: Period::new_const(20),
            volatility_lookback: Period::new_const(252),
        }
    }
}

static INDICATOR_META: [ParamMeta; 12] = [
    ParamMeta::period("rsi_period", 14.0, (2.0, 100.0, 1.0), "RSI smoothing period"),
    ParamMeta::period("macd_fast", 12.0, (2.0, 100.0, 1.0), "MACD fast EMA span"),
    ParamMeta::period("macd_slow", 26.0, (3.0, 200.0, 1.0), "MACD slow EMA span"),
    ParamMeta::period("macd_signal", 9.0, (2.0, 100.0, 1.0), "MACD signal EMA span"),
    ParamMeta::period("bb_period", 20.0, (2.0, 200.0, 5.0), "Bollinger moving window"),
    ParamMeta::float("bb_std", 2.0, (0.5, 4.0, 0.5), "Bollinger band width in standard deviations"),
    ParamMeta::ratio("squeeze_quantile", 0.20, (0.05, 0.5, 0.05), "Bandwidth quantile marking a squeeze"),
    ParamMeta::period("ma_fast", 50.0, (2.0, 400.0, 10.0), "Fast SMA for the cross"),
    ParamMeta::period("ma_slow", 200.0, (3.0, 800.0, 25.0), "Slow SMA for the cross"),
    ParamMeta::period("volume_lookback", 20.0, (2.0, 250.0, 5.0), "Volume moving-average window"),
    ParamMeta::period("volatility_window", 20.0, (2.0, 250.0, 5.0), "Rolling window of return volatility"),
    ParamMeta::period("volatility_lookback", 252.0, (10.0, 2520.0, 21.0), "Ranking horizon for volatility percentile"),
];

impl Parameterized for IndicatorParams {
    fn param_meta() -> &'static [ParamMeta] {
        &INDICATOR_META
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        check_known(params, Self::param_meta())?;
        let d = Self::default();
        let p = Self {
            rsi_period: get_period(params, "rsi_period", d.rsi_period.get())?,
            macd_fast: get_period(params, "macd_fast", d.macd_fast.get())?,
            macd_slow: get_period(params, "macd_slow", d.macd_slow.get())?,
            macd_signal: get_period(params, "macd_signal", d.macd_signal.get())?,
            bb_period: get_period(params, "bb_period", d.bb_period.get())?,
            bb_std: get_float(params, "bb_std", d.bb_std),
            squeeze_quantile: get_ratio(params, "squeeze_quantile", d.squeeze_quantile.get())?,
            ma_fast: get_period(params, "ma_fast", d.ma_fast.get())?,
            ma_slow: get_period(params, "ma_slow", d.ma_slow.get())?,
            volume_lookback: get_period(params, "volume_lookback", d.volume_lookback.get())?,
            volatility_window: get_period(params, "volatility_window", d.volatility_window.get())?,
            volatility_lookback: get_period(
                params,
                "volatility_lookback",
                d.volatility_lookback.get(),
            )?,
        };
        p.validate()?;
        Ok(p)
    }

    fn validate(&self) -> Result<()> {
        if self.rsi_period.get() < 2 {
            return Err(NarrataError::validation("RSI period must be >= 2."));
        }
        if self.macd_fast >= self.macd_slow {
            return Err(NarrataError::validation(
                "fast_period must be smaller than slow_period.",
            ));
        }
        if self.ma_fast >= self.ma_slow {
            return Err(NarrataError::validation(
                "ma_fast must be smaller than ma_slow.",
            ));
        }
        if !self.bb_std.is_finite() || self.bb_std <= 0.0 {
            return Err(NarrataError::validation("bb_std must be > 0."));
        }
        Ok(())
    }
}

// ============================================================
// REGIME
// ============================================================

/// Regime classifier settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegimeParams {
    /// Rolling window; also the change-point minimum segment size
    pub window: Period,
    pub penalty: f64,
    /// Mean return separating trends from ranging markets
    pub trend_threshold: f64,
    /// Returns required before the change-point path is attempted
    pub changepoint_min_samples: Period,
}

impl Default for RegimeParams {
    fn default() -> Self {
        Self {
            window: Period::new_const(20),
            penalty: 3.0,
            trend_threshold: 0.0005,
            changepoint_min_samples: Period::new_const(40),
        }
    }
}

static REGIME_META: [ParamMeta; 4] = [
    ParamMeta::period("window", 20.0, (5.0, 250.0, 5.0), "Rolling window of returns"),
    ParamMeta::float("penalty", 3.0, (0.1, 50.0, 0.5), "Change-point penalty"),
    ParamMeta::float("trend_threshold", 0.0005, (0.0, 0.01, 0.0005), "Mean return threshold for trend labels"),
    ParamMeta::period("changepoint_min_samples", 40.0, (10.0, 500.0, 10.0), "Returns needed for segmentation"),
];

impl Parameterized for RegimeParams {
    fn param_meta() -> &'static [ParamMeta] {
        &REGIME_META
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        check_known(params, Self::param_meta())?;
        let d = Self::default();
        let p = Self {
            window: get_period(params, "window", d.window.get())?,
            penalty: get_float(params, "penalty", d.penalty),
            trend_threshold: get_float(params, "trend_threshold", d.trend_threshold),
            changepoint_min_samples: get_period(
                params,
                "changepoint_min_samples",
                d.changepoint_min_samples.get(),
            )?,
        };
        p.validate()?;
        Ok(p)
    }

    fn validate(&self) -> Result<()> {
        if self.window.get() < 5 {
            return Err(NarrataError::validation("window must be >= 5."));
        }
        if !self.penalty.is_finite() {
            return Err(NarrataError::validation("penalty must be finite."));
        }
        if !self.trend_threshold.is_finite() || self.trend_threshold < 0.0 {
            return Err(NarrataError::validation("trend_threshold must be >= 0."));
        }
        Ok(())
    }
}

// ============================================================
// SYMBOLIC
// ============================================================

/// SAX settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaxParams {
    pub word_size: Period,
    pub alphabet_size: Period,
}

impl Default for SaxParams {
    fn default() -> Self {
        Self {
            word_size: Period::new_const(16),
            alphabet_size: Period::new_const(8),
        }
    }
}

static SAX_META: [ParamMeta; 2] = [
    ParamMeta::period("word_size", 16.0, (2.0, 128.0, 2.0), "Number of PAA segments"),
    ParamMeta::period("alphabet_size", 8.0, (2.0, 26.0, 1.0), "Number of letters"),
];

impl Parameterized for SaxParams {
    fn param_meta() -> &'static [ParamMeta] {
        &SAX_META
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        check_known(params, Self::param_meta())?;
        let d = Self::default();
        let p = Self {
            word_size: get_period(params, "word_size", d.word_size.get())?,
            alphabet_size: get_period(params, "alphabet_size", d.alphabet_size.get())?,
        };
        p.validate()?;
        Ok(p)
    }

    fn validate(&self) -> Result<()> {
        if self.word_size.get() < 2 {
            return Err(NarrataError::validation("word_size must be >= 2."));
        }
        check_alphabet(self.alphabet_size)
    }
}

/// ASTRIDE settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AstrideParams {
    /// Approximate segment count; guides the minimum segment size only
    pub n_segments: Period,
    pub alphabet_size: Period,
    pub penalty: f64,
}

impl Default for AstrideParams {
    fn default() -> Self {
        Self {
            n_segments: Period::new_const(16),
            alphabet_size: Period::new_const(8),
            penalty: 3.0,
        }
    }
}

static ASTRIDE_META: [ParamMeta; 3] = [
    ParamMeta::period("n_segments", 16.0, (2.0, 128.0, 2.0), "Approximate number of segments"),
    ParamMeta::period("alphabet_size", 8.0, (2.0, 26.0, 1.0), "Number of letters"),
    ParamMeta::float("penalty", 3.0, (0.1, 50.0, 0.5), "Change-point penalty"),
];

impl Parameterized for AstrideParams {
    fn param_meta() -> &'static [ParamMeta] {
        &ASTRIDE_META
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        check_known(params, Self::param_meta())?;
        let d = Self::default();
        let p = Self {
            n_segments: get_period(params, "n_segments", d.n_segments.get())?,
            alphabet_size: get_period(params, "alphabet_size", d.alphabet_size.get())?,
            penalty: get_float(params, "penalty", d.penalty),
        };
        p.validate()?;
        Ok(p)
    }

    fn validate(&self) -> Result<()> {
        if self.n_segments.get() < 2 {
            return Err(NarrataError::validation("n_segments must be >= 2."));
        }
        if !self.penalty.is_finite() {
            return Err(NarrataError::validation("penalty must be finite."));
        }
        check_alphabet(self.alphabet_size)
    }
}

// ============================================================
// PATTERNS
// ============================================================

/// Chart and candlestick pattern settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternParams {
    /// Rows inspected for chart patterns
    pub lookback: Period,
    /// Rows scanned backward for candlesticks
    pub candle_window: Period,
    /// Body/range ratio at or under which a candle is a doji
    pub doji_ratio: Ratio,
    /// Half-width of the flat-top band around resistance
    pub band_ratio: Ratio,
    /// Quantile of highs taken as resistance
    pub resistance_quantile: Ratio,
}

impl Default for PatternParams {
    fn default() -> Self {
        Self {
            lookback: Period::new_const(60),
            candle_window: Period::new_const(60),
            doji_ratio: Ratio::new_const(0.10),
            band_ratio: Ratio::new_const(0.01),
            resistance_quantile: Ratio::new_const(0.85),
        }
    }
}

static PATTERN_META: [ParamMeta; 5] = [
    ParamMeta::period("lookback", 60.0, (10.0, 500.0, 10.0), "Rows inspected for chart patterns"),
    ParamMeta::period("candle_window", 60.0, (2.0, 500.0, 10.0), "Rows scanned for candlesticks"),
    ParamMeta::ratio("doji_ratio", 0.10, (0.01, 0.3, 0.01), "Max body/range ratio of a doji"),
    ParamMeta::ratio("band_ratio", 0.01, (0.001, 0.05, 0.001), "Flat-top band half-width"),
    ParamMeta::ratio("resistance_quantile", 0.85, (0.5, 1.0, 0.05), "Quantile of highs used as resistance"),
];

impl Parameterized for PatternParams {
    fn param_meta() -> &'static [ParamMeta] {
        &PATTERN_META
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        check_known(params, Self::param_meta())?;
        let d = Self::default();
        let p = Self {
            lookback: get_period(params, "lookback", d.lookback.get())?,
            candle_window: get_period(params, "candle_window", d.candle_window.get())?,
            doji_ratio: get_ratio(params, "doji_ratio", d.doji_ratio.get())?,
            band_ratio: get_ratio(params, "band_ratio", d.band_ratio.get())?,
            resistance_quantile: get_ratio(
                params,
                "resistance_quantile",
                d.resistance_quantile.get(),
            )?,
        };
        p.validate()?;
        Ok(p)
    }

    fn validate(&self) -> Result<()> {
        if self.lookback.get() < 10 {
            return Err(NarrataError::validation("lookback must be >= 10."));
        }
        if self.candle_window.get() < 2 {
            return Err(NarrataError::validation("candle_window must be >= 2."));
        }
        Ok(())
    }
}

// ============================================================
// LEVELS
// ============================================================

/// Support/resistance settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelParams {
    /// Clustering tolerance as a fraction of the current price
    pub tolerance_ratio: Ratio,
    pub max_levels: Period,
    /// Neighborhood size for local extrema
    pub extrema_order: Period,
}

impl Default for LevelParams {
    fn default() -> Self {
        Self {
            tolerance_ratio: Ratio::new_const(0.01),
            max_levels: Period::new_const(2),
            extrema_order: Period::new_const(5),
        }
    }
}

static LEVEL_META: [ParamMeta; 3] = [
    ParamMeta::ratio("tolerance_ratio", 0.01, (0.001, 0.1, 0.001), "Clustering tolerance"),
    ParamMeta::period("max_levels", 2.0, (1.0, 10.0, 1.0), "Levels kept per side"),
    ParamMeta::period("extrema_order", 5.0, (1.0, 50.0, 1.0), "Extrema neighborhood size"),
];

impl Parameterized for LevelParams {
    fn param_meta() -> &'static [ParamMeta] {
        &LEVEL_META
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        check_known(params, Self::param_meta())?;
        let d = Self::default();
        let p = Self {
            tolerance_ratio: get_ratio(params, "tolerance_ratio", d.tolerance_ratio.get())?,
            max_levels: get_period(params, "max_levels", d.max_levels.get())?,
            extrema_order: get_period(params, "extrema_order", d.extrema_order.get())?,
        };
        p.validate()?;
        Ok(p)
    }

    fn validate(&self) -> Result<()> {
        if self.tolerance_ratio.get() <= 0.0 {
            return Err(NarrataError::validation("tolerance_ratio must be > 0."));
        }
        Ok(())
    }
}

// ============================================================
// TESTS
// ============================================================
