//! # narrata - OHLCV price series narration
//!
//! Reduces an OHLCV table of arbitrary length to a handful of deterministic
//! analytic statements (regime, indicators, symbolic shape, patterns,
//! support/resistance) rendered as stable text for language models.
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::{Duration, NaiveDate};
//! use narrata::prelude::*;
//!
//! let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
//! let index: Vec<_> = (0..120).map(|i| start + Duration::days(i)).collect();
//! let close: Vec<f64> = (0..120).map(|i| 100.0 + i as f64 * 0.25 + (i as f64 * 0.7).sin()).collect();
//! let open: Vec<f64> = close.iter().map(|c| c - 0.2).collect();
//! let high: Vec<f64> = close.iter().map(|c| c + 0.6).collect();
//! let low: Vec<f64> = close.iter().map(|c| c - 0.8).collect();
//! let volume = vec![1_000.0; 120];
//!
//! let frame = Frame::new(index, open, high, low, close, volume)
//!     .unwrap()
//!     .with_ticker("AAPL");
//!
//! let text = narrate(&frame, &NarrateOptions::default()).unwrap();
//! assert!(text.starts_with("AAPL (120 pts, daily):"));
//! ```

pub mod analysis;
pub mod backends;
pub mod format;
pub mod frame;
pub mod narrate;
pub mod params;
pub mod sparkline;

pub mod prelude {
    pub use crate::{
        // Analyzers
        analysis::{
            analyze_indicators, analyze_regime, analyze_summary, astride_encode,
            describe_astride, describe_candlestick, describe_indicators, describe_patterns,
            describe_regime, describe_sax, describe_summary, describe_support_resistance,
            detect_candlestick_pattern, detect_chart_pattern, detect_patterns,
            find_support_resistance, sax_encode, IndicatorStats, LevelStats, PatternStats,
            PriceLevel, RegimeStats, SummaryStats, SymbolicStats,
        },
        // Backends
        backends::Capabilities,
        // Collaborators
        format::{digit_tokenize, format_sections, OutputFormat, Sections},
        frame::{infer_frequency_label, Bar, Frame, PriceSeries},
        // Composer
        narrate::{
            narrate, narrate_parallel, narrate_sections, narrate_with, NarrateOptions, Narration,
            NarrationError, SymbolicMethod,
        },
        // Parameters
        params::{
            AstrideParams, IndicatorParams, LevelParams, ParamMeta, ParamType, Parameterized,
            PatternParams, RegimeParams, SaxParams,
        },
        sparkline::make_sparkline,
        // Errors
        NarrataError,
        // Core traits
        OHLCVExt,
        // Types
        Period,
        Ratio,
        Result,
        OHLCV,
    };
}

// ============================================================
// ERRORS
// ============================================================

pub type Result<T> = std::result::Result<T, NarrataError>;

/// Errors that can occur while analyzing or narrating a frame
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NarrataError {
    /// Bad shape, missing column or out-of-range parameter
    #[error("{0}")]
    Validation(String),

    /// A computation lacks enough samples
    #[error("Not enough data to compute {what}: need {need} samples, got {got}")]
    InsufficientData {
        what: &'static str,
        need: usize,
        got: usize,
    },

    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),

    /// A method that has no reference fallback was called without its backend
    #[error("{analyzer} requires the {backend} backend, which is not available in this build")]
    BackendUnavailable {
        analyzer: &'static str,
        backend: &'static str,
    },
}

impl NarrataError {
    #[must_use]
    pub fn validation(msg: impl Into<String>) -> Self {
        NarrataError::Validation(msg.into())
    }

    #[must_use]
    pub fn insufficient(what: &'static str, need: usize, got: usize) -> Self {
        NarrataError::InsufficientData { what, need, got }
    }

    /// True for the caller-facing validation class (bad input or too little data).
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            NarrataError::Validation(_) | NarrataError::InsufficientData { .. }
        )
    }

    pub fn is_insufficient_data(&self) -> bool {
        matches!(self, NarrataError::InsufficientData { .. })
    }
}

// ============================================================
// VALIDATED TYPES
// ============================================================

/// Normalized value in range 0.0..=1.0
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Ratio(f64);

impl Ratio {
    /// Create a new Ratio, validating the value is in [0.0, 1.0]
    pub fn new(value: f64) -> Result<Self> {
        if !value.is_finite() {
            return Err(NarrataError::validation("Ratio cannot be NaN or infinite."));
        }
        if !(0.0..=1.0).contains(&value) {
            return Err(NarrataError::validation(format!(
                "Ratio = {value} out of range [0, 1]."
            )));
        }
        Ok(Self(value))
    }

    /// Create a Ratio from a compile-time constant (library internal use)
    #[doc(hidden)]
    pub const fn new_const(value: f64) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> f64 {
        self.0
    }
}

impl serde::Serialize for Ratio {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> serde::Deserialize<'de> for Ratio {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = f64::deserialize(d)?;
        Ratio::new(value).map_err(serde::de::Error::custom)
    }
}

/// Period (must be > 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period(usize);

impl Period {
    /// Create a new Period, validating value is > 0
    pub fn new(value: usize) -> Result<Self> {
        if value == 0 {
            return Err(NarrataError::validation("Period must be > 0."));
        }
        Ok(Self(value))
    }

    #[doc(hidden)]
    pub const fn new_const(value: usize) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> usize {
        self.0
    }
}

impl serde::Serialize for Period {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> serde::Deserialize<'de> for Period {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = usize::deserialize(d)?;
        Period::new(value).map_err(serde::de::Error::custom)
    }
}

// ============================================================
// OHLCV TRAITS
// ============================================================

/// Core OHLCV record trait
pub trait OHLCV {
    fn open(&self) -> f64;
    fn high(&self) -> f64;
    fn low(&self) -> f64;
    fn close(&self) -> f64;
    fn volume(&self) -> f64;

    /// Unix timestamp in seconds. Records without one cannot build a [`frame::Frame`].
    fn timestamp(&self) -> Option<i64> {
        None
    }
}

/// Extension trait with computed candle properties
pub trait OHLCVExt: OHLCV {
    #[inline]
    fn body(&self) -> f64 {
        (self.close() - self.open()).abs()
    }

    #[inline]
    fn range(&self) -> f64 {
        self.high() - self.low()
    }

    #[inline]
    fn is_bullish(&self) -> bool {
        self.close() > self.open()
    }

    #[inline]
    fn is_bearish(&self) -> bool {
        self.close() < self.open()
    }

    /// All four prices are finite
    #[inline]
    fn is_complete(&self) -> bool {
        self.open().is_finite()
            && self.high().is_finite()
            && self.low().is_finite()
            && self.close().is_finite()
    }
}

impl<T: OHLCV> OHLCVExt for T {}

// ============================================================
// TESTS
// ============================================================
