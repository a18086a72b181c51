//! Optional analysis backends
//!
//! Each analyzer that has an alternative implementation talks to it through a
//! trait object held in [`Capabilities`]. Presence is resolved once (from the
//! compiled cargo features, or injected by the caller) and never mutated, so
//! concurrent narrations share one read-only capability set.
//!
//! | Concern | Trait | Feature | Reference fallback |
//! |---------|-------|---------|--------------------|
//! | Regime / ASTRIDE segmentation | [`ChangePointBackend`] | `changepoint` | rolling statistics (regime only) |
//! | RSI / MACD series | [`IndicatorBackend`] | `ta` | exponential smoothing formulas |
//! | SAX transform | [`SaxBackend`] | `symbolic` | in-house PAA + Gaussian breakpoints |
//! | Candlesticks | [`CandlestickBackend`] | `ta`, `ta-engulfing` | in-house backward scan |

use std::{
    fmt,
    sync::{Arc, OnceLock},
};

use crate::{frame::Bar, Result};

#[cfg(feature = "changepoint")]
pub mod pelt;
#[cfg(feature = "symbolic")]
pub mod sax;
#[cfg(feature = "ta")]
pub mod ta;

// ============================================================
// BACKEND TRAITS
// ============================================================

/// Penalized change-point segmentation of a one-dimensional signal
pub trait ChangePointBackend: Send + Sync {
    fn name(&self) -> &'static str;

    /// Exclusive segment end indices in ascending order; the last one is
    /// always `signal.len()`.
    fn segment(&self, signal: &[f64], min_size: usize, penalty: f64) -> Result<Vec<usize>>;
}

/// MACD line, signal and histogram aligned to the input; warmup is `NaN`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MacdSeries {
    pub line: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

/// RSI / MACD series provider. `None` means "no usable output".
pub trait IndicatorBackend: Send + Sync {
    fn name(&self) -> &'static str;

    fn rsi(&self, values: &[f64], period: usize) -> Option<Vec<f64>>;

    fn macd(&self, values: &[f64], fast: usize, slow: usize, signal: usize) -> Option<MacdSeries>;
}

/// SAX transform returning zero-based letter indices
pub trait SaxBackend: Send + Sync {
    fn name(&self) -> &'static str;

    fn transform(&self, values: &[f64], word_size: usize, alphabet_size: usize) -> Option<Vec<usize>>;
}

/// A candlestick recognized at a row of the scanned bars
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandleHit {
    pub name: &'static str,
    pub index: usize,
}

/// Candlestick scanner reporting the most recent recognized bar
pub trait CandlestickBackend: Send + Sync {
    fn name(&self) -> &'static str;

    fn scan(&self, bars: &[Bar]) -> Option<CandleHit>;
}

// ============================================================
// CAPABILITIES
// ============================================================

/// Set of optional backends available to the analyzers
#[derive(Clone, Default)]
pub struct Capabilities {
    pub changepoint: Option<Arc<dyn ChangePointBackend>>,
    pub indicators: Option<Arc<dyn IndicatorBackend>>,
    pub sax: Option<Arc<dyn SaxBackend>>,
    pub candlesticks: Option<Arc<dyn CandlestickBackend>>,
}

impl Capabilities {
    /// No optional backends; every analyzer uses its reference path.
    pub fn reference_only() -> Self {
        Self::default()
    }

    /// Backends compiled into this build
    #[allow(unused_mut)]
    pub fn detect() -> Self {
        let mut caps = Self::reference_only();
        #[cfg(feature = "changepoint")]
        {
            caps.changepoint = Some(Arc::new(pelt::Pelt::default()));
        }
        #[cfg(feature = "ta")]
        {
            caps.indicators = Some(Arc::new(ta::TaIndicators));
            caps.candlesticks = Some(Arc::new(ta::TaCandlesticks::new(cfg!(
                feature = "ta-engulfing"
            ))));
        }
        #[cfg(feature = "symbolic")]
        {
            caps.sax = Some(Arc::new(sax::FixedWindowSax));
        }
        tracing::debug!(capabilities = ?caps, "resolved analysis backends");
        caps
    }

    /// Process-wide capabilities, detected on first use
    pub fn shared() -> &'static Capabilities {
        static SHARED: OnceLock<Capabilities> = OnceLock::new();
        SHARED.get_or_init(Capabilities::detect)
    }

    #[must_use]
    pub fn with_changepoint(mut self, backend: Arc<dyn ChangePointBackend>) -> Self {
        self.changepoint = Some(backend);
        self
    }

    #[must_use]
    pub fn with_indicators(mut self, backend: Arc<dyn IndicatorBackend>) -> Self {
        self.indicators = Some(backend);
        self
    }

    #[must_use]
    pub fn with_sax(mut self, backend: Arc<dyn SaxBackend>) -> Self {
        self.sax = Some(backend);
        self
    }

    #[must_use]
    pub fn with_candlesticks(mut self, backend: Arc<dyn CandlestickBackend>) -> Self {
        self.candlesticks = Some(backend);
        self
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capabilities")
            .field("changepoint", &self.changepoint.as_ref().map(|b| b.name()))
            .field("indicators", &self.indicators.as_ref().map(|b| b.name()))
            .field("sax", &self.sax.as_ref().map(|b| b.name()))
            .field("candlesticks", &self.candlesticks.as_ref().map(|b| b.name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_only_is_empty() {
        let caps = Capabilities::reference_only();
        assert!(caps.changepoint.is_none());
        assert!(caps.indicators.is_none());
        assert!(caps.sax.is_none());
        assert!(caps.candlesticks.is_none());
    }

    #[test]
    fn test_detect_follows_features() {
        let caps = Capabilities::detect();
        assert_eq!(caps.changepoint.is_some(), cfg!(feature = "changepoint"));
        assert_eq!(caps.indicators.is_some(), cfg!(feature = "ta"));
        assert_eq!(caps.candlesticks.is_some(), cfg!(feature = "ta"));
        assert_eq!(caps.sax.is_some(), cfg!(feature = "symbolic"));
    }

    #[test]
    fn test_shared_is_stable() {
        let a = Capabilities::shared() as *const Capabilities;
        let b = Capabilities::shared() as *const Capabilities;
        assert_eq!(a, b);
    }

    #[test]
    fn test_debug_lists_names() {
        let text = format!("{:?}", Capabilities::reference_only());
        assert!(text.contains("changepoint: None"));
    }
}
