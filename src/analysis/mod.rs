//! Analyzers
//!
//! Each analyzer is a pure function of a [`Frame`](crate::frame::Frame) and its
//! parameter struct returning an immutable stats value, paired with a
//! `describe_*` formatter that renders the stats as one or two stable lines.
//!
//! - **Indicators**: RSI, MACD, Bollinger, MA cross, volume, volatility rank
//! - **Regime**: trend/volatility label of the current segment
//! - **Symbolic**: SAX and ASTRIDE words
//! - **Patterns**: ascending triangle and candlesticks
//! - **Levels**: clustered support/resistance
//! - **Summary**: range, mean and change of one column

/// Generate a label enum with `label()`, `Display` and label-valued serde.
macro_rules! label_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),* $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
        pub enum $name {
            $(#[serde(rename = $label)] $variant),*
        }

        impl $name {
            pub fn label(self) -> &'static str {
                match self {
                    $(Self::$variant => $label),*
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.label())
            }
        }
    };
}

pub mod helpers;
pub mod indicators;
pub mod levels;
pub mod patterns;
pub mod regime;
pub mod summary;
pub mod symbolic;

pub use indicators::{
    analyze_indicators, compute_bollinger, compute_ma_crossover, compute_macd, compute_rsi,
    compute_volatility_percentile, compute_volume_state, describe_indicators, BollingerPosition,
    IndicatorStats, MaCross, MacdValues, RsiState, VolatilityState, VolumeState,
};
pub use levels::{describe_support_resistance, find_support_resistance, LevelStats, PriceLevel};
pub use patterns::{
    describe_candlestick, describe_patterns, detect_candlestick_pattern, detect_chart_pattern,
    detect_patterns, PatternStats,
};
pub use regime::{analyze_regime, describe_regime, RegimeStats, TrendLabel, VolatilityLabel};
pub use summary::{analyze_summary, describe_summary, SummaryStats};
pub use symbolic::{astride_encode, describe_astride, describe_sax, sax_encode, SymbolicStats};

use crate::{NarrataError, Result};

/// Turn InsufficientData into `None`; every other error still propagates.
pub(crate) fn optional<T>(what: &'static str, result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err @ NarrataError::InsufficientData { .. }) => {
            tracing::debug!(component = what, error = %err, "optional component omitted");
            Ok(None)
        }
        Err(err) => Err(err),
    }
}
