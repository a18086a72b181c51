//! Chart and candlestick patterns
//!
//! The only chart pattern is an ascending triangle: a flat top of highs
//! clustered near a high quantile, over lows with a rising linear trend.
//! Candlesticks are scanned backward from the latest bar.

use chrono::NaiveDate;
use serde::Serialize;

use super::helpers::{linear_slope, quantile_linear};
use crate::{
    backends::Capabilities,
    frame::{Bar, Frame},
    params::{Parameterized, PatternParams},
    OHLCVExt, Result,
};

/// Valid highs and lows needed before a chart pattern is considered
const MIN_CHART_SAMPLES: usize = 5;
/// Matching highs that make a flat top
const MIN_FLAT_TOP_TOUCHES: usize = 2;
/// Range floor keeping the doji ratio finite on zero-range bars
const MIN_CANDLE_RANGE: f64 = 1e-9;

pub const ASCENDING_TRIANGLE: &str = "Ascending triangle";
pub const BULLISH_ENGULFING: &str = "Bullish Engulfing";
pub const BEARISH_ENGULFING: &str = "Bearish Engulfing";
pub const INSIDE_BAR: &str = "Inside Bar";
pub const DOJI: &str = "Doji";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PatternStats {
    pub chart_pattern: Option<&'static str>,
    pub chart_pattern_since: Option<NaiveDate>,
    pub candlestick_pattern: Option<&'static str>,
    pub candlestick_date: Option<NaiveDate>,
}

pub fn detect_patterns(frame: &Frame, params: &PatternParams, caps: &Capabilities) -> Result<PatternStats> {
    params.validate()?;
    let chart = detect_chart_pattern(frame, params)?;
    let candle = detect_candlestick_pattern(frame, params, caps)?;
    Ok(PatternStats {
        chart_pattern: chart.map(|(name, _)| name),
        chart_pattern_since: chart.map(|(_, date)| date),
        candlestick_pattern: candle.map(|(name, _)| name),
        candlestick_date: candle.map(|(_, date)| date),
    })
}

// ============================================================
// CHART PATTERN
// ============================================================

/// Ascending triangle over the last `lookback` rows, with the date it started
/// forming.
pub fn detect_chart_pattern(frame: &Frame, params: &PatternParams) -> Result<Option<(&'static str, NaiveDate)>> {
    let window = frame.tail_bars(params.lookback.get());
    let highs: Vec<&Bar> = window.iter().filter(|b| b.high.is_finite()).collect();
    let lows: Vec<&Bar> = window.iter().filter(|b| b.low.is_finite()).collect();
    if highs.len() < MIN_CHART_SAMPLES || lows.len() < MIN_CHART_SAMPLES {
        return Ok(None);
    }

    let high_values: Vec<f64> = highs.iter().map(|b| b.high).collect();
    let resistance = quantile_linear(&high_values, params.resistance_quantile.get());
    let band = params.band_ratio.get();
    let (band_low, band_high) = (resistance * (1.0 - band), resistance * (1.0 + band));
    let flat_top: Vec<&&Bar> = highs
        .iter()
        .filter(|b| b.high >= band_low && b.high <= band_high)
        .collect();
    if flat_top.len() < MIN_FLAT_TOP_TOUCHES {
        return Ok(None);
    }

    let low_values: Vec<f64> = lows.iter().map(|b| b.low).collect();
    if linear_slope(&low_values) <= 0.0 {
        return Ok(None);
    }

    let since = flat_top
        .iter()
        .map(|b| b.timestamp)
        .chain(lows.iter().map(|b| b.timestamp))
        .min();
    Ok(since.map(|ts| (ASCENDING_TRIANGLE, ts.date())))
}

// ============================================================
// CANDLESTICKS
// ============================================================

/// Most recent candlestick pattern and its date.
///
/// A candlestick backend is tried first over the whole frame; when it finds
/// nothing the last `candle_window` rows are scanned in-house.
pub fn detect_candlestick_pattern(
    frame: &Frame,
    params: &PatternParams,
    caps: &Capabilities,
) -> Result<Option<(&'static str, NaiveDate)>> {
    if frame.len() < 2 {
        return Ok(None);
    }

    if let Some(backend) = caps.candlesticks.as_deref() {
        let bars: Vec<Bar> = frame.bars().collect();
        match backend.scan(&bars) {
            Some(hit) if hit.index < bars.len() => {
                tracing::debug!(backend = backend.name(), pattern = hit.name, "candlestick backend hit");
                return Ok(Some((hit.name, bars[hit.index].timestamp.date())));
            }
            _ => tracing::debug!(backend = backend.name(), "no candlestick backend hit, scanning in-house"),
        }
    }

    let window = frame.tail_bars(params.candle_window.get());
    let doji_ratio = params.doji_ratio.get();
    Ok((1..window.len()).rev().find_map(|i| {
        classify_candle(&window[i - 1], &window[i], doji_ratio).map(|name| (name, window[i].timestamp.date()))
    }))
}

/// In-house checks in priority order: engulfing, inside bar, doji.
fn classify_candle(prev: &Bar, curr: &Bar, doji_ratio: f64) -> Option<&'static str> {
    if !prev.is_complete() || !curr.is_complete() {
        return None;
    }

    if prev.is_bearish() && curr.is_bullish() && curr.open <= prev.close && curr.close >= prev.open {
        return Some(BULLISH_ENGULFING);
    }
    if prev.is_bullish() && curr.is_bearish() && curr.open >= prev.close && curr.close <= prev.open {
        return Some(BEARISH_ENGULFING);
    }
    if curr.high <= prev.high && curr.low >= prev.low {
        return Some(INSIDE_BAR);
    }
    if curr.body() / curr.range().max(MIN_CANDLE_RANGE) <= doji_ratio {
        return Some(DOJI);
    }
    None
}

pub fn describe_patterns(stats: &PatternStats) -> String {
    match (stats.chart_pattern, stats.chart_pattern_since) {
        (Some(name), Some(since)) => format!("Patterns: {name} forming since {}", since.format("%Y-%m-%d")),
        _ => "Patterns: none detected".to_string(),
    }
}

pub fn describe_candlestick(stats: &PatternStats) -> String {
    match (stats.candlestick_pattern, stats.candlestick_date) {
        (Some(name), Some(date)) => format!("Candlestick: {name} on {}", date.format("%Y-%m-%d")),
        _ => "Candlestick: none detected".to_string(),
    }
}
