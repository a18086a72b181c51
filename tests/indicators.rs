//! Indicator engine through the public API, with and without backends.

mod common;

use std::sync::Arc;

use common::{frame_from_close, generate_frame};
use narrata::analysis::{BollingerPosition, RsiState};
use narrata::backends::{IndicatorBackend, MacdSeries};
use narrata::prelude::*;

/// Backend that never produces anything
struct Silent;

impl IndicatorBackend for Silent {
    fn name(&self) -> &'static str {
        "silent"
    }

    fn rsi(&self, _values: &[f64], _period: usize) -> Option<Vec<f64>> {
        None
    }

    fn macd(&self, _values: &[f64], _fast: usize, _slow: usize, _signal: usize) -> Option<MacdSeries> {
        None
    }
}

/// Backend reporting a fixed RSI
struct FixedRsi(f64);

impl IndicatorBackend for FixedRsi {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn rsi(&self, values: &[f64], _period: usize) -> Option<Vec<f64>> {
        Some(vec![self.0; values.len()])
    }

    fn macd(&self, _values: &[f64], _fast: usize, _slow: usize, _signal: usize) -> Option<MacdSeries> {
        None
    }
}

#[test]
fn test_full_indicator_set() {
    let frame = generate_frame(300);
    for caps in [Capabilities::reference_only(), Capabilities::detect()] {
        let stats = analyze_indicators(&frame, "Close", &IndicatorParams::default(), &caps).unwrap();
        assert!((0.0..=100.0).contains(&stats.rsi_value));
        assert!((stats.macd_histogram - (stats.macd_value - stats.macd_signal)).abs() < 1e-9);
        assert!(stats.bb_position.is_some());
        assert!(stats.ma_cross.is_some());
        assert!(stats.volume_state.is_some());
        assert!(stats.volatility_state.is_some());

        let text = describe_indicators(&stats);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("RSI(14): "));
        assert!(lines[0].contains("  MACD: "));
        assert!(lines[1].starts_with("BB: "));
        assert!(lines[2].starts_with("SMA 50/200: "));
        assert!(lines[3].starts_with("Volume: "));
        assert!(lines[4].starts_with("Volatility: "));
    }
}

#[test]
fn test_silent_backend_matches_reference() {
    let frame = generate_frame(120);
    let params = IndicatorParams::default();
    let reference = analyze_indicators(&frame, "Close", &params, &Capabilities::reference_only()).unwrap();
    let caps = Capabilities::reference_only().with_indicators(Arc::new(Silent));
    let fallback = analyze_indicators(&frame, "Close", &params, &caps).unwrap();
    assert_eq!(reference, fallback);
}

#[test]
fn test_backend_rsi_is_used() {
    let frame = generate_frame(120);
    let caps = Capabilities::reference_only().with_indicators(Arc::new(FixedRsi(81.5)));
    let stats = analyze_indicators(&frame, "Close", &IndicatorParams::default(), &caps).unwrap();
    assert_eq!(stats.rsi_value, 81.5);
    assert_eq!(stats.rsi_state, RsiState::Overbought);
}

#[test]
fn test_short_history_omits_optional_parts() {
    let frame = generate_frame(40);
    let stats =
        analyze_indicators(&frame, "Close", &IndicatorParams::default(), &Capabilities::reference_only()).unwrap();
    assert!(stats.ma_cross.is_none());
    assert!(stats.bb_position.is_some());
    assert_eq!(describe_indicators(&stats).lines().count(), 4);
}

#[test]
fn test_too_short_for_macd_fails() {
    let frame = generate_frame(30);
    let err = analyze_indicators(&frame, "Close", &IndicatorParams::default(), &Capabilities::reference_only())
        .unwrap_err();
    assert!(err.is_insufficient_data());
    assert!(err.to_string().contains("MACD"));
}

#[test]
fn test_flat_series() {
    let frame = frame_from_close(&[50.0; 260]);
    for caps in [Capabilities::reference_only(), Capabilities::detect()] {
        let stats = analyze_indicators(&frame, "Close", &IndicatorParams::default(), &caps).unwrap();
        assert_eq!(stats.bb_position, Some(BollingerPosition::AtMidline));
        assert_eq!(stats.ma_cross, None);
        assert_eq!(stats.volatility_state, None);
        assert!(stats.rsi_value.is_finite());
    }
}

#[test]
fn test_stats_serialize() {
    let frame = generate_frame(300);
    let stats =
        analyze_indicators(&frame, "Close", &IndicatorParams::default(), &Capabilities::reference_only()).unwrap();
    let json = serde_json::to_value(&stats).unwrap();
    assert_eq!(json["rsi_period"], 14);
    assert!(json["rsi_state"].is_string());
    assert!(json["ma_cross"].as_str().unwrap().ends_with("cross"));
}
