//! Regime classification
//!
//! Labels the current stretch of returns with a trend and a volatility level.
//! With a change-point backend and enough returns the stretch is the last
//! detected segment; otherwise it is found by walking rolling statistics
//! backward until either label changes.

use chrono::NaiveDate;
use serde::Serialize;

use super::helpers::{mean, median, rolling_mean, rolling_std, std_pop};
use crate::{
    backends::{Capabilities, ChangePointBackend},
    frame::{Frame, PriceSeries},
    params::{Parameterized, RegimeParams},
    NarrataError, Result,
};

/// Change-point segments are never shorter than this many returns
const MIN_CHANGEPOINT_SEGMENT: usize = 10;
/// Lower bound applied to the change-point penalty
const MIN_PENALTY: f64 = 0.1;

label_enum!(TrendLabel {
    Uptrend => "Uptrend",
    Downtrend => "Downtrend",
    Ranging => "Ranging",
});

label_enum!(VolatilityLabel {
    High => "high",
    Low => "low",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RegimeStats {
    pub trend: TrendLabel,
    pub volatility: VolatilityLabel,
    pub start_date: NaiveDate,
}

pub fn analyze_regime(
    frame: &Frame,
    column: &str,
    params: &RegimeParams,
    caps: &Capabilities,
) -> Result<RegimeStats> {
    params.validate()?;
    let window = params.window.get();
    let returns = frame.series(column)?.returns();
    if returns.len() < window {
        return Err(NarrataError::insufficient("regime", window, returns.len()));
    }

    let min_samples = window.max(params.changepoint_min_samples.get());
    match caps.changepoint.as_deref() {
        Some(backend) if returns.len() >= min_samples => {
            tracing::debug!(backend = backend.name(), returns = returns.len(), "regime change-point path");
            with_changepoints(backend, &returns, params)
        }
        _ => {
            tracing::debug!(returns = returns.len(), "regime rolling path");
            with_rolling(&returns, params)
        }
    }
}

pub fn describe_regime(stats: &RegimeStats) -> String {
    format!(
        "Regime: {} since {} ({} volatility)",
        stats.trend,
        stats.start_date.format("%Y-%m-%d"),
        stats.volatility
    )
}

fn trend_label(mean_return: f64, threshold: f64) -> TrendLabel {
    if mean_return > threshold {
        TrendLabel::Uptrend
    } else if mean_return < -threshold {
        TrendLabel::Downtrend
    } else {
        TrendLabel::Ranging
    }
}

fn volatility_label(vol: f64, baseline: f64) -> VolatilityLabel {
    if vol > baseline {
        VolatilityLabel::High
    } else {
        VolatilityLabel::Low
    }
}

fn with_changepoints(
    backend: &dyn ChangePointBackend,
    returns: &PriceSeries,
    params: &RegimeParams,
) -> Result<RegimeStats> {
    let r = &returns.values;
    let min_size = MIN_CHANGEPOINT_SEGMENT.max(params.window.get());
    let bkps = backend.segment(r, min_size, params.penalty.max(MIN_PENALTY))?;

    let end = bkps.last().copied().unwrap_or(r.len()).min(r.len());
    let mut start = if bkps.len() > 1 { bkps[bkps.len() - 2] } else { 0 };
    if start >= end {
        start = 0;
    }
    let segment = &r[start..end.max(start)];
    let segment = if segment.is_empty() { &r[..] } else { segment };

    Ok(RegimeStats {
        trend: trend_label(mean(segment), params.trend_threshold),
        volatility: volatility_label(std_pop(segment), std_pop(r)),
        start_date: returns.index[start].date(),
    })
}

fn with_rolling(returns: &PriceSeries, params: &RegimeParams) -> Result<RegimeStats> {
    let window = params.window.get();
    let means = rolling_mean(&returns.values, window);
    let stds = rolling_std(&returns.values, window);

    // positions where the window is full, with their timestamps
    let rows: Vec<(f64, f64, NaiveDate)> = means
        .iter()
        .zip(&stds)
        .zip(&returns.index)
        .filter(|((m, s), _)| m.is_finite() && s.is_finite())
        .map(|((m, s), ts)| (*m, *s, ts.date()))
        .collect();
    let Some(&(last_mean, last_std, last_date)) = rows.last() else {
        return Err(NarrataError::insufficient("regime", window, returns.len()));
    };

    let baseline = median(&rows.iter().map(|r| r.1).collect::<Vec<_>>());
    let threshold = params.trend_threshold;
    let current = (trend_label(last_mean, threshold), volatility_label(last_std, baseline));

    let start_date = rows
        .iter()
        .rev()
        .take_while(|(m, s, _)| (trend_label(*m, threshold), volatility_label(*s, baseline)) == current)
        .last()
        .map_or(last_date, |r| r.2);

    Ok(RegimeStats {
        trend: current.0,
        volatility: current.1,
        start_date,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, NaiveDateTime};

    use super::*;

    fn frame_from_close(close: Vec<f64>) -> Frame {
        let t0 = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let index: Vec<NaiveDateTime> = (0..close.len()).map(|i| t0 + Duration::days(i as i64)).collect();
        let n = close.len();
        Frame::new(index, close.clone(), close.clone(), close.clone(), close, vec![1.0; n]).unwrap()
    }

    /// Splits the signal in two at a fixed index
    struct FixedSplit(usize);

    impl ChangePointBackend for FixedSplit {
        fn name(&self) -> &'static str {
            "fixed-split"
        }

        fn segment(&self, signal: &[f64], _min_size: usize, _penalty: f64) -> Result<Vec<usize>> {
            Ok(vec![self.0, signal.len()])
        }
    }

    #[test]
    fn test_increasing_series_is_uptrend() {
        let close: Vec<f64> = (0..120).map(|i| 100.0 + i as f64).collect();
        let frame = frame_from_close(close);
        let params = RegimeParams::default();
        for caps in [Capabilities::reference_only(), Capabilities::detect()] {
            let stats = analyze_regime(&frame, "Close", &params, &caps).unwrap();
            assert_eq!(stats.trend, TrendLabel::Uptrend);
        }
    }

    #[test]
    fn test_rolling_start_date_walks_back() {
        // flat for 60 days, then a steady climb
        let mut close = vec![100.0; 60];
        close.extend((1..=60).map(|i| 100.0 * 1.01f64.powi(i)));
        let frame = frame_from_close(close);
        let stats =
            analyze_regime(&frame, "Close", &RegimeParams::default(), &Capabilities::reference_only()).unwrap();
        assert_eq!(stats.trend, TrendLabel::Uptrend);
        assert!(stats.start_date > NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    }

    #[test]
    fn test_changepoint_segment_drives_labels() {
        let mut close: Vec<f64> = (0..60).map(|i| 100.0 * 1.01f64.powi(i)).collect();
        let top = *close.last().unwrap();
        close.extend((1..=60).map(|i| top * 0.99f64.powi(i)));
        let frame = frame_from_close(close);
        let caps = Capabilities::reference_only().with_changepoint(Arc::new(FixedSplit(59)));
        let stats = analyze_regime(&frame, "Close", &RegimeParams::default(), &caps).unwrap();
        assert_eq!(stats.trend, TrendLabel::Downtrend);
        // return 59 belongs to the 61st price
        assert_eq!(stats.start_date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }

    #[test]
    fn test_short_series_uses_rolling_even_with_backend() {
        let close: Vec<f64> = (0..30).map(|i| 100.0 - i as f64 * 0.5).collect();
        let frame = frame_from_close(close);
        let caps = Capabilities::reference_only().with_changepoint(Arc::new(FixedSplit(1)));
        let stats = analyze_regime(&frame, "Close", &RegimeParams::default(), &caps).unwrap();
        assert_eq!(stats.trend, TrendLabel::Downtrend);
    }

    #[test]
    fn test_errors() {
        let frame = frame_from_close(vec![1.0; 10]);
        let err =
            analyze_regime(&frame, "Close", &RegimeParams::default(), &Capabilities::reference_only()).unwrap_err();
        assert!(err.is_insufficient_data());

        let params = RegimeParams { window: crate::Period::new_const(4), ..RegimeParams::default() };
        let err = analyze_regime(&frame, "Close", &params, &Capabilities::reference_only()).unwrap_err();
        assert!(err.to_string().contains(">= 5"));

        assert!(analyze_regime(&frame, "Nope", &RegimeParams::default(), &Capabilities::reference_only()).is_err());
    }

    #[test]
    fn test_describe() {
        let stats = RegimeStats {
            trend: TrendLabel::Ranging,
            volatility: VolatilityLabel::High,
            start_date: NaiveDate::from_ymd_opt(2025, 3, 7).unwrap(),
        };
        assert_eq!(describe_regime(&stats), "Regime: Ranging since 2025-03-07 (high volatility)");
    }
}
