//! Technical indicator engine
//!
//! RSI and MACD are mandatory: too little data aborts the analysis. Bollinger
//! bands, the moving-average cross, volume state and volatility rank are
//! optional and come back as `None` when their window is not filled.
//!
//! RSI and MACD use the [`IndicatorBackend`] when one is available and fall
//! back to the reference formulas when it yields nothing usable.

use serde::Serialize;

use super::{
    helpers::{diff, ewm, ewm_span, float_repr, ordinal, pct_change, quantile_linear, rolling_mean, rolling_std},
    optional,
};
use crate::{
    backends::{Capabilities, IndicatorBackend},
    frame::Frame,
    params::{IndicatorParams, Parameterized},
    NarrataError, Result,
};

label_enum!(
    /// RSI zone
    RsiState {
        Overbought => "overbought",
        Oversold => "oversold",
        NeutralBullish => "neutral-bullish",
        NeutralBearish => "neutral-bearish",
    }
);

label_enum!(
    /// Latest price relative to the Bollinger bands
    BollingerPosition {
        AtMidline => "at midline",
        AboveUpper => "above upper band",
        NearUpper => "near upper band",
        BelowLower => "below lower band",
        NearLower => "near lower band",
        UpperHalf => "upper half",
        LowerHalf => "lower half",
    }
);

label_enum!(
    MaCross {
        Golden => "golden cross",
        Death => "death cross",
    }
);

label_enum!(
    VolumeState {
        UnusuallyHigh => "unusually high",
        AboveAverage => "above average",
        Average => "average",
        BelowAverage => "below average",
        UnusuallyLow => "unusually low",
    }
);

label_enum!(
    VolatilityState {
        ExtremelyLow => "extremely low",
        Low => "low",
        Moderate => "moderate",
        High => "high",
        ExtremelyHigh => "extremely high",
    }
);

/// Latest MACD sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MacdValues {
    pub line: f64,
    pub signal: f64,
    pub histogram: f64,
}

/// Indicator snapshot for the latest sample
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorStats {
    pub rsi_period: usize,
    pub rsi_value: f64,
    pub rsi_state: RsiState,
    pub macd_value: f64,
    pub macd_signal: f64,
    pub macd_histogram: f64,
    pub macd_state: String,
    pub crossover_days_ago: Option<usize>,
    pub bb_position: Option<BollingerPosition>,
    pub bb_squeeze: Option<bool>,
    pub ma_periods: (usize, usize),
    pub ma_cross: Option<MaCross>,
    pub ma_cross_days_ago: Option<usize>,
    pub volume_lookback: usize,
    pub volume_ratio: Option<f64>,
    pub volume_state: Option<VolumeState>,
    pub volatility_percentile: Option<f64>,
    pub volatility_state: Option<VolatilityState>,
}

// ============================================================
// ANALYZER
// ============================================================

pub fn analyze_indicators(
    frame: &Frame,
    column: &str,
    params: &IndicatorParams,
    caps: &Capabilities,
) -> Result<IndicatorStats> {
    params.validate()?;
    let series = frame.series(column)?;
    let values = &series.values;

    let rsi_period = params.rsi_period.get();
    let (fast, slow, signal) = (
        params.macd_fast.get(),
        params.macd_slow.get(),
        params.macd_signal.get(),
    );
    ensure_len("RSI", rsi_period + 1, values.len())?;
    ensure_len("MACD", slow + signal, values.len())?;

    let (rsi_value, macd, (macd_state, crossover_days_ago)) = match caps.indicators.as_deref() {
        Some(backend) => {
            tracing::debug!(backend = backend.name(), "indicator backend path");
            let rsi = rsi_with_backend(backend, values, rsi_period)?;
            let (macd, state) = macd_with_backend(backend, values, fast, slow, signal)?;
            (rsi, macd, state)
        }
        None => {
            tracing::debug!("indicator reference path");
            (
                compute_rsi(values, rsi_period)?,
                compute_macd(values, fast, slow, signal)?,
                classify_macd(values, fast, slow, signal),
            )
        }
    };

    let bollinger = optional(
        "bollinger",
        compute_bollinger(
            values,
            params.bb_period.get(),
            params.bb_std,
            params.squeeze_quantile.get(),
        ),
    )?;
    let (ma_cross, ma_cross_days_ago) =
        compute_ma_crossover(values, params.ma_fast.get(), params.ma_slow.get());
    let volume = optional(
        "volume",
        compute_volume_state(&frame.series("Volume")?.values, params.volume_lookback.get()),
    )?;
    let volatility = optional(
        "volatility",
        compute_volatility_percentile(
            values,
            params.volatility_window.get(),
            params.volatility_lookback.get(),
        ),
    )?;

    Ok(IndicatorStats {
        rsi_period,
        rsi_value,
        rsi_state: classify_rsi(values, rsi_value),
        macd_value: macd.line,
        macd_signal: macd.signal,
        macd_histogram: macd.histogram,
        macd_state,
        crossover_days_ago,
        bb_position: bollinger.map(|(p, _)| p),
        bb_squeeze: bollinger.map(|(_, s)| s),
        ma_periods: (params.ma_fast.get(), params.ma_slow.get()),
        ma_cross,
        ma_cross_days_ago,
        volume_lookback: params.volume_lookback.get(),
        volume_ratio: volume.map(|(r, _)| r),
        volume_state: volume.map(|(_, s)| s),
        volatility_percentile: volatility.map(|(p, _)| p),
        volatility_state: volatility.map(|(_, s)| s),
    })
}

/// Render indicator stats, one component per line.
pub fn describe_indicators(stats: &IndicatorStats) -> String {
    let rsi_part = format!(
        "RSI({}): {:.1} ({})",
        stats.rsi_period, stats.rsi_value, stats.rsi_state
    );
    let macd_part = match stats.crossover_days_ago {
        Some(days) => format!("MACD: {} crossover {days} {} ago", stats.macd_state, days_unit(days)),
        None => format!("MACD: {}", stats.macd_state),
    };

    let mut lines = vec![format!("{rsi_part}  {macd_part}")];

    if let Some(position) = stats.bb_position {
        let squeeze = if stats.bb_squeeze == Some(true) { " (squeeze)" } else { "" };
        lines.push(format!("BB: {position}{squeeze}"));
    }

    if let Some(cross) = stats.ma_cross {
        let (fast, slow) = stats.ma_periods;
        lines.push(match stats.ma_cross_days_ago {
            Some(days) => format!("SMA {fast}/{slow}: {cross} {days} {} ago", days_unit(days)),
            None => format!("SMA {fast}/{slow}: {cross}"),
        });
    }

    if let (Some(ratio), Some(state)) = (stats.volume_ratio, stats.volume_state) {
        lines.push(format!(
            "Volume: {}x {}-day avg ({state})",
            float_repr(ratio),
            stats.volume_lookback
        ));
    }

    if let (Some(pct), Some(state)) = (stats.volatility_percentile, stats.volatility_state) {
        lines.push(format!(
            "Volatility: {} percentile ({state})",
            ordinal(pct.round() as i64)
        ));
    }

    lines.join("\n")
}

fn days_unit(days: usize) -> &'static str {
    if days == 1 {
        "day"
    } else {
        "days"
    }
}

fn ensure_len(what: &'static str, need: usize, got: usize) -> Result<()> {
    if got < need {
        return Err(NarrataError::insufficient(what, need, got));
    }
    Ok(())
}

// ============================================================
// RSI
// ============================================================

/// Latest RSI with Wilder smoothing (`alpha = 1 / period`), clipped to [0, 100].
/// A window without losses reads 100.
pub fn compute_rsi(values: &[f64], period: usize) -> Result<f64> {
    if period < 2 {
        return Err(NarrataError::validation("RSI period must be >= 2."));
    }
    ensure_len("RSI", period + 1, values.len())?;

    let deltas = diff(values);
    let alpha = 1.0 / period as f64;
    let gains: Vec<f64> = deltas.iter().map(|d| d.max(0.0)).collect();
    let losses: Vec<f64> = deltas.iter().map(|d| (-d).max(0.0)).collect();
    let avg_gain = ewm(&gains, alpha).last().copied().unwrap_or(0.0);
    let avg_loss = ewm(&losses, alpha).last().copied().unwrap_or(0.0);

    if avg_loss == 0.0 {
        return Ok(100.0);
    }
    let rs = avg_gain / avg_loss;
    Ok((100.0 - 100.0 / (1.0 + rs)).clamp(0.0, 100.0))
}

fn rsi_with_backend(backend: &dyn IndicatorBackend, values: &[f64], period: usize) -> Result<f64> {
    let latest = backend
        .rsi(values, period)
        .and_then(|series| series.into_iter().rev().find(|v| v.is_finite()));
    match latest {
        Some(v) => Ok(v.clamp(0.0, 100.0)),
        None => {
            tracing::warn!(backend = backend.name(), "RSI backend returned no usable values, using reference");
            compute_rsi(values, period)
        }
    }
}

fn classify_rsi(values: &[f64], rsi: f64) -> RsiState {
    if rsi >= 70.0 {
        return RsiState::Overbought;
    }
    if rsi <= 30.0 {
        return RsiState::Oversold;
    }
    let recent = &values[values.len().saturating_sub(4)..];
    match (recent.first(), recent.last()) {
        (Some(first), Some(last)) if recent.len() >= 2 && last >= first => RsiState::NeutralBullish,
        _ => RsiState::NeutralBearish,
    }
}

// ============================================================
// MACD
// ============================================================

fn macd_lines(values: &[f64], fast: usize, slow: usize, signal: usize) -> (Vec<f64>, Vec<f64>) {
    let fast_ema = ewm_span(values, fast);
    let slow_ema = ewm_span(values, slow);
    let line: Vec<f64> = fast_ema.iter().zip(&slow_ema).map(|(f, s)| f - s).collect();
    let signal_line = ewm_span(&line, signal);
    (line, signal_line)
}

/// Latest MACD line, signal and histogram (EMAs seeded with the first value)
pub fn compute_macd(values: &[f64], fast: usize, slow: usize, signal: usize) -> Result<MacdValues> {
    if fast >= slow {
        return Err(NarrataError::validation(
            "fast_period must be smaller than slow_period.",
        ));
    }
    ensure_len("MACD", slow + signal, values.len())?;

    let (line, signal_line) = macd_lines(values, fast, slow, signal);
    let n = values.len() - 1;
    Ok(MacdValues {
        line: line[n],
        signal: signal_line[n],
        histogram: line[n] - signal_line[n],
    })
}

fn classify_macd(values: &[f64], fast: usize, slow: usize, signal: usize) -> (String, Option<usize>) {
    let (line, signal_line) = macd_lines(values, fast, slow, signal);
    classify_macd_lines(&line, &signal_line)
}

/// Direction from the latest line-minus-signal, plus days since the most recent
/// sign flip, or widening/narrowing when no flip exists.
fn classify_macd_lines(line: &[f64], signal: &[f64]) -> (String, Option<usize>) {
    let diffs: Vec<f64> = line
        .iter()
        .zip(signal)
        .filter(|(l, s)| l.is_finite() && s.is_finite())
        .map(|(l, s)| l - s)
        .collect();
    let Some(&last) = diffs.last() else {
        return ("neutral".to_string(), None);
    };

    let direction = if last >= 0.0 { "bullish" } else { "bearish" };
    if let Some(days) = days_since_flip(&diffs) {
        return (direction.to_string(), Some(days));
    }

    let widening = match diffs.len() {
        n if n >= 2 => last.abs() >= diffs[n - 2].abs(),
        _ => true,
    };
    let suffix = if widening { "widening" } else { "narrowing" };
    (format!("{direction}, {suffix}"), None)
}

#[inline]
fn sign(x: f64) -> i8 {
    if x > 0.0 {
        1
    } else if x < 0.0 {
        -1
    } else {
        0
    }
}

/// Samples since the most recent change between strictly positive and
/// strictly negative values; zeros never count as a flip.
fn days_since_flip(diffs: &[f64]) -> Option<usize> {
    let signs: Vec<i8> = diffs.iter().map(|&d| sign(d)).collect();
    (1..signs.len())
        .rev()
        .find(|&i| signs[i] != 0 && signs[i - 1] != 0 && signs[i] != signs[i - 1])
        .map(|i| signs.len() - 1 - i)
}

fn macd_with_backend(
    backend: &dyn IndicatorBackend,
    values: &[f64],
    fast: usize,
    slow: usize,
    signal: usize,
) -> Result<(MacdValues, (String, Option<usize>))> {
    let latest = backend.macd(values, fast, slow, signal).and_then(|m| {
        let last_finite = |v: &[f64]| v.iter().rev().copied().find(|x| x.is_finite());
        let macd = MacdValues {
            line: last_finite(&m.line)?,
            signal: last_finite(&m.signal)?,
            histogram: last_finite(&m.histogram)?,
        };
        Some((macd, classify_macd_lines(&m.line, &m.signal)))
    });
    match latest {
        Some(found) => Ok(found),
        None => {
            tracing::warn!(backend = backend.name(), "MACD backend returned no usable values, using reference");
            Ok((
                compute_macd(values, fast, slow, signal)?,
                classify_macd(values, fast, slow, signal),
            ))
        }
    }
}

// ============================================================
// BOLLINGER
// ============================================================

/// Band position of the latest price and whether the bands are squeezed.
///
/// The squeeze compares the latest finite bandwidth with the
/// `squeeze_quantile` quantile of the last `period` bandwidths.
pub fn compute_bollinger(
    values: &[f64],
    period: usize,
    num_std: f64,
    squeeze_quantile: f64,
) -> Result<(BollingerPosition, bool)> {
    ensure_len("Bollinger Bands", period, values.len())?;

    let sma = rolling_mean(values, period);
    let std = rolling_std(values, period);
    let n = values.len() - 1;
    let (mid, sd, price) = (sma[n], std[n], values[n]);
    let upper = mid + num_std * sd;
    let lower = mid - num_std * sd;

    let position = if upper == lower {
        BollingerPosition::AtMidline
    } else {
        let pct = (price - lower) / (upper - lower);
        match pct {
            p if p >= 0.95 => BollingerPosition::AboveUpper,
            p if p >= 0.80 => BollingerPosition::NearUpper,
            p if p <= 0.05 => BollingerPosition::BelowLower,
            p if p <= 0.20 => BollingerPosition::NearLower,
            _ if price > mid => BollingerPosition::UpperHalf,
            _ => BollingerPosition::LowerHalf,
        }
    };

    let bandwidth: Vec<f64> = sma
        .iter()
        .zip(&std)
        .map(|(m, s)| 2.0 * num_std * s / m)
        .filter(|bw| bw.is_finite())
        .collect();
    let squeeze = match bandwidth.last() {
        Some(&recent) if bandwidth.len() >= period => {
            recent <= quantile_linear(&bandwidth[bandwidth.len() - period..], squeeze_quantile)
        }
        _ => false,
    };

    Ok((position, squeeze))
}

// ============================================================
// MOVING-AVERAGE CROSS
// ============================================================

/// Golden/death cross state and samples since the last flip.
///
/// Returns `(None, None)` without enough history, and also when the two
/// averages never separate (a flat series).
pub fn compute_ma_crossover(values: &[f64], fast: usize, slow: usize) -> (Option<MaCross>, Option<usize>) {
    if values.len() < slow + 1 {
        return (None, None);
    }
    let fast_sma = rolling_mean(values, fast);
    let slow_sma = rolling_mean(values, slow);
    let diffs: Vec<f64> = fast_sma
        .iter()
        .zip(&slow_sma)
        .filter(|(f, s)| f.is_finite() && s.is_finite())
        .map(|(f, s)| {
            // rounding noise between two averages of identical prices is not a cross
            let d = f - s;
            if d.abs() <= 1e-12 * s.abs().max(1.0) {
                0.0
            } else {
                d
            }
        })
        .collect();
    if diffs.len() < 2 || diffs.iter().all(|&d| d == 0.0) {
        return (None, None);
    }

    let current = match diffs.last() {
        Some(&d) if d >= 0.0 => MaCross::Golden,
        _ => MaCross::Death,
    };
    (Some(current), days_since_flip(&diffs))
}

// ============================================================
// VOLUME
// ============================================================

/// Latest volume over its `lookback` average, rounded to two decimals.
/// A non-positive average reads as `1.0` / average.
pub fn compute_volume_state(volume: &[f64], lookback: usize) -> Result<(f64, VolumeState)> {
    ensure_len("volume state", lookback + 1, volume.len())?;

    let n = volume.len();
    let avg = super::helpers::mean(&volume[n - lookback..]);
    if avg <= 0.0 {
        return Ok((1.0, VolumeState::Average));
    }

    let ratio = volume[n - 1] / avg;
    let state = match ratio {
        r if r >= 2.0 => VolumeState::UnusuallyHigh,
        r if r >= 1.5 => VolumeState::AboveAverage,
        r if r <= 0.5 => VolumeState::UnusuallyLow,
        r if r <= 0.75 => VolumeState::BelowAverage,
        _ => VolumeState::Average,
    };
    Ok(((ratio * 100.0).round_ties_even() / 100.0, state))
}

// ============================================================
// VOLATILITY RANK
// ============================================================

/// Percentile rank of the latest rolling return volatility among its last
/// `lookback` values, rounded to a whole number.
///
/// A series whose rolling volatility is zero throughout the ranking horizon
/// has nothing to rank and reports insufficient data.
pub fn compute_volatility_percentile(
    values: &[f64],
    window: usize,
    lookback: usize,
) -> Result<(f64, VolatilityState)> {
    ensure_len("volatility percentile", window + 2, values.len())?;

    let returns = pct_change(values);
    let vols: Vec<f64> = rolling_std(&returns, window)
        .into_iter()
        .filter(|v| v.is_finite())
        .collect();
    let Some(&current) = vols.last() else {
        return Err(NarrataError::insufficient("volatility percentile", window + 1, returns.len()));
    };

    let rank_window = &vols[vols.len() - lookback.min(vols.len())..];
    if rank_window.iter().all(|v| v.abs() <= super::helpers::FLAT_STD_EPS) {
        // no non-zero volatility sample to rank against
        return Err(NarrataError::insufficient("volatility percentile", 1, 0));
    }

    let at_or_below = rank_window.iter().filter(|&&v| v <= current).count();
    let percentile = (at_or_below as f64 / rank_window.len() as f64 * 100.0).round_ties_even();

    let state = match percentile {
        p if p <= 10.0 => VolatilityState::ExtremelyLow,
        p if p <= 25.0 => VolatilityState::Low,
        p if p >= 90.0 => VolatilityState::ExtremelyHigh,
        p if p >= 75.0 => VolatilityState::High,
        _ => VolatilityState::Moderate,
    };
    Ok((percentile, state))
}

// ============================================================
// TESTS
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn wave(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 100.0 + (i as f64 * 0.35).sin() * 4.0 + i as f64 * 0.05)
            .collect()
    }

    #[test]
    fn test_rsi_bounds_and_validation() {
        let v = wave(60);
        let rsi = compute_rsi(&v, 14).unwrap();
        assert!((0.0..=100.0).contains(&rsi));
        assert!(compute_rsi(&v, 1).unwrap_err().to_string().contains(">= 2"));
        assert!(compute_rsi(&v[..14], 14).unwrap_err().is_insufficient_data());
    }

    #[test]
    fn test_rsi_without_losses_is_100() {
        let v: Vec<f64> = (0..30).map(f64::from).collect();
        assert_eq!(compute_rsi(&v, 14).unwrap(), 100.0);
        assert_eq!(compute_rsi(&[5.0; 20], 14).unwrap(), 100.0);
    }

    #[test]
    fn test_rsi_classification() {
        assert_eq!(classify_rsi(&[1.0, 2.0], 75.0), RsiState::Overbought);
        assert_eq!(classify_rsi(&[1.0, 2.0], 30.0), RsiState::Oversold);
        assert_eq!(classify_rsi(&[5.0, 1.0, 2.0, 3.0, 4.0], 50.0), RsiState::NeutralBullish);
        assert_eq!(classify_rsi(&[5.0, 4.0, 6.0, 3.0], 50.0), RsiState::NeutralBearish);
    }

    #[test]
    fn test_macd_histogram_consistency() {
        let v = wave(80);
        let m = compute_macd(&v, 12, 26, 9).unwrap();
        assert!((m.histogram - (m.line - m.signal)).abs() < 1e-12);
        assert!(compute_macd(&v, 26, 12, 9).is_err());
        assert!(compute_macd(&v[..34], 12, 26, 9).unwrap_err().is_insufficient_data());
    }

    #[test]
    fn test_macd_flip_detection() {
        let line = [1.0, 1.0, -1.0, -2.0, -3.0];
        let signal = [0.0; 5];
        assert_eq!(classify_macd_lines(&line, &signal), ("bearish".to_string(), Some(2)));

        let line = [1.0, 2.0, 3.0];
        assert_eq!(classify_macd_lines(&line, &signal[..3]), ("bullish, widening".to_string(), None));

        let line = [3.0, 2.0, 1.0];
        assert_eq!(classify_macd_lines(&line, &signal[..3]), ("bullish, narrowing".to_string(), None));

        assert_eq!(classify_macd_lines(&[], &[]), ("neutral".to_string(), None));
    }

    #[test]
    fn test_flip_ignores_zeros() {
        assert_eq!(days_since_flip(&[1.0, 0.0, -1.0, -1.0]), None);
        assert_eq!(days_since_flip(&[1.0, -1.0, 0.0, -1.0]), Some(2));
    }

    #[test]
    fn test_bollinger_flat_is_midline() {
        let (position, _) = compute_bollinger(&[10.0; 30], 20, 2.0, 0.2).unwrap();
        assert_eq!(position, BollingerPosition::AtMidline);
        assert!(compute_bollinger(&[10.0; 5], 20, 2.0, 0.2).unwrap_err().is_insufficient_data());
    }

    #[test]
    fn test_bollinger_breakout_above_upper() {
        let mut v = wave(40);
        v.push(200.0);
        let (position, _) = compute_bollinger(&v, 20, 2.0, 0.2).unwrap();
        assert_eq!(position, BollingerPosition::AboveUpper);
    }

    #[test]
    fn test_ma_cross() {
        let flat = vec![42.0; 250];
        assert_eq!(compute_ma_crossover(&flat, 50, 200), (None, None));
        assert_eq!(compute_ma_crossover(&flat[..100], 50, 200), (None, None));

        let rising: Vec<f64> = (0..250).map(|i| 10.0 + i as f64).collect();
        assert_eq!(compute_ma_crossover(&rising, 50, 200), (Some(MaCross::Golden), None));

        // falls for 220 samples, then rallies hard
        let mut v: Vec<f64> = (0..220).map(|i| 500.0 - i as f64).collect();
        v.extend((0..80).map(|i| 280.0 + i as f64 * 8.0));
        let (cross, days) = compute_ma_crossover(&v, 50, 200);
        assert_eq!(cross, Some(MaCross::Golden));
        assert!(days.is_some());
    }

    #[test]
    fn test_volume_state() {
        // the average window includes the latest bar
        let mut v = vec![100.0; 20];
        v.push(250.0);
        assert_eq!(compute_volume_state(&v, 20).unwrap(), (2.33, VolumeState::UnusuallyHigh));
        let mut v = vec![100.0; 20];
        v.push(60.0);
        assert_eq!(compute_volume_state(&v, 20).unwrap(), (0.61, VolumeState::BelowAverage));
        assert_eq!(compute_volume_state(&[0.0; 21], 20).unwrap(), (1.0, VolumeState::Average));
        assert!(compute_volume_state(&[1.0; 20], 20).is_err());
    }

    #[test]
    fn test_volume_ratio_rounds_half_to_even() {
        // 171 over a 152 average is exactly 1.125
        let mut v = vec![151.0; 20];
        v.push(171.0);
        assert_eq!(compute_volume_state(&v, 20).unwrap(), (1.12, VolumeState::Average));
    }

    #[test]
    fn test_volatility_percentile_zero_variance() {
        let err = compute_volatility_percentile(&[10.0; 60], 20, 252).unwrap_err();
        assert!(err.is_insufficient_data());
    }

    #[test]
    fn test_volatility_percentile_spike_is_high() {
        let mut v = wave(120);
        let last = *v.last().unwrap();
        v.extend([last * 1.08, last * 0.93, last * 1.1]);
        let (pct, state) = compute_volatility_percentile(&v, 20, 252).unwrap();
        assert_eq!(pct, 100.0);
        assert_eq!(state, VolatilityState::ExtremelyHigh);
    }

    #[test]
    fn test_describe_lines() {
        let stats = IndicatorStats {
            rsi_period: 14,
            rsi_value: 55.34,
            rsi_state: RsiState::NeutralBullish,
            macd_value: 0.5,
            macd_signal: 0.3,
            macd_histogram: 0.2,
            macd_state: "bullish".into(),
            crossover_days_ago: Some(1),
            bb_position: Some(BollingerPosition::UpperHalf),
            bb_squeeze: Some(true),
            ma_periods: (50, 200),
            ma_cross: Some(MaCross::Death),
            ma_cross_days_ago: Some(12),
            volume_lookback: 20,
            volume_ratio: Some(2.0),
            volume_state: Some(VolumeState::UnusuallyHigh),
            volatility_percentile: Some(45.0),
            volatility_state: Some(VolatilityState::Moderate),
        };
        let text = describe_indicators(&stats);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "RSI(14): 55.3 (neutral-bullish)  MACD: bullish crossover 1 day ago");
        assert_eq!(lines[1], "BB: upper half (squeeze)");
        assert_eq!(lines[2], "SMA 50/200: death cross 12 days ago");
        assert_eq!(lines[3], "Volume: 2.0x 20-day avg (unusually high)");
        assert_eq!(lines[4], "Volatility: 45th percentile (moderate)");
    }
}
