//! TA-Lib style indicator series and candlestick detectors
//!
//! RSI and MACD here follow TA-Lib seeding: smoothing starts from a simple
//! average of the first window, and positions before that are `NaN`. The
//! candlestick scanner compares each candle against trailing averages over the
//! preceding [`CANDLE_AVG_PERIOD`] bars, excluding the bar itself.

use super::{CandleHit, CandlestickBackend, IndicatorBackend, MacdSeries};
use crate::{analysis::helpers::mean, frame::Bar, OHLCVExt};

// ============================================================
// TA-Lib THRESHOLDS
// ============================================================

/// TA-Lib candle averaging period (TA_CANDLEAVGPERIOD)
pub const CANDLE_AVG_PERIOD: usize = 10;
/// Body is doji-like: body <= avg_range * DOJI_FACTOR
pub const DOJI_FACTOR: f64 = 0.1;
/// Fallback body/range ratio when no average range is available
pub const DOJI_RATIO: f64 = 0.1;

/// TA-Lib BodyDoji on the high-low range. A zero body is always a doji.
#[inline]
pub fn is_doji(body: f64, avg_range: f64, range: f64) -> bool {
    if body <= 0.0 {
        return true;
    }
    if avg_range > 0.0 {
        body <= avg_range * DOJI_FACTOR
    } else {
        range > 0.0 && body / range <= DOJI_RATIO
    }
}

/// Average high-low range of the bars before `index`; the bar's own range at 0
pub fn trailing_avg_range(bars: &[Bar], index: usize, period: usize) -> f64 {
    if index == 0 {
        return bars.first().map_or(0.0, |b| b.range());
    }
    let start = index.saturating_sub(period);
    let trail = &bars[start..index];
    trail.iter().map(|b| b.range()).sum::<f64>() / trail.len() as f64
}

// ============================================================
// INDICATOR SERIES
// ============================================================

/// Wilder RSI and SMA-seeded MACD
#[derive(Debug, Clone, Copy, Default)]
pub struct TaIndicators;

impl IndicatorBackend for TaIndicators {
    fn name(&self) -> &'static str {
        "ta"
    }

    fn rsi(&self, values: &[f64], period: usize) -> Option<Vec<f64>> {
        if period == 0 || values.len() <= period {
            return None;
        }
        let mut out = vec![f64::NAN; values.len()];
        let deltas: Vec<f64> = values.windows(2).map(|w| w[1] - w[0]).collect();

        let mut avg_gain = mean(&deltas[..period].iter().map(|d| d.max(0.0)).collect::<Vec<_>>());
        let mut avg_loss = mean(&deltas[..period].iter().map(|d| (-d).max(0.0)).collect::<Vec<_>>());
        out[period] = rsi_value(avg_gain, avg_loss);

        let p = period as f64;
        for (i, d) in deltas.iter().enumerate().skip(period) {
            avg_gain = (avg_gain * (p - 1.0) + d.max(0.0)) / p;
            avg_loss = (avg_loss * (p - 1.0) + (-d).max(0.0)) / p;
            out[i + 1] = rsi_value(avg_gain, avg_loss);
        }
        Some(out)
    }

    fn macd(&self, values: &[f64], fast: usize, slow: usize, signal: usize) -> Option<MacdSeries> {
        if fast == 0 || signal == 0 || fast >= slow || values.len() < slow + signal - 1 {
            return None;
        }
        let fast_ema = sma_seeded_ema(values, fast);
        let slow_ema = sma_seeded_ema(values, slow);
        let line: Vec<f64> = fast_ema.iter().zip(&slow_ema).map(|(f, s)| f - s).collect();

        // signal smoothing starts at the first defined line value
        let first = slow - 1;
        let mut signal_line = vec![f64::NAN; values.len()];
        for (slot, v) in signal_line[first..]
            .iter_mut()
            .zip(sma_seeded_ema(&line[first..], signal))
        {
            *slot = v;
        }
        let histogram = line.iter().zip(&signal_line).map(|(l, s)| l - s).collect();

        Some(MacdSeries {
            line,
            signal: signal_line,
            histogram,
        })
    }
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    let total = avg_gain + avg_loss;
    if total == 0.0 {
        f64::NAN
    } else {
        100.0 * avg_gain / total
    }
}

/// EMA with `alpha = 2 / (span + 1)` seeded by the SMA of the first `span` values
fn sma_seeded_ema(values: &[f64], span: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    if span == 0 || values.len() < span {
        return out;
    }
    let alpha = 2.0 / (span as f64 + 1.0);
    let mut prev = mean(&values[..span]);
    out[span - 1] = prev;
    for i in span..values.len() {
        prev = alpha * values[i] + (1.0 - alpha) * prev;
        out[i] = prev;
    }
    out
}

// ============================================================
// CANDLESTICKS
// ============================================================

/// Doji, inside-bar and (optionally) engulfing detectors.
///
/// Hits are reported for the most recent bar with any signal; within one bar
/// the detector order is doji, inside, engulfing.
#[derive(Debug, Clone, Copy)]
pub struct TaCandlesticks {
    pub engulfing: bool,
}

impl TaCandlesticks {
    pub fn new(engulfing: bool) -> Self {
        Self { engulfing }
    }

    fn doji_at(&self, bars: &[Bar], i: usize) -> bool {
        let bar = &bars[i];
        is_doji(bar.body(), trailing_avg_range(bars, i, CANDLE_AVG_PERIOD), bar.range())
    }

    fn inside_at(&self, bars: &[Bar], i: usize) -> bool {
        if i < 1 {
            return false;
        }
        let (prev, curr) = (&bars[i - 1], &bars[i]);
        curr.high < prev.high && curr.low > prev.low
    }

    fn engulfing_at(&self, bars: &[Bar], i: usize) -> Option<&'static str> {
        if !self.engulfing || i < 1 {
            return None;
        }
        let (prev, curr) = (&bars[i - 1], &bars[i]);

        // TA-Lib candle color: close >= open is white
        let curr_white = curr.close >= curr.open;
        let prev_white = prev.close >= prev.open;

        if curr_white && !prev_white {
            let case_a = curr.close >= prev.open && curr.open < prev.close;
            let case_b = curr.close > prev.open && curr.open <= prev.close;
            if case_a || case_b {
                return Some("Bullish Engulfing");
            }
        }

        if !curr_white && prev_white {
            let case_a = curr.open >= prev.close && curr.close < prev.open;
            let case_b = curr.open > prev.close && curr.close <= prev.open;
            if case_a || case_b {
                return Some("Bearish Engulfing");
            }
        }

        None
    }

    fn hit_at(&self, bars: &[Bar], i: usize) -> Option<&'static str> {
        if !bars[i].is_complete() || (i > 0 && !bars[i - 1].is_complete()) {
            return None;
        }
        if self.doji_at(bars, i) {
            return Some("Doji");
        }
        if self.inside_at(bars, i) {
            return Some("Inside Bar");
        }
        self.engulfing_at(bars, i)
    }
}

impl CandlestickBackend for TaCandlesticks {
    fn name(&self) -> &'static str {
        if self.engulfing {
            "ta+engulfing"
        } else {
            "ta"
        }
    }

    fn scan(&self, bars: &[Bar]) -> Option<CandleHit> {
        (0..bars.len())
            .rev()
            .find_map(|i| self.hit_at(bars, i).map(|name| CandleHit { name, index: i }))
    }
}
