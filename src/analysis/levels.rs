//! Support and resistance levels
//!
//! Local extrema are split around the current price, clustered greedily and
//! ranked by how often price came back to them.

use serde::Serialize;

use super::helpers::{format_money, mean};
use crate::{
    frame::Frame,
    params::{LevelParams, Parameterized},
    NarrataError, Result,
};

/// Tolerance floor for near-zero prices
const MIN_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceLevel {
    pub price: f64,
    pub touches: usize,
}

/// Ranked levels, best first
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct LevelStats {
    pub supports: Vec<PriceLevel>,
    pub resistances: Vec<PriceLevel>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Side {
    Support,
    Resistance,
}

pub fn find_support_resistance(frame: &Frame, column: &str, params: &LevelParams) -> Result<LevelStats> {
    params.validate()?;
    let order = params.extrema_order.get();
    let prices = frame.series(column)?.values;
    let need = order * 2 + 3;
    if prices.len() < need {
        return Err(NarrataError::insufficient("support/resistance", need, prices.len()));
    }

    let minima: Vec<f64> = relative_extrema(&prices, order, |a, b| a <= b)
        .into_iter()
        .map(|i| prices[i])
        .collect();
    let maxima: Vec<f64> = relative_extrema(&prices, order, |a, b| a >= b)
        .into_iter()
        .map(|i| prices[i])
        .collect();

    let current = prices[prices.len() - 1];
    let tolerance = (current * params.tolerance_ratio.get()).max(MIN_TOLERANCE);
    let max_levels = params.max_levels.get();

    let below: Vec<f64> = minima.iter().copied().filter(|&p| p <= current).collect();
    let above: Vec<f64> = maxima.iter().copied().filter(|&p| p >= current).collect();

    let stats = LevelStats {
        supports: build_levels(&below, &minima, &prices, tolerance, max_levels, Side::Support),
        resistances: build_levels(&above, &maxima, &prices, tolerance, max_levels, Side::Resistance),
    };
    tracing::debug!(
        supports = stats.supports.len(),
        resistances = stats.resistances.len(),
        tolerance,
        "levels found"
    );
    Ok(stats)
}

/// Indices whose value satisfies `cmp` against every neighbour up to `order`
/// away. Neighbours past either edge clip to the edge sample.
fn relative_extrema(values: &[f64], order: usize, cmp: impl Fn(f64, f64) -> bool) -> Vec<usize> {
    let last = values.len().saturating_sub(1);
    (0..values.len())
        .filter(|&i| {
            (1..=order).all(|k| cmp(values[i], values[(i + k).min(last)]) && cmp(values[i], values[i.saturating_sub(k)]))
        })
        .collect()
}

fn build_levels(
    candidates: &[f64],
    extrema: &[f64],
    prices: &[f64],
    tolerance: f64,
    max_levels: usize,
    side: Side,
) -> Vec<PriceLevel> {
    if candidates.is_empty() {
        return Vec::new();
    }

    let within = |values: &[f64], level: f64| values.iter().filter(|v| (*v - level).abs() <= tolerance).count();

    let mut levels: Vec<PriceLevel> = cluster(candidates, tolerance, side)
        .iter()
        .map(|members| {
            let price = mean(members);
            PriceLevel { price, touches: within(extrema, price).max(within(prices, price)) }
        })
        .collect();

    levels.sort_by(|a, b| {
        let by_price = match side {
            Side::Support => b.price.total_cmp(&a.price),
            Side::Resistance => a.price.total_cmp(&b.price),
        };
        b.touches.cmp(&a.touches).then(by_price)
    });
    levels.truncate(max_levels);
    levels
}

/// Greedy clustering in walk order (supports top-down, resistances bottom-up):
/// a value joins the first cluster whose running mean is within tolerance.
fn cluster(values: &[f64], tolerance: f64, side: Side) -> Vec<Vec<f64>> {
    let mut ordered = values.to_vec();
    ordered.sort_by(|a, b| match side {
        Side::Support => b.total_cmp(a),
        Side::Resistance => a.total_cmp(b),
    });

    let mut clusters: Vec<Vec<f64>> = Vec::new();
    for value in ordered {
        match clusters.iter_mut().find(|c| (value - mean(c)).abs() <= tolerance) {
            Some(members) => members.push(value),
            None => clusters.push(vec![value]),
        }
    }
    clusters
}

fn format_levels(levels: &[PriceLevel], currency: &str, precision: usize) -> String {
    if levels.is_empty() {
        return "n/a".to_string();
    }
    levels
        .iter()
        .map(|l| format!("{} ({} touches)", format_money(l.price, currency, precision), l.touches))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn describe_support_resistance(stats: &LevelStats, currency: &str, precision: usize) -> String {
    format!(
        "Support: {}  Resistance: {}",
        format_levels(&stats.supports, currency, precision),
        format_levels(&stats.resistances, currency, precision)
    )
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    use super::*;
    use crate::Period;

    fn frame_from_close(close: Vec<f64>) -> Frame {
        let t0 = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let index: Vec<NaiveDateTime> = (0..close.len()).map(|i| t0 + Duration::days(i as i64)).collect();
        let n = close.len();
        Frame::new(index, close.clone(), close.clone(), close.clone(), close, vec![1.0; n]).unwrap()
    }

    /// Triangle wave bouncing between 90 and 110
    fn oscillating(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| {
                let phase = (i % 20) as f64;
                if phase < 10.0 {
                    90.0 + phase * 2.0
                } else {
                    110.0 - (phase - 10.0) * 2.0
                }
            })
            .collect()
    }

    #[test]
    fn test_relative_extrema_clip_mode() {
        let v = [1.0, 2.0, 3.0, 2.0, 1.0, 2.0];
        assert_eq!(relative_extrema(&v, 1, |a, b| a >= b), vec![2, 5]);
        assert_eq!(relative_extrema(&v, 1, |a, b| a <= b), vec![0, 4]);
        // plateaus count on both sides
        let flat = [1.0, 1.0, 1.0];
        assert_eq!(relative_extrema(&flat, 1, |a, b| a <= b), vec![0, 1, 2]);
    }

    #[test]
    fn test_cluster_joins_within_tolerance() {
        let clusters = cluster(&[100.0, 100.5, 105.0, 99.8], 1.0, Side::Support);
        assert_eq!(clusters, vec![vec![105.0], vec![100.5, 100.0, 99.8]]);
    }

    #[test]
    fn test_oscillating_levels() {
        // ends falling into 100, so the last bar is itself a clipped minimum
        let stats =
            find_support_resistance(&frame_from_close(oscillating(96)), "Close", &LevelParams::default()).unwrap();
        assert_eq!(stats.supports.len(), 2);
        assert_eq!(stats.resistances.len(), 1);
        assert_eq!(stats.supports[0], PriceLevel { price: 100.0, touches: 10 });
        assert_eq!(stats.supports[1], PriceLevel { price: 90.0, touches: 5 });
        assert_eq!(stats.resistances[0], PriceLevel { price: 110.0, touches: 5 });
        assert_eq!(
            describe_support_resistance(&stats, "$", 2),
            "Support: $100.00 (10 touches), $90.00 (5 touches)  Resistance: $110.00 (5 touches)"
        );
    }

    #[test]
    fn test_ranking_ties_favor_nearest_price() {
        let prices = [90.0, 95.0, 99.0, 105.0, 110.0];
        let supports = build_levels(&[90.0, 95.0], &prices, &prices, 0.5, 2, Side::Support);
        assert_eq!(supports[0].price, 95.0);
        assert_eq!(supports[1].price, 90.0);
        let resistances = build_levels(&[110.0, 105.0], &prices, &prices, 0.5, 2, Side::Resistance);
        assert_eq!(resistances[0].price, 105.0);
        let capped = build_levels(&[90.0, 95.0, 99.0], &prices, &prices, 0.5, 1, Side::Support);
        assert_eq!(capped, vec![PriceLevel { price: 99.0, touches: 1 }]);
    }

    #[test]
    fn test_insufficient_and_invalid() {
        let f = frame_from_close(vec![1.0; 12]);
        let err = find_support_resistance(&f, "Close", &LevelParams::default()).unwrap_err();
        assert!(err.is_insufficient_data());

        let params = LevelParams { extrema_order: Period::new_const(1), ..LevelParams::default() };
        assert!(find_support_resistance(&f, "Close", &params).is_ok());

        let params = LevelParams { tolerance_ratio: crate::Ratio::new_const(0.0), ..LevelParams::default() };
        assert!(find_support_resistance(&f, "Close", &params).unwrap_err().is_validation());
    }

    #[test]
    fn test_describe_empty() {
        assert_eq!(describe_support_resistance(&LevelStats::default(), "$", 2), "Support: n/a  Resistance: n/a");
    }
}
