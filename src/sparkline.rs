//! Unicode sparklines

use crate::{NarrataError, Result};

/// Glyph palette from low to high
pub const BARS: &str = "▁▂▃▄▅▆▇█";

/// Pick `width` values at evenly spaced (rounded) positions. Shorter input
/// is returned unchanged.
pub fn downsample_evenly(values: &[f64], width: usize) -> Result<Vec<f64>> {
    if width < 1 {
        return Err(NarrataError::validation("width must be >= 1."));
    }
    if values.len() <= width {
        return Ok(values.to_vec());
    }
    if width == 1 {
        return Ok(vec![values[0]]);
    }

    let last = (values.len() - 1) as f64;
    let step = last / (width - 1) as f64;
    Ok((0..width)
        .map(|i| {
            let pos = if i == width - 1 { last } else { i as f64 * step };
            values[(pos.round_ties_even() as usize).min(values.len() - 1)]
        })
        .collect())
}

/// Map finite values onto `0..bins`; a flat series lands on the middle bin.
pub fn normalize_to_bins(values: &[f64], bins: usize) -> Result<Vec<usize>> {
    if bins < 2 {
        return Err(NarrataError::validation("bins must be >= 2."));
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(NarrataError::validation("values must be finite numbers."));
    }
    if values.is_empty() {
        return Ok(Vec::new());
    }

    let low = values.iter().copied().fold(f64::INFINITY, f64::min);
    let high = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if high == low {
        return Ok(vec![bins / 2; values.len()]);
    }

    let top = (bins - 1) as f64;
    Ok(values
        .iter()
        .map(|v| ((v - low) / (high - low) * top).round_ties_even().clamp(0.0, top) as usize)
        .collect())
}

/// Single-line sparkline of at most `width` glyphs. Missing values are
/// skipped; empty input yields an empty string.
pub fn make_sparkline(values: &[f64], width: usize) -> Result<String> {
    make_sparkline_with(values, width, BARS)
}

pub fn make_sparkline_with(values: &[f64], width: usize, bars: &str) -> Result<String> {
    let glyphs: Vec<char> = bars.chars().collect();
    if glyphs.len() < 2 {
        return Err(NarrataError::validation("bars must have at least two characters."));
    }

    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    let sampled = downsample_evenly(&finite, width)?;
    Ok(normalize_to_bins(&sampled, glyphs.len())?
        .into_iter()
        .map(|i| glyphs[i])
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_downsample_short_input_unchanged() {
        assert_eq!(downsample_evenly(&[1.0, 2.0], 5).unwrap(), vec![1.0, 2.0]);
    }

    #[test]
    fn test_downsample_keeps_endpoints() {
        let values: Vec<f64> = (0..100).map(f64::from).collect();
        let sampled = downsample_evenly(&values, 10).unwrap();
        assert_eq!(sampled.len(), 10);
        assert_eq!(sampled[0], 0.0);
        assert_eq!(sampled[9], 99.0);
        // 11.0 and 88.0 sit exactly on their positions
        assert_eq!(sampled[1], 11.0);
        assert_eq!(sampled[8], 88.0);
    }

    #[test]
    fn test_flat_series_uses_middle_bin() {
        assert_eq!(normalize_to_bins(&[5.0, 5.0, 5.0], 8).unwrap(), vec![4, 4, 4]);
    }

    #[test]
    fn test_sparkline_endpoints() {
        let spark = make_sparkline(&[0.0, 1.0, 2.0, 3.0], 4).unwrap();
        assert_eq!(spark.chars().count(), 4);
        assert!(spark.starts_with('▁'));
        assert!(spark.ends_with('█'));
    }

    #[test]
    fn test_sparkline_edge_cases() {
        assert_eq!(make_sparkline(&[], 20).unwrap(), "");
        assert_eq!(make_sparkline(&[f64::NAN, 2.0, 2.0], 20).unwrap(), "▅▅");
        assert!(make_sparkline_with(&[1.0, 2.0, 3.0], 20, "x").unwrap_err().to_string().contains("at least two"));
        assert!(make_sparkline(&[1.0], 0).is_err());
    }
}
