//! Descriptive summary of one column

use chrono::NaiveDate;
use serde::Serialize;

use super::helpers::{format_money, mean, std_pop};
use crate::{
    frame::{infer_frequency_label, Frame},
    NarrataError, Result,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryStats {
    pub ticker: Option<String>,
    pub column: String,
    /// Numeric values in the column after dropping missing cells
    pub points: usize,
    pub frequency: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start: f64,
    pub end: f64,
    pub minimum: f64,
    pub maximum: f64,
    pub mean: f64,
    pub std: f64,
    /// Percent change first to last; NaN when the first value is zero
    pub change_pct: f64,
}

impl SummaryStats {
    /// Ticker when known, otherwise the column name
    pub fn entity_name(&self) -> &str {
        self.ticker.as_deref().unwrap_or(&self.column)
    }
}

/// Summarize `column`. An explicit `ticker` overrides the frame's own.
pub fn analyze_summary(frame: &Frame, column: &str, ticker: Option<&str>) -> Result<SummaryStats> {
    let series = frame.series(column)?;
    let (Some(&start), Some(&end)) = (series.values.first(), series.values.last()) else {
        return Err(NarrataError::validation(format!(
            "Column '{column}' contains no numeric values."
        )));
    };

    let change_pct = if start == 0.0 {
        f64::NAN
    } else {
        (end - start) / start.abs() * 100.0
    };

    let ticker = ticker
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .or(frame.ticker())
        .map(str::to_string);

    let index = frame.index();
    Ok(SummaryStats {
        ticker,
        column: column.to_string(),
        points: series.len(),
        frequency: infer_frequency_label(index),
        start_date: index[0].date(),
        end_date: index[index.len() - 1].date(),
        start,
        end,
        minimum: series.values.iter().copied().fold(f64::INFINITY, f64::min),
        maximum: series.values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        mean: mean(&series.values),
        std: std_pop(&series.values),
        change_pct,
    })
}

/// Two lines: range/mean/std, then start/end/change. The header prefixes the
/// first line with `"{name} ({points} pts, {frequency}): "`.
pub fn describe_summary(stats: &SummaryStats, currency: &str, precision: usize, include_header: bool) -> String {
    let money = |v: f64| format_money(v, currency, precision);
    let prefix = if include_header {
        format!("{} ({} pts, {}): ", stats.entity_name(), stats.points, stats.frequency)
    } else {
        String::new()
    };
    let change = if stats.change_pct.is_nan() {
        "n/a".to_string()
    } else {
        format!("{:+.precision$}%", stats.change_pct)
    };

    format!(
        "{prefix}Range: [{}, {}]  Mean: {}  Std: {}\nStart: {}  End: {}  Change: {change}",
        money(stats.minimum),
        money(stats.maximum),
        money(stats.mean),
        money(stats.std),
        money(stats.start),
        money(stats.end),
    )
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDateTime};

    use super::*;

    fn frame_from_close(close: Vec<f64>) -> Frame {
        let t0 = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let index: Vec<NaiveDateTime> = (0..close.len()).map(|i| t0 + Duration::days(i as i64)).collect();
        let n = close.len();
        Frame::new(index, vec![1.0; n], vec![1.0; n], vec![1.0; n], close, vec![1.0; n]).unwrap()
    }

    #[test]
    fn test_summary_values() {
        let f = frame_from_close(vec![100.0, f64::NAN, 110.0, 90.0, 120.0]).with_ticker("MSFT");
        let s = analyze_summary(&f, "Close", None).unwrap();
        assert_eq!(s.ticker.as_deref(), Some("MSFT"));
        assert_eq!(s.points, 4);
        assert_eq!(s.frequency, "daily");
        assert_eq!(s.start_date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(s.end_date, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
        assert_eq!((s.minimum, s.maximum, s.mean), (90.0, 120.0, 105.0));
        assert!((s.std - 125.0f64.sqrt()).abs() < 1e-12);
        assert!((s.change_pct - 20.0).abs() < 1e-12);
    }

    #[test]
    fn test_ticker_override_and_fallback() {
        let f = frame_from_close(vec![1.0, 2.0]).with_ticker("MSFT");
        assert_eq!(analyze_summary(&f, "Close", Some("AAPL")).unwrap().ticker.as_deref(), Some("AAPL"));
        let plain = frame_from_close(vec![1.0, 2.0]);
        let s = analyze_summary(&plain, "Close", Some("  ")).unwrap();
        assert_eq!(s.ticker, None);
        assert_eq!(s.entity_name(), "Close");
    }

    #[test]
    fn test_zero_start_has_no_change() {
        let s = analyze_summary(&frame_from_close(vec![0.0, 5.0]), "Close", None).unwrap();
        assert!(s.change_pct.is_nan());
        assert!(describe_summary(&s, "$", 2, false).ends_with("Change: n/a"));
    }

    #[test]
    fn test_all_missing_column() {
        let err = analyze_summary(&frame_from_close(vec![f64::NAN; 3]), "Close", None).unwrap_err();
        assert!(err.to_string().contains("no numeric values"));
    }

    #[test]
    fn test_describe() {
        let f = frame_from_close(vec![100.0, 95.0, 102.5]).with_ticker("AAPL");
        let s = analyze_summary(&f, "Close", None).unwrap();
        let text = describe_summary(&s, "$", 2, true);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("AAPL (3 pts, daily): Range: [$95.00, $102.50]  Mean: $99.17  Std: $"));
        assert_eq!(lines[1], "Start: $100.00  End: $102.50  Change: +2.50%");

        let text = describe_summary(&s, "€", 1, false);
        assert!(text.starts_with("Range: [€95.0, €102.5]"));
    }
}
