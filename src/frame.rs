//! Validated OHLCV frames and frequency inference.
//!
//! A [`Frame`] can only be obtained through a validating constructor, so every
//! analyzer can rely on the index contract (non-empty, strictly increasing,
//! unique timestamps, five canonical columns of equal length). Individual
//! cells may still be missing (`NaN`); analyzers drop them per column.

use chrono::{DateTime, Datelike, NaiveDateTime, Weekday};

use crate::{NarrataError, Result, OHLCV};

/// Canonical column names every frame carries
pub const REQUIRED_COLUMNS: [&str; 5] = ["Open", "High", "Low", "Close", "Volume"];

const SECONDS_PER_MINUTE: i64 = 60;
const SECONDS_PER_HOUR: i64 = 3_600;
const SECONDS_PER_DAY: i64 = 86_400;

// ============================================================
// BAR / SERIES
// ============================================================

/// One row of a frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl OHLCV for Bar {
    fn open(&self) -> f64 {
        self.open
    }

    fn high(&self) -> f64 {
        self.high
    }

    fn low(&self) -> f64 {
        self.low
    }

    fn close(&self) -> f64 {
        self.close
    }

    fn volume(&self) -> f64 {
        self.volume
    }

    fn timestamp(&self) -> Option<i64> {
        Some(self.timestamp.and_utc().timestamp())
    }
}

/// A numeric column with missing values dropped, order and timestamps preserved
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PriceSeries {
    pub values: Vec<f64>,
    pub index: Vec<NaiveDateTime>,
}

impl PriceSeries {
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn last(&self) -> Option<f64> {
        self.values.last().copied()
    }

    /// Simple returns `p[i] / p[i-1] - 1`, indexed by the later timestamp.
    /// Non-finite returns (zero prices) are dropped.
    pub fn returns(&self) -> PriceSeries {
        let mut out = PriceSeries::default();
        for i in 1..self.values.len() {
            let r = self.values[i] / self.values[i - 1] - 1.0;
            if r.is_finite() {
                out.values.push(r);
                out.index.push(self.index[i]);
            }
        }
        out
    }
}

// ============================================================
// FRAME
// ============================================================

/// Validated, time-ordered OHLCV table
#[derive(Debug, Clone)]
pub struct Frame {
    index: Vec<NaiveDateTime>,
    open: Vec<f64>,
    high: Vec<f64>,
    low: Vec<f64>,
    close: Vec<f64>,
    volume: Vec<f64>,
    extra: Vec<(String, Vec<f64>)>,
    ticker: Option<String>,
}

impl Frame {
    /// Build a frame from column vectors, validating the index contract.
    pub fn new(
        index: Vec<NaiveDateTime>,
        open: Vec<f64>,
        high: Vec<f64>,
        low: Vec<f64>,
        close: Vec<f64>,
        volume: Vec<f64>,
    ) -> Result<Self> {
        if index.is_empty() {
            return Err(NarrataError::validation("Input frame must not be empty."));
        }

        let n = index.len();
        for (name, len) in REQUIRED_COLUMNS.iter().zip([
            open.len(),
            high.len(),
            low.len(),
            close.len(),
            volume.len(),
        ]) {
            if len != n {
                return Err(NarrataError::validation(format!(
                    "Column '{name}' has {len} values but the index has {n}."
                )));
            }
        }

        for (i, pair) in index.windows(2).enumerate() {
            if pair[1] == pair[0] {
                return Err(NarrataError::validation(format!(
                    "Frame index must not contain duplicate timestamps (row {}).",
                    i + 1
                )));
            }
            if pair[1] < pair[0] {
                return Err(NarrataError::validation(format!(
                    "Frame index must be sorted in ascending order (row {}).",
                    i + 1
                )));
            }
        }

        Ok(Self {
            index,
            open,
            high,
            low,
            close,
            volume,
            extra: Vec::new(),
            ticker: None,
        })
    }

    /// Build a frame from row records carrying unix timestamps.
    ///
    /// Records without a timestamp are dropped, duplicate timestamps keep the
    /// last record, and rows are sorted ascending.
    pub fn from_records<T: OHLCV>(records: &[T]) -> Result<Self> {
        if records.is_empty() {
            return Err(NarrataError::validation(
                "At least one OHLCV record is required.",
            ));
        }

        let mut rows: Vec<(NaiveDateTime, usize)> = records
            .iter()
            .enumerate()
            .filter_map(|(i, r)| {
                let secs = r.timestamp()?;
                DateTime::from_timestamp(secs, 0).map(|dt| (dt.naive_utc(), i))
            })
            .collect();

        if rows.is_empty() {
            return Err(NarrataError::validation(
                "Records contain no parseable timestamps.",
            ));
        }

        // stable sort keeps input order within a timestamp, so the last one wins below
        rows.sort_by_key(|(ts, _)| *ts);
        let mut deduped: Vec<(NaiveDateTime, usize)> = Vec::with_capacity(rows.len());
        for row in rows {
            match deduped.last_mut() {
                Some(last) if last.0 == row.0 => *last = row,
                _ => deduped.push(row),
            }
        }

        let pick = |f: fn(&T) -> f64| deduped.iter().map(|&(_, i)| f(&records[i])).collect();
        Self::new(
            deduped.iter().map(|&(ts, _)| ts).collect(),
            pick(T::open),
            pick(T::high),
            pick(T::low),
            pick(T::close),
            pick(T::volume),
        )
    }

    /// Attach a ticker label used in header text. Blank labels are ignored.
    pub fn with_ticker(mut self, ticker: impl Into<String>) -> Self {
        let ticker = ticker.into();
        let trimmed = ticker.trim();
        self.ticker = (!trimmed.is_empty()).then(|| trimmed.to_string());
        self
    }

    /// Attach an additional numeric column (e.g. "Adj Close").
    pub fn with_column(mut self, name: impl Into<String>, values: Vec<f64>) -> Result<Self> {
        let name = name.into();
        if values.len() != self.len() {
            return Err(NarrataError::validation(format!(
                "Column '{name}' has {} values but the index has {}.",
                values.len(),
                self.len()
            )));
        }
        if REQUIRED_COLUMNS.contains(&name.as_str()) {
            return Err(NarrataError::validation(format!(
                "Column '{name}' is a canonical column and cannot be replaced."
            )));
        }
        match self.extra.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = values,
            None => self.extra.push((name, values)),
        }
        Ok(self)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// `Frame::new` rejects empty input, so a constructed frame is never empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    #[inline]
    pub fn index(&self) -> &[NaiveDateTime] {
        &self.index
    }

    pub fn ticker(&self) -> Option<&str> {
        self.ticker.as_deref()
    }

    pub fn has_column(&self, name: &str) -> bool {
        REQUIRED_COLUMNS.contains(&name) || self.extra.iter().any(|(n, _)| n == name)
    }

    /// Raw column values, missing cells included as `NaN`.
    pub fn column(&self, name: &str) -> Result<&[f64]> {
        let values = match name {
            "Open" => &self.open,
            "High" => &self.high,
            "Low" => &self.low,
            "Close" => &self.close,
            "Volume" => &self.volume,
            other => self
                .extra
                .iter()
                .find(|(n, _)| n == other)
                .map(|(_, v)| v)
                .ok_or_else(|| {
                    NarrataError::validation(format!(
                        "Column '{other}' does not exist in frame."
                    ))
                })?,
        };
        Ok(values)
    }

    /// Column with non-finite cells dropped, paired with their timestamps.
    pub fn series(&self, name: &str) -> Result<PriceSeries> {
        let raw = self.column(name)?;
        let mut series = PriceSeries::default();
        for (value, ts) in raw.iter().zip(&self.index) {
            if value.is_finite() {
                series.values.push(*value);
                series.index.push(*ts);
            }
        }
        Ok(series)
    }

    pub fn bar(&self, i: usize) -> Option<Bar> {
        Some(Bar {
            timestamp: *self.index.get(i)?,
            open: self.open[i],
            high: self.high[i],
            low: self.low[i],
            close: self.close[i],
            volume: self.volume[i],
        })
    }

    /// The last `n` rows (or all rows when shorter)
    pub fn tail_bars(&self, n: usize) -> Vec<Bar> {
        let start = self.len().saturating_sub(n);
        (start..self.len()).filter_map(|i| self.bar(i)).collect()
    }

    pub fn bars(&self) -> impl Iterator<Item = Bar> + '_ {
        (0..self.len()).filter_map(move |i| self.bar(i))
    }
}

// ============================================================
// FREQUENCY INFERENCE
// ============================================================

/// User-facing sampling frequency label for a timestamp index.
///
/// Regular spacing maps to a named label ("daily", "hourly", "weekly",
/// "15min", ...); weekday-only daily data is "business-daily". Anything else
/// falls back to the median gap.
pub fn infer_frequency_label(index: &[NaiveDateTime]) -> String {
    if index.len() < 2 {
        return "irregular".to_string();
    }

    let deltas: Vec<i64> = index
        .windows(2)
        .map(|w| (w[1] - w[0]).num_seconds())
        .collect();

    let first = deltas[0];
    if first > 0 && deltas.iter().all(|&d| d == first) {
        return regular_label(first);
    }

    if is_business_daily(index, &deltas) {
        return "business-daily".to_string();
    }

    if is_month_end_series(index) {
        return "monthly".to_string();
    }

    let mut sorted = deltas;
    sorted.sort_unstable();
    let mid = sorted.len() / 2;
    let median = if sorted.len() % 2 == 0 {
        (sorted[mid - 1] as f64 + sorted[mid] as f64) / 2.0
    } else {
        sorted[mid] as f64
    };

    match median {
        m if m <= SECONDS_PER_HOUR as f64 => "hourly",
        m if m <= SECONDS_PER_DAY as f64 => "daily",
        m if m <= (SECONDS_PER_DAY * 7) as f64 => "weekly",
        m if m <= (SECONDS_PER_DAY * 31) as f64 => "monthly",
        _ => "irregular",
    }
    .to_string()
}

fn regular_label(seconds: i64) -> String {
    if seconds % SECONDS_PER_DAY == 0 {
        return match seconds / SECONDS_PER_DAY {
            1 => "daily".to_string(),
            7 => "weekly".to_string(),
            days => format!("{days}d"),
        };
    }
    if seconds % SECONDS_PER_HOUR == 0 {
        return match seconds / SECONDS_PER_HOUR {
            1 => "hourly".to_string(),
            hours => format!("{hours}h"),
        };
    }
    if seconds % SECONDS_PER_MINUTE == 0 {
        return format!("{}min", seconds / SECONDS_PER_MINUTE);
    }
    format!("{seconds}s")
}

fn is_business_daily(index: &[NaiveDateTime], deltas: &[i64]) -> bool {
    let weekend = |ts: &NaiveDateTime| matches!(ts.weekday(), Weekday::Sat | Weekday::Sun);
    if index.iter().any(weekend) {
        return false;
    }
    deltas.iter().zip(index.iter().skip(1)).all(|(&d, ts)| {
        d == SECONDS_PER_DAY || (d == SECONDS_PER_DAY * 3 && ts.weekday() == Weekday::Mon)
    })
}

fn is_month_end_series(index: &[NaiveDateTime]) -> bool {
    let month_end = |ts: &NaiveDateTime| {
        ts.date()
            .succ_opt()
            .is_some_and(|next| next.month() != ts.month())
    };
    let months_apart = index.windows(2).all(|w| {
        let a = w[0].year() * 12 + w[0].month() as i32;
        let b = w[1].year() * 12 + w[1].month() as i32;
        b - a == 1
    });
    months_apart && index.iter().all(month_end)
}

// ============================================================
// TESTS
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn day(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn daily_index(n: usize) -> Vec<NaiveDateTime> {
        (0..n).map(|i| day(2025, 1, 1) + Duration::days(i as i64)).collect()
    }

    fn frame(n: usize) -> Frame {
        let v: Vec<f64> = (0..n).map(|i| 100.0 + i as f64).collect();
        Frame::new(daily_index(n), v.clone(), v.clone(), v.clone(), v, vec![1.0; n]).unwrap()
    }

    #[test]
    fn test_rejects_empty() {
        let err = Frame::new(vec![], vec![], vec![], vec![], vec![], vec![]).unwrap_err();
        assert!(err.to_string().contains("empty"));
        let one = frame(1);
        assert_eq!(one.len(), 1);
        assert!(!one.is_empty());
    }

    #[test]
    fn test_rejects_length_mismatch() {
        let err = Frame::new(
            daily_index(3),
            vec![1.0; 3],
            vec![1.0; 2],
            vec![1.0; 3],
            vec![1.0; 3],
            vec![1.0; 3],
        )
        .unwrap_err();
        assert!(err.to_string().contains("'High'"));
    }

    #[test]
    fn test_rejects_duplicate_and_unsorted() {
        let mut idx = daily_index(3);
        idx[2] = idx[1];
        let dup = Frame::new(idx, vec![1.0; 3], vec![1.0; 3], vec![1.0; 3], vec![1.0; 3], vec![1.0; 3]);
        assert!(dup.unwrap_err().to_string().contains("duplicate"));

        let mut idx = daily_index(3);
        idx.swap(0, 2);
        let unsorted = Frame::new(idx, vec![1.0; 3], vec![1.0; 3], vec![1.0; 3], vec![1.0; 3], vec![1.0; 3]);
        assert!(unsorted.unwrap_err().to_string().contains("ascending"));
    }

    #[test]
    fn test_series_drops_missing_values() {
        let mut close = vec![1.0, f64::NAN, 3.0, f64::INFINITY, 5.0];
        close[1] = f64::NAN;
        let f = Frame::new(daily_index(5), vec![1.0; 5], vec![1.0; 5], vec![1.0; 5], close, vec![1.0; 5])
            .unwrap();
        let s = f.series("Close").unwrap();
        assert_eq!(s.values, vec![1.0, 3.0, 5.0]);
        assert_eq!(s.index, vec![f.index()[0], f.index()[2], f.index()[4]]);
    }

    #[test]
    fn test_missing_column_message() {
        let err = frame(3).series("AdjustedClose").unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_extra_column() {
        let f = frame(3).with_column("Adj Close", vec![1.0, 2.0, 3.0]).unwrap();
        assert!(f.has_column("Adj Close"));
        assert_eq!(f.column("Adj Close").unwrap(), &[1.0, 2.0, 3.0]);
        assert!(frame(3).with_column("Close", vec![0.0; 3]).is_err());
        assert!(frame(3).with_column("X", vec![0.0; 2]).is_err());
    }

    #[test]
    fn test_ticker_trimmed() {
        assert_eq!(frame(2).with_ticker("  MSFT ").ticker(), Some("MSFT"));
        assert_eq!(frame(2).with_ticker("   ").ticker(), None);
    }

    #[test]
    fn test_from_records_sorts_and_dedups() {
        let t0 = day(2025, 1, 1);
        let bars = vec![
            Bar { timestamp: t0 + Duration::days(1), open: 2.0, high: 2.0, low: 2.0, close: 2.0, volume: 1.0 },
            Bar { timestamp: t0, open: 1.0, high: 1.0, low: 1.0, close: 1.0, volume: 1.0 },
            Bar { timestamp: t0 + Duration::days(1), open: 3.0, high: 3.0, low: 3.0, close: 3.0, volume: 1.0 },
        ];
        let f = Frame::from_records(&bars).unwrap();
        assert_eq!(f.len(), 2);
        assert_eq!(f.index()[0], t0);
        assert_eq!(f.column("Close").unwrap(), &[1.0, 3.0]);
    }

    #[test]
    fn test_from_records_requires_rows() {
        let bars: Vec<Bar> = vec![];
        assert!(Frame::from_records(&bars).is_err());
    }

    #[test]
    fn test_returns_skip_zero_price() {
        let s = PriceSeries {
            values: vec![0.0, 1.0, 2.0],
            index: daily_index(3),
        };
        let r = s.returns();
        assert_eq!(r.values, vec![1.0]);
        assert_eq!(r.index, vec![daily_index(3)[2]]);
    }

    #[test]
    fn test_frequency_regular() {
        assert_eq!(infer_frequency_label(&daily_index(10)), "daily");
        let weekly: Vec<_> = (0..10).map(|i| day(2025, 1, 3) + Duration::weeks(i)).collect();
        assert_eq!(infer_frequency_label(&weekly), "weekly");
        let q: Vec<_> = (0..16).map(|i| day(2025, 1, 1) + Duration::minutes(15 * i)).collect();
        assert_eq!(infer_frequency_label(&q), "15min");
        let h: Vec<_> = (0..16).map(|i| day(2025, 1, 1) + Duration::hours(i)).collect();
        assert_eq!(infer_frequency_label(&h), "hourly");
    }

    #[test]
    fn test_frequency_business_daily() {
        // Mon 2025-01-06 .. two full weeks of weekdays
        let idx: Vec<_> = (0..14)
            .map(|i| day(2025, 1, 6) + Duration::days(i))
            .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
            .collect();
        assert_eq!(infer_frequency_label(&idx), "business-daily");
    }

    #[test]
    fn test_frequency_monthly() {
        let idx = vec![day(2025, 1, 31), day(2025, 2, 28), day(2025, 3, 31), day(2025, 4, 30)];
        assert_eq!(infer_frequency_label(&idx), "monthly");
    }

    #[test]
    fn test_frequency_irregular_gaps_use_median() {
        let mut idx = daily_index(20);
        idx.remove(5);
        idx.remove(11);
        assert_eq!(infer_frequency_label(&idx), "daily");
        assert_eq!(infer_frequency_label(&idx[..1]), "irregular");
    }
}
