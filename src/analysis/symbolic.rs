//! Symbolic encodings: SAX and ASTRIDE
//!
//! SAX averages equal-width chunks of the z-normalized series and maps each
//! mean to a letter through standard-normal breakpoints. ASTRIDE lets a
//! change-point search choose variable-width segments, then letters segment
//! means by their own empirical quantiles. ASTRIDE has no reference path.

use serde::Serialize;

use super::helpers::{
    array_split_means, linspace, mean, normal_ppf, quantile_linear, search_sorted_right, z_normalize,
};
use crate::{
    backends::Capabilities,
    frame::Frame,
    params::{AstrideParams, Parameterized, SaxParams},
    NarrataError, Result,
};

/// Smallest segment ASTRIDE asks the change-point search for
const MIN_ASTRIDE_SEGMENT: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SymbolicStats {
    /// "SAX" or "ASTRIDE"
    pub method: &'static str,
    /// Letters in `symbols`
    pub word_size: usize,
    pub alphabet_size: usize,
    pub symbols: String,
}

fn to_letters(indices: impl IntoIterator<Item = usize>, alphabet_size: usize) -> String {
    indices
        .into_iter()
        .map(|i| char::from(b'a' + i.min(alphabet_size - 1) as u8))
        .collect()
}

// ============================================================
// SAX
// ============================================================

/// Standard-normal breakpoints splitting the line into `alphabet_size`
/// equiprobable regions
pub fn gaussian_breakpoints(alphabet_size: usize) -> Vec<f64> {
    (1..alphabet_size)
        .map(|i| normal_ppf(i as f64 / alphabet_size as f64))
        .collect()
}

pub fn sax_encode(frame: &Frame, column: &str, params: &SaxParams, caps: &Capabilities) -> Result<SymbolicStats> {
    params.validate()?;
    let word_size = params.word_size.get();
    let alphabet_size = params.alphabet_size.get();

    let values = frame.series(column)?.values;
    if values.len() < word_size {
        return Err(NarrataError::insufficient("SAX word", word_size, values.len()));
    }

    let from_backend = caps.sax.as_deref().and_then(|backend| {
        tracing::debug!(backend = backend.name(), "SAX backend path");
        let word = backend.transform(&values, word_size, alphabet_size);
        if word.is_none() {
            tracing::warn!(backend = backend.name(), "SAX backend returned no word, using reference");
        }
        word
    });
    let indices = match from_backend {
        Some(word) => word,
        None => sax_reference(&values, word_size, alphabet_size),
    };

    Ok(SymbolicStats {
        method: "SAX",
        word_size,
        alphabet_size,
        symbols: to_letters(indices, alphabet_size),
    })
}

fn sax_reference(values: &[f64], word_size: usize, alphabet_size: usize) -> Vec<usize> {
    let paa = array_split_means(&z_normalize(values), word_size);
    let breakpoints = gaussian_breakpoints(alphabet_size);
    paa.iter().map(|&m| search_sorted_right(&breakpoints, m)).collect()
}

pub fn describe_sax(stats: &SymbolicStats) -> String {
    format!("SAX({}): {}", stats.word_size, stats.symbols)
}

// ============================================================
// ASTRIDE
// ============================================================

/// Adaptive symbolization over change-point segments.
///
/// Fails with `BackendUnavailable` when no change-point backend is present.
/// The word length is the number of detected segments.
pub fn astride_encode(
    frame: &Frame,
    column: &str,
    params: &AstrideParams,
    caps: &Capabilities,
) -> Result<SymbolicStats> {
    params.validate()?;
    let backend = caps.changepoint.as_deref().ok_or(NarrataError::BackendUnavailable {
        analyzer: "ASTRIDE encoding",
        backend: "changepoint",
    })?;
    let n_segments = params.n_segments.get();
    let alphabet_size = params.alphabet_size.get();

    let values = frame.series(column)?.values;
    if values.len() < n_segments {
        return Err(NarrataError::insufficient("ASTRIDE segments", n_segments, values.len()));
    }

    let normalized = z_normalize(&values);
    let min_size = MIN_ASTRIDE_SEGMENT.max(normalized.len() / (n_segments * 2));
    let bkps = backend.segment(&normalized, min_size, params.penalty)?;
    tracing::debug!(backend = backend.name(), segments = bkps.len(), "ASTRIDE segmentation");

    let mut start = 0;
    let mut segment_means = Vec::with_capacity(bkps.len());
    for end in bkps {
        let end = end.min(normalized.len());
        if end > start {
            segment_means.push(mean(&normalized[start..end]));
            start = end;
        }
    }

    let symbols = if segment_means.len() < 2 {
        "a".repeat(segment_means.len().max(1))
    } else {
        let boundaries: Vec<f64> = linspace(0.0, 1.0, alphabet_size + 1)
            .into_iter()
            .map(|q| quantile_linear(&segment_means, q))
            .collect();
        let bins = &boundaries[1..boundaries.len() - 1];
        to_letters(
            segment_means.iter().map(|&m| search_sorted_right(bins, m)),
            alphabet_size,
        )
    };

    Ok(SymbolicStats {
        method: "ASTRIDE",
        word_size: symbols.len(),
        alphabet_size,
        symbols,
    })
}

pub fn describe_astride(stats: &SymbolicStats) -> String {
    format!("ASTRIDE({}): {}", stats.word_size, stats.symbols)
}
