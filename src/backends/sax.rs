//! Fixed-window SAX transform
//!
//! Segments have equal length `n / word_size`; trailing samples that do not
//! fill a whole segment are dropped.

use super::SaxBackend;
use crate::analysis::helpers::{mean, normal_ppf, search_sorted_right, z_normalize};

#[derive(Debug, Clone, Copy, Default)]
pub struct FixedWindowSax;

impl SaxBackend for FixedWindowSax {
    fn name(&self) -> &'static str {
        "fixed-window-sax"
    }

    fn transform(&self, values: &[f64], word_size: usize, alphabet_size: usize) -> Option<Vec<usize>> {
        if word_size == 0 || alphabet_size < 2 || values.len() < word_size {
            return None;
        }
        let normalized = z_normalize(values);
        let size = normalized.len() / word_size;
        let breakpoints: Vec<f64> = (1..alphabet_size)
            .map(|i| normal_ppf(i as f64 / alphabet_size as f64))
            .collect();

        Some(
            normalized
                .chunks_exact(size)
                .take(word_size)
                .map(|chunk| search_sorted_right(&breakpoints, mean(chunk)))
                .collect(),
        )
    }
}
