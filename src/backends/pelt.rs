//! PELT change-point search with a kernel (RBF) segment cost
//!
//! Exact penalized segmentation over candidate breakpoints spaced `jump`
//! samples apart, with the usual pruning of candidates that can no longer
//! start an optimal last segment. The RBF bandwidth follows the median
//! heuristic over all pairwise squared distances.

use std::collections::HashMap;

use super::ChangePointBackend;
use crate::{NarrataError, Result};

/// Candidate breakpoint spacing used when none is configured
pub const DEFAULT_JUMP: usize = 5;

/// Kernel distances are clipped to this range before exponentiation
const GAMMA_CLIP: (f64, f64) = (1e-2, 1e2);

/// Penalized exact linear time segmentation
#[derive(Debug, Clone)]
pub struct Pelt {
    pub jump: usize,
}

impl Default for Pelt {
    fn default() -> Self {
        Self { jump: DEFAULT_JUMP }
    }
}

impl Pelt {
    pub fn with_defaults() -> Self {
        Self::default()
    }
}

impl ChangePointBackend for Pelt {
    fn name(&self) -> &'static str {
        "pelt-rbf"
    }

    fn segment(&self, signal: &[f64], min_size: usize, penalty: f64) -> Result<Vec<usize>> {
        let n = signal.len();
        let min_size = min_size.max(1);
        if n < min_size {
            return Err(NarrataError::insufficient("change-point segmentation", min_size, n));
        }
        if !penalty.is_finite() {
            return Err(NarrataError::validation("penalty must be finite."));
        }

        let cost = RbfCost::fit(signal);
        let jump = self.jump.max(1);

        let mut partitions: HashMap<usize, Partition> = HashMap::new();
        partitions.insert(0, Partition::default());
        let mut admissible: Vec<usize> = Vec::new();

        let mut ends: Vec<usize> = (0..n).step_by(jump).filter(|&k| k >= min_size).collect();
        ends.push(n);

        for bkp in ends {
            admissible.push((bkp - min_size) / jump * jump);

            // candidates whose prefix has no solution are skipped, and the pruning
            // pass below pairs the surviving list positionally with `admissible`
            let subproblems: Vec<Partition> = admissible
                .iter()
                .filter_map(|t| {
                    let base = partitions.get(t)?;
                    Some(base.extended(*t, bkp, cost.error(*t, bkp) + penalty))
                })
                .collect();

            let Some(best) = subproblems
                .iter()
                .fold(None::<&Partition>, |best, p| match best {
                    Some(b) if b.total <= p.total => Some(b),
                    _ => Some(p),
                })
                .cloned()
            else {
                continue;
            };

            let bound = best.total + penalty;
            admissible = admissible
                .iter()
                .zip(&subproblems)
                .filter(|(_, p)| p.total <= bound)
                .map(|(t, _)| *t)
                .collect();
            partitions.insert(bkp, best);
        }

        let best = partitions
            .remove(&n)
            .ok_or_else(|| NarrataError::validation("change-point search found no partition."))?;
        let mut bkps: Vec<usize> = best.segments.iter().map(|&(_, end)| end).collect();
        bkps.sort_unstable();
        tracing::trace!(n, min_size, penalty, segments = bkps.len(), "pelt segmentation");
        Ok(bkps)
    }
}

#[derive(Debug, Clone, Default)]
struct Partition {
    segments: Vec<(usize, usize)>,
    total: f64,
}

impl Partition {
    fn extended(&self, start: usize, end: usize, cost: f64) -> Self {
        let mut segments = self.segments.clone();
        segments.push((start, end));
        Self {
            segments,
            total: self.total + cost,
        }
    }
}

// ============================================================
// RBF COST
// ============================================================

/// Kernel cost with 2-D prefix sums over the Gram matrix, so each segment
/// cost is O(1) after O(n²) setup.
struct RbfCost {
    n: usize,
    prefix: Vec<f64>,
}

impl RbfCost {
    fn fit(signal: &[f64]) -> Self {
        let n = signal.len();
        let gamma = median_heuristic_gamma(signal);
        let stride = n + 1;
        let mut prefix = vec![0.0; stride * stride];
        for i in 0..n {
            for j in 0..n {
                let k = if i == j {
                    1.0
                } else {
                    let d = signal[i] - signal[j];
                    (-(d * d * gamma).clamp(GAMMA_CLIP.0, GAMMA_CLIP.1)).exp()
                };
                prefix[(i + 1) * stride + j + 1] =
                    k + prefix[i * stride + j + 1] + prefix[(i + 1) * stride + j] - prefix[i * stride + j];
            }
        }
        Self { n, prefix }
    }

    fn block_sum(&self, start: usize, end: usize) -> f64 {
        let s = self.n + 1;
        self.prefix[end * s + end] - self.prefix[start * s + end] - self.prefix[end * s + start]
            + self.prefix[start * s + start]
    }

    /// Within-segment kernel scatter of `signal[start..end]`
    fn error(&self, start: usize, end: usize) -> f64 {
        if end <= start {
            return 0.0;
        }
        let len = (end - start) as f64;
        len - self.block_sum(start, end) / len
    }
}

fn median_heuristic_gamma(signal: &[f64]) -> f64 {
    let n = signal.len();
    let mut dists = Vec::with_capacity(n * n.saturating_sub(1) / 2);
    for i in 0..n {
        for j in i + 1..n {
            let d = signal[i] - signal[j];
            dists.push(d * d);
        }
    }
    if dists.is_empty() {
        return 1.0;
    }
    let mid = dists.len() / 2;
    let (_, upper, _) = dists.select_nth_unstable_by(mid, f64::total_cmp);
    let upper = *upper;
    let median = if dists.len() % 2 == 0 {
        let lower = dists[..mid].iter().copied().fold(f64::NEG_INFINITY, f64::max);
        (lower + upper) / 2.0
    } else {
        upper
    };
    if median != 0.0 && median.is_finite() {
        1.0 / median
    } else {
        1.0
    }
}
