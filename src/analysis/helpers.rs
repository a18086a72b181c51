//! Numeric helpers shared by the analyzers
//!
//! Rolling windows, exponential smoothing, quantiles and the inverse normal
//! CDF. Functions taking whole series return `NaN` for positions that do not
//! have a full window yet, mirroring the warmup convention of the TA backends.

// ============================================================
// SUMMARY STATISTICS
// ============================================================

/// Arithmetic mean; `NaN` for an empty slice
#[inline]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (ddof = 0)
pub fn std_pop(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

pub fn median(values: &[f64]) -> f64 {
    quantile_linear(values, 0.5)
}

/// Quantile with linear interpolation between closest ranks.
/// Non-finite inputs are ignored; `NaN` when nothing is left.
pub fn quantile_linear(values: &[f64], q: f64) -> f64 {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return f64::NAN;
    }
    sorted.sort_by(f64::total_cmp);
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

// ============================================================
// ROLLING / SMOOTHING
// ============================================================

/// Rolling mean over `window` samples, `NaN` during warmup
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    if window == 0 || values.len() < window {
        return out;
    }
    for end in window..=values.len() {
        out[end - 1] = mean(&values[end - window..end]);
    }
    out
}

/// Rolling population standard deviation over `window` samples, `NaN` during warmup
pub fn rolling_std(values: &[f64], window: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    if window == 0 || values.len() < window {
        return out;
    }
    for end in window..=values.len() {
        out[end - 1] = std_pop(&values[end - window..end]);
    }
    out
}

/// Recursive exponential smoothing seeded with the first value:
/// `y[0] = x[0]`, `y[t] = alpha * x[t] + (1 - alpha) * y[t-1]`.
pub fn ewm(values: &[f64], alpha: f64) -> Vec<f64> {
    let mut out = Vec::with_capacity(values.len());
    let mut prev: Option<f64> = None;
    for &v in values {
        let next = match prev {
            Some(p) => alpha * v + (1.0 - alpha) * p,
            None => v,
        };
        out.push(next);
        prev = Some(next);
    }
    out
}

/// Span-parameterized smoothing, `alpha = 2 / (span + 1)`
#[inline]
pub fn ewm_span(values: &[f64], span: usize) -> Vec<f64> {
    ewm(values, 2.0 / (span as f64 + 1.0))
}

/// First differences; one element shorter than the input
pub fn diff(values: &[f64]) -> Vec<f64> {
    values.windows(2).map(|w| w[1] - w[0]).collect()
}

/// Percent changes with non-finite results dropped
pub fn pct_change(values: &[f64]) -> Vec<f64> {
    values
        .windows(2)
        .map(|w| w[1] / w[0] - 1.0)
        .filter(|r| r.is_finite())
        .collect()
}

// ============================================================
// SHAPE HELPERS
// ============================================================

/// Tolerance under which a standard deviation is treated as zero
pub const FLAT_STD_EPS: f64 = 1e-8;

/// Z-normalize; a flat series maps to all zeros
pub fn z_normalize(values: &[f64]) -> Vec<f64> {
    let sd = std_pop(values);
    if !sd.is_finite() || sd.abs() <= FLAT_STD_EPS {
        return vec![0.0; values.len()];
    }
    let m = mean(values);
    values.iter().map(|v| (v - m) / sd).collect()
}

/// Split into `sections` contiguous chunks whose sizes differ by at most one
/// (leading chunks take the remainder) and return each chunk's mean.
pub fn array_split_means(values: &[f64], sections: usize) -> Vec<f64> {
    if sections == 0 {
        return Vec::new();
    }
    let base = values.len() / sections;
    let extra = values.len() % sections;
    let mut out = Vec::with_capacity(sections);
    let mut start = 0;
    for i in 0..sections {
        let size = base + usize::from(i < extra);
        out.push(mean(&values[start..start + size]));
        start += size;
    }
    out
}

/// `num` evenly spaced samples over `[start, end]`, endpoints included
pub fn linspace(start: f64, end: f64, num: usize) -> Vec<f64> {
    match num {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (num - 1) as f64;
            (0..num)
                .map(|i| if i == num - 1 { end } else { start + step * i as f64 })
                .collect()
        }
    }
}

/// Insertion index keeping `sorted` ordered, placed after equal elements
pub fn search_sorted_right(sorted: &[f64], value: f64) -> usize {
    sorted.partition_point(|&b| b <= value)
}

/// Least-squares slope of `y` against `0..n`
pub fn linear_slope(y: &[f64]) -> f64 {
    let n = y.len();
    if n < 2 {
        return 0.0;
    }
    let xm = (n - 1) as f64 / 2.0;
    let ym = mean(y);
    let (num, den) = y.iter().enumerate().fold((0.0, 0.0), |(num, den), (i, v)| {
        let dx = i as f64 - xm;
        (num + dx * (v - ym), den + dx * dx)
    });
    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}

/// Inverse of the standard normal CDF (Wichura, AS241 PPND16).
/// Accurate to about 1e-16 over the open interval (0, 1).
pub fn normal_ppf(p: f64) -> f64 {
    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }

    let q = p - 0.5;
    if q.abs() <= 0.425 {
        let r = 0.180625 - q * q;
        let num = ((((((2.509_080_928_730_122_7e3 * r + 3.343_057_558_358_813e4) * r
            + 6.726_577_092_700_87e4)
            * r
            + 4.592_195_393_154_987e4)
            * r
            + 1.373_169_376_550_946e4)
            * r
            + 1.971_590_950_306_551_3e3)
            * r
            + 1.331_416_678_917_843_8e2)
            * r
            + 3.387_132_872_796_366_5;
        let den = ((((((5.226_495_278_852_545e3 * r + 2.872_908_573_572_194_3e4) * r
            + 3.930_789_580_009_271e4)
            * r
            + 2.121_379_430_158_659_7e4)
            * r
            + 5.394_196_021_424_751e3)
            * r
            + 6.871_870_074_920_579e2)
            * r
            + 4.231_333_070_160_091e1)
            * r
            + 1.0;
        return q * num / den;
    }

    let tail = if q < 0.0 { p } else { 1.0 - p };
    let mut r = (-tail.ln()).sqrt();
    let value = if r <= 5.0 {
        r -= 1.6;
        let num = ((((((7.745_450_142_783_414e-4 * r + 2.272_384_498_926_918_4e-2) * r
            + 2.417_807_251_774_506e-1)
            * r
            + 1.270_458_252_452_368_4)
            * r
            + 3.647_848_324_763_204_5)
            * r
            + 5.769_497_221_460_691)
            * r
            + 4.630_337_846_156_545)
            * r
            + 1.423_437_110_749_683_5;
        let den = ((((((1.050_750_071_644_416_8e-9 * r + 5.475_938_084_995_345e-4) * r
            + 1.519_866_656_361_645_7e-2)
            * r
            + 1.481_039_764_274_800_8e-1)
            * r
            + 6.897_673_349_851e-1)
            * r
            + 1.676_384_830_183_803_8)
            * r
            + 2.053_191_626_637_758_8)
            * r
            + 1.0;
        num / den
    } else {
        r -= 5.0;
        let num = ((((((2.010_334_399_292_288_1e-7 * r + 2.711_555_568_743_487_6e-5) * r
            + 1.242_660_947_388_078_4e-3)
            * r
            + 2.653_218_952_657_612_4e-2)
            * r
            + 2.965_605_718_285_049e-1)
            * r
            + 1.784_826_539_917_291_3)
            * r
            + 5.463_784_911_164_114)
            * r
            + 6.657_904_643_501_103;
        let den = ((((((2.044_263_103_389_939_7e-15 * r + 1.421_511_758_316_446e-7) * r
            + 1.846_318_317_510_054_8e-5)
            * r
            + 7.868_691_311_456_133e-4)
            * r
            + 1.487_536_129_085_061_5e-2)
            * r
            + 1.369_298_809_227_358e-1)
            * r
            + 5.998_322_065_558_88e-1)
            * r
            + 1.0;
        num / den
    };

    if q < 0.0 {
        -value
    } else {
        value
    }
}

// ============================================================
// TEXT HELPERS
// ============================================================

/// Shortest float text that still reads as a float ("2.0", "1.25")
pub fn float_repr(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

/// English ordinal suffix ("1st", "12th", "23rd")
pub fn ordinal(n: i64) -> String {
    let suffix = match (n % 100, n % 10) {
        (11..=13, _) => "th",
        (_, 1) => "st",
        (_, 2) => "nd",
        (_, 3) => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}

/// Currency text such as `$12.50`; `n/a` for non-finite values
pub fn format_money(value: f64, symbol: &str, precision: usize) -> String {
    if !value.is_finite() {
        return "n/a".to_string();
    }
    format!("{symbol}{value:.precision$}")
}

// ============================================================
// TESTS
// ============================================================
