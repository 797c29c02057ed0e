/// Number of equal-width bins in a histogram.
pub const HISTOGRAM_BINS: usize = 10;

/// Whiskers reach this many inter-quartile ranges beyond the box.
const WHISKER_IQR: f64 = 1.5;

// ---------------------------------------------------------------------------
// Histogram
// ---------------------------------------------------------------------------

/// `bins + 1` equal-width edges spanning every finite value, or `None` when
/// there is nothing to count.
pub fn bin_edges(values: impl IntoIterator<Item = f64>, bins: usize) -> Option<Vec<f64>> {
    let (lo, hi) = finite_extent(values)?;
    let (lo, hi) = if lo == hi {
        (lo - 0.5, hi + 0.5)
    } else {
        (lo, hi)
    };
    let width = (hi - lo) / bins as f64;
    Some(
        (0..=bins)
            .map(|i| if i == bins { hi } else { lo + width * i as f64 })
            .collect(),
    )
}

/// Count the finite values falling in each bin; the last bin includes its
/// right edge.
pub fn histogram(values: &[f64], edges: &[f64]) -> Vec<usize> {
    let bins = edges.len().saturating_sub(1);
    let mut counts = vec![0; bins];
    if bins == 0 {
        return counts;
    }
    let lo = edges[0];
    let hi = edges[bins];
    let width = (hi - lo) / bins as f64;
    for &v in values {
        if !v.is_finite() || v < lo || v > hi {
            continue;
        }
        let bin = (((v - lo) / width) as usize).min(bins - 1);
        counts[bin] += 1;
    }
    counts
}

// ---------------------------------------------------------------------------
// Box plot statistics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct BoxStats {
    pub lower_whisker: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub upper_whisker: f64,
    pub outliers: Vec<f64>,
}

/// Quantile of sorted data by linear interpolation between closest ranks.
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let pos = (n - 1) as f64 * q.clamp(0.0, 1.0);
            let below = pos.floor() as usize;
            let above = (below + 1).min(n - 1);
            let frac = pos - below as f64;
            sorted[below] + (sorted[above] - sorted[below]) * frac
        }
    }
}

/// Quartiles, whiskers and outliers of the finite values.
pub fn box_stats(values: &[f64]) -> Option<BoxStats> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);

    let q1 = quantile(&sorted, 0.25);
    let median = quantile(&sorted, 0.5);
    let q3 = quantile(&sorted, 0.75);
    let reach = WHISKER_IQR * (q3 - q1);
    let (low_fence, high_fence) = (q1 - reach, q3 + reach);

    let (inside, outliers): (Vec<f64>, Vec<f64>) = sorted
        .iter()
        .partition(|v| (low_fence..=high_fence).contains(*v));
    let lower_whisker = inside.first().copied().unwrap_or(q1);
    let upper_whisker = inside.last().copied().unwrap_or(q3);

    Some(BoxStats {
        lower_whisker,
        q1,
        median,
        q3,
        upper_whisker,
        outliers,
    })
}

/// Smallest and largest finite value.
pub fn finite_extent(values: impl IntoIterator<Item = f64>) -> Option<(f64, f64)> {
    values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}
