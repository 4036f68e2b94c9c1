//! Aggregate statistics shared by the analysis stages

use ndarray::ArrayView1;

/// Arithmetic mean, `None` for an empty column
pub fn mean(values: ArrayView1<f64>) -> Option<f64> {
    values.mean()
}

/// Pearson correlation coefficient between two equally long columns.
///
/// Returns `None` when the coefficient is undefined: fewer than two
/// observations or a constant column on either side.
pub fn pearson(x: ArrayView1<f64>, y: ArrayView1<f64>) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 || is_constant(x) || is_constant(y) {
        return None;
    }

    let mean_x = x.mean()?;
    let mean_y = y.mean()?;

    let centered_x = x.mapv(|v| v - mean_x);
    let centered_y = y.mapv(|v| v - mean_y);

    let numerator = centered_x.dot(&centered_y);
    let denom = (centered_x.dot(&centered_x) * centered_y.dot(&centered_y)).sqrt();

    if denom == 0.0 || !denom.is_finite() {
        return None;
    }
    Some((numerator / denom).clamp(-1.0, 1.0))
}

fn is_constant(values: ArrayView1<f64>) -> bool {
    match values.iter().next() {
        Some(&first) => values.iter().all(|&v| v == first),
        None => true,
    }
}

/// Quantile with linear interpolation between the two closest ranks.
///
/// `q` must lie in `[0, 1]`; an empty column or out-of-range `q` yields `None`.
pub fn quantile(values: ArrayView1<f64>, q: f64) -> Option<f64> {
    quantiles(values, &[q]).map(|qs| qs[0])
}

/// Several quantiles of the same column, sorting it once
pub fn quantiles(values: ArrayView1<f64>, qs: &[f64]) -> Option<Vec<f64>> {
    if values.is_empty() || qs.iter().any(|q| !(0.0..=1.0).contains(q)) {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    Some(qs.iter().map(|&q| interpolate(&sorted, q)).collect())
}

fn interpolate(sorted: &[f64], q: f64) -> f64 {
    let h = (sorted.len() - 1) as f64 * q;
    let lower = h.floor() as usize;
    let upper = h.ceil() as usize;
    sorted[lower] + (sorted[upper] - sorted[lower]) * (h - lower as f64)
}

/// Number of customers selected by `include` and their mean target value.
///
/// The rate is `None` when nobody is selected.
pub fn acceptance_rate<F>(target: ArrayView1<f64>, mut include: F) -> (usize, Option<f64>)
where
    F: FnMut(usize) -> bool,
{
    let (count, accepted) = target
        .iter()
        .enumerate()
        .filter(|(row, _)| include(*row))
        .fold((0usize, 0.0), |(count, sum), (_, &y)| (count + 1, sum + y));

    let rate = (count > 0).then(|| accepted / count as f64);
    (count, rate)
}

/// Ratio of a segment rate to the baseline rate; undefined for a zero baseline
pub fn uplift(rate: Option<f64>, baseline: Option<f64>) -> Option<f64> {
    match (rate, baseline) {
        (Some(rate), Some(baseline)) if baseline > 0.0 => Some(rate / baseline),
        _ => None,
    }
}
