//! Vector math shared by the decomposition passes.

/// Growth over `lag` periods: `v[i] / v[i - lag] - 1`.
///
/// NaN for the first `lag` periods and wherever either operand is NaN.
pub(crate) fn growth_from_levels(levels: &[f64], lag: usize) -> Vec<f64> {
    levels
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            if i < lag {
                f64::NAN
            } else {
                v / levels[i - lag] - 1.0
            }
        })
        .collect()
}

/// Implied deflator: `nominal[i] / real[i]`.
pub(crate) fn deflator_series(nominal: &[f64], real: &[f64]) -> Vec<f64> {
    nominal
        .iter()
        .zip(real)
        .map(|(&n, &r)| n / r)
        .collect()
}

/// Element-wise sum of several equally-long vectors.
pub(crate) fn sum_series(series: &[&[f64]]) -> Vec<f64> {
    let len = series.first().map_or(0, |s| s.len());
    (0..len).map(|i| series.iter().map(|s| s[i]).sum()).collect()
}

/// Element-wise difference `a - b`.
pub(crate) fn diff_series(a: &[f64], b: &[f64]) -> Vec<f64> {
    a.iter().zip(b).map(|(&x, &y)| x - y).collect()
}
