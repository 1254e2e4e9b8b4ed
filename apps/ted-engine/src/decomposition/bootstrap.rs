//! Chain-volume real-level reconstruction for sum aggregates.
//!
//! Real levels are not additive across children: summing them
//! double-counts relative-price effects. The aggregate's real history is
//! instead rebuilt from the base-year anchor outward, one year at a time.
//! Each year's quarterly level is the sum-product of the children's
//! quarterly real levels and their prior-year deflators, divided by the
//! aggregate's own prior-year deflator.
//!
//! Forward of the base year that recursion runs directly. Backward of it
//! the prior-year deflator is the unknown, but the sum-product terms are
//! linear in it, so each earlier year's deflator falls out of a
//! closed-form ratio with no search.

use super::error::ComputeError;

/// A resolved child's inputs to the reconstruction.
pub(crate) struct ChildLevels<'a> {
    /// Signed quarterly real levels.
    pub real_q: &'a [f64],
    /// Yearly deflators.
    pub deflator_y: &'a [f64],
}

/// Sum-product of the children's quarterly real levels at their
/// deflators of year `year - 1`.
fn quarter_value(children: &[ChildLevels<'_>], quarter: usize, year: usize) -> f64 {
    children
        .iter()
        .map(|c| c.real_q[quarter] * c.deflator_y[year - 1])
        .sum()
}

fn ensure_deflator(
    name: &str,
    period: &str,
    value: f64,
) -> Result<f64, ComputeError> {
    if value.is_finite() && value != 0.0 {
        Ok(value)
    } else {
        Err(ComputeError::DegenerateDeflator {
            name: name.to_string(),
            period: period.to_string(),
            value,
        })
    }
}

/// Rebuild an aggregate's quarterly and yearly real levels and its
/// yearly deflators from its children and its own nominal yearly levels.
///
/// Returns `(real_q, real_y, deflator_y)`. The earliest year's quarters
/// stay NaN when the base year is not the earliest year: no prior-year
/// deflator exists to value them at.
pub(crate) fn chain_volume_levels(
    name: &str,
    nominal_y: &[f64],
    children: &[ChildLevels<'_>],
    base_index: usize,
    year_labels: &[String],
) -> Result<(Vec<f64>, Vec<f64>, Vec<f64>), ComputeError> {
    let years = nominal_y.len();
    let mut real_q = vec![f64::NAN; years * 4];
    let mut real_y = vec![f64::NAN; years];
    let mut deflator_y = vec![f64::NAN; years];

    // Anchor: at the base year real equals nominal by definition.
    real_y[base_index] = nominal_y[base_index];
    deflator_y[base_index] = 1.0;

    // Forward pass. Each year's deflator depends only on quantities
    // resolved in earlier years, so this chains in one sweep.
    for y in base_index + 1..years {
        let prior =
            ensure_deflator(name, &year_labels[y - 1], deflator_y[y - 1])?;
        let mut year_sum = 0.0;
        for q in y * 4..y * 4 + 4 {
            real_q[q] = quarter_value(children, q, y) / prior;
            year_sum += real_q[q];
        }
        real_y[y] = year_sum;
        deflator_y[y] =
            ensure_deflator(name, &year_labels[y], nominal_y[y] / year_sum)?;
    }

    // Backward pass, strictly descending. Year y's real level is already
    // known, and the sum-product for its quarters is linear in the
    // unknown deflator of year y-1, so that deflator is the ratio of the
    // two.
    for y in (1..=base_index).rev() {
        let sum_product: f64 = (y * 4..y * 4 + 4)
            .map(|q| quarter_value(children, q, y))
            .sum();
        let solved = ensure_deflator(
            name,
            &year_labels[y - 1],
            sum_product / real_y[y],
        )?;
        deflator_y[y - 1] = solved;
        for q in y * 4..y * 4 + 4 {
            real_q[q] = quarter_value(children, q, y) / solved;
        }
        real_y[y - 1] = nominal_y[y - 1] / solved;
    }

    Ok((real_q, real_y, deflator_y))
}
