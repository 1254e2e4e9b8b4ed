//! Per-node direct calculation and contribution weighting.
//!
//! Loadable nodes get their levels straight from the raw bundle, signed.
//! Contributions for non-aggregate nodes are chain-weighted shares of the
//! reference aggregate's real growth, which is why every weighting step
//! divides by [`ReferenceFrame`] quantities rather than the node's own.

use crate::series::SeriesNode;

use super::error::{ComputeError, DataError, DecompositionError};
use super::math::{deflator_series, growth_from_levels};
use super::types::{Frequency, RawBundle, RawTable};

/// Fully resolved quantities for one node, both frequencies.
///
/// Level vectors are signed; everything downstream is sign-free because
/// the sign is folded in here once.
#[derive(Debug, Clone, Default)]
pub(crate) struct NodeQuantities {
    pub real_q: Vec<f64>,
    pub nominal_q: Vec<f64>,
    pub real_y: Vec<f64>,
    pub nominal_y: Vec<f64>,
    pub deflator_y: Vec<f64>,
    pub growth_q: Vec<f64>,
    pub growth_y: Vec<f64>,
    pub contribution_q: Vec<f64>,
    pub contribution_y: Vec<f64>,
}

impl NodeQuantities {
    /// Derive the yearly deflator from the level vectors.
    pub fn fill_deflator(&mut self) {
        self.deflator_y = deflator_series(&self.nominal_y, &self.real_y);
    }

    /// Derive growth from the real level vectors. Must run only once the
    /// level vectors cover the full history.
    pub fn fill_growth(&mut self) {
        self.growth_q = growth_from_levels(&self.real_q, 4);
        self.growth_y = growth_from_levels(&self.real_y, 1);
    }
}

/// The reference aggregate's quantities every weighted contribution is
/// measured against.
///
/// Built straight from the raw bundle and checked for degeneracy up
/// front, so the weighting formulas can divide without re-checking.
#[derive(Debug, Clone)]
pub(crate) struct ReferenceFrame {
    pub level_real_q: Vec<f64>,
    pub level_real_y: Vec<f64>,
    pub deflator_y: Vec<f64>,
}

impl ReferenceFrame {
    /// Build the frame for `aggregate` from raw data.
    pub fn from_raw(bundle: &RawBundle, aggregate: &str) -> Result<Self, DecompositionError> {
        let level_real_q =
            raw_series(&bundle.quarterly, aggregate, "real", Frequency::Quarterly)?.to_vec();
        let level_real_y =
            raw_series(&bundle.yearly, aggregate, "real", Frequency::Yearly)?.to_vec();
        let nominal_y =
            raw_series(&bundle.yearly, aggregate, "nominal", Frequency::Yearly)?.to_vec();
        let deflator_y = deflator_series(&nominal_y, &level_real_y);

        for (i, &v) in level_real_q.iter().enumerate() {
            if !v.is_finite() || v == 0.0 {
                return Err(ComputeError::DegenerateReferenceLevel {
                    name: aggregate.to_string(),
                    period: bundle.quarterly.periods[i].clone(),
                    value: v,
                }
                .into());
            }
        }
        for (i, &v) in level_real_y.iter().enumerate() {
            if !v.is_finite() || v == 0.0 {
                return Err(ComputeError::DegenerateReferenceLevel {
                    name: aggregate.to_string(),
                    period: bundle.yearly.periods[i].clone(),
                    value: v,
                }
                .into());
            }
        }
        for (i, &v) in deflator_y.iter().enumerate() {
            if !v.is_finite() || v == 0.0 {
                return Err(ComputeError::DegenerateDeflator {
                    name: aggregate.to_string(),
                    period: bundle.yearly.periods[i].clone(),
                    value: v,
                }
                .into());
            }
        }

        Ok(Self {
            level_real_q,
            level_real_y,
            deflator_y,
        })
    }
}

/// Look up one raw value vector.
fn raw_series<'a>(
    table: &'a RawTable,
    name: &str,
    kind: &'static str,
    frequency: Frequency,
) -> Result<&'a [f64], DataError> {
    let map = match kind {
        "real" => &table.real,
        _ => &table.nominal,
    };
    map.get(name)
        .map(Vec::as_slice)
        .ok_or_else(|| DataError::MissingSeries {
            name: name.to_string(),
            kind,
            frequency,
        })
}

/// Levels, deflator, and growth for a loadable node, signed.
pub(crate) fn loaded_quantities(
    node: &SeriesNode,
    bundle: &RawBundle,
) -> Result<NodeQuantities, DataError> {
    let sign = node.sign();
    let signed = |values: &[f64]| values.iter().map(|v| sign * v).collect::<Vec<f64>>();

    let mut quantities = NodeQuantities {
        real_q: signed(raw_series(
            &bundle.quarterly,
            &node.name,
            "real",
            Frequency::Quarterly,
        )?),
        nominal_q: signed(raw_series(
            &bundle.quarterly,
            &node.name,
            "nominal",
            Frequency::Quarterly,
        )?),
        real_y: signed(raw_series(
            &bundle.yearly,
            &node.name,
            "real",
            Frequency::Yearly,
        )?),
        nominal_y: signed(raw_series(
            &bundle.yearly,
            &node.name,
            "nominal",
            Frequency::Yearly,
        )?),
        ..NodeQuantities::default()
    };
    quantities.fill_deflator();
    quantities.fill_growth();
    Ok(quantities)
}

/// Yearly chain-weighted contribution: the node's real change valued at
/// last year's prices, relative to last year's nominal aggregate.
///
/// NaN for the first year (no trailing deflator).
pub(crate) fn weighted_contribution_yearly(
    levels_y: &[f64],
    deflator_y: &[f64],
    frame: &ReferenceFrame,
) -> Vec<f64> {
    (0..levels_y.len())
        .map(|i| {
            if i < 1 {
                f64::NAN
            } else {
                (levels_y[i] - levels_y[i - 1]) / frame.level_real_y[i - 1]
                    * (deflator_y[i - 1] / frame.deflator_y[i - 1])
            }
        })
        .collect()
}

/// Quarterly chain-weighted contribution.
///
/// The base term is the year-over-year quarterly real change scaled by
/// the prior year's deflator ratio; the drift term corrects for
/// within-year deflator movement. Both need two years of trailing yearly
/// deflators, so the first two years of quarters are NaN.
pub(crate) fn weighted_contribution_quarterly(
    levels_q: &[f64],
    levels_y: &[f64],
    deflator_y: &[f64],
    frame: &ReferenceFrame,
) -> Vec<f64> {
    (0..levels_q.len())
        .map(|i| {
            let yi = i / 4;
            if yi < 2 {
                f64::NAN
            } else {
                let ratio_prev = deflator_y[yi - 1] / frame.deflator_y[yi - 1];
                let ratio_prev2 = deflator_y[yi - 2] / frame.deflator_y[yi - 2];
                let base =
                    (levels_q[i] - levels_q[i - 4]) / frame.level_real_q[i - 4] * ratio_prev;
                let drift = (levels_q[i - 4] / frame.level_real_q[i - 4]
                    - levels_y[yi - 1] / frame.level_real_y[yi - 1])
                    * (ratio_prev - ratio_prev2);
                base + drift
            }
        })
        .collect()
}
