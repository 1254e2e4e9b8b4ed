//! Combinators for derived nodes.
//!
//! Nominal levels and contributions are additive across children, so
//! balance and chain-volume aggregates sum them directly. Real levels
//! are only additive for balances; chain aggregates get theirs from the
//! bootstrap instead.

use super::direct::NodeQuantities;
use super::math::{diff_series, sum_series};

/// A balance node: plain element-wise sums of already-signed children,
/// for every quantity at once (net exports: exports plus negatively
/// signed imports).
pub(crate) fn balance_quantities(children: &[&NodeQuantities]) -> NodeQuantities {
    let mut quantities = NodeQuantities {
        real_q: sum_field(children, |c| &c.real_q),
        nominal_q: sum_field(children, |c| &c.nominal_q),
        real_y: sum_field(children, |c| &c.real_y),
        nominal_y: sum_field(children, |c| &c.nominal_y),
        contribution_q: sum_field(children, |c| &c.contribution_q),
        contribution_y: sum_field(children, |c| &c.contribution_y),
        ..NodeQuantities::default()
    };
    quantities.fill_deflator();
    quantities.fill_growth();
    quantities
}

/// Nominal levels of a chain-volume aggregate: additive across children.
pub(crate) fn summed_nominals(children: &[&NodeQuantities]) -> (Vec<f64>, Vec<f64>) {
    (
        sum_field(children, |c| &c.nominal_q),
        sum_field(children, |c| &c.nominal_y),
    )
}

/// Contributions of a sum aggregate: additive across children.
pub(crate) fn summed_contributions(children: &[&NodeQuantities]) -> (Vec<f64>, Vec<f64>) {
    (
        sum_field(children, |c| &c.contribution_q),
        sum_field(children, |c| &c.contribution_y),
    )
}

/// A residual node: everything is the difference of two other nodes
/// (statistical discrepancy: production-side measure less the
/// expenditure-side measure).
pub(crate) fn residual_quantities(of: &NodeQuantities, less: &NodeQuantities) -> NodeQuantities {
    let mut quantities = NodeQuantities {
        real_q: diff_series(&of.real_q, &less.real_q),
        nominal_q: diff_series(&of.nominal_q, &less.nominal_q),
        real_y: diff_series(&of.real_y, &less.real_y),
        nominal_y: diff_series(&of.nominal_y, &less.nominal_y),
        contribution_q: diff_series(&of.contribution_q, &less.contribution_q),
        contribution_y: diff_series(&of.contribution_y, &less.contribution_y),
        ..NodeQuantities::default()
    };
    quantities.fill_deflator();
    quantities.fill_growth();
    quantities
}

fn sum_field<'a, F>(children: &'a [&NodeQuantities], field: F) -> Vec<f64>
where
    F: Fn(&'a NodeQuantities) -> &'a Vec<f64>,
{
    let slices: Vec<&[f64]> = children.iter().map(|c| field(c).as_slice()).collect();
    sum_series(&slices)
}
