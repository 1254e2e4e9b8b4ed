//! The decomposition engine: a pure function from (raw bundle, tree) to
//! calculated series for every node.
//!
//! Resolution order is the correctness-critical part. Non-residual nodes
//! are resolved in tree post-order so every child is complete before its
//! parent sums or chain-links it. Residual nodes reference arbitrary
//! nodes anywhere in the tree, so they run in a second phase once
//! everything else exists. Growth is only ever derived from real levels
//! that already cover the full history.

use std::collections::HashMap;

use crate::series::{Derivation, SeriesNode, SeriesTree, TreeError};

use super::aggregate::{
    balance_quantities, residual_quantities, summed_contributions, summed_nominals,
};
use super::bootstrap::{ChildLevels, chain_volume_levels};
use super::direct::{
    NodeQuantities, ReferenceFrame, loaded_quantities, weighted_contribution_quarterly,
    weighted_contribution_yearly,
};
use super::error::{DataError, DecompositionError};
use super::math::deflator_series;
use super::types::{
    DecompositionResult, DecompositionSettings, Frequency, NodeSeries, PeriodValue, RawBundle,
    RawTable, quarter_label,
};

/// Batch decomposition over a fixed series tree.
///
/// Holds no mutable state: every [`DecompositionEngine::decompose`] call
/// produces a fresh, independent result.
pub struct DecompositionEngine {
    tree: SeriesTree,
    settings: DecompositionSettings,
}

impl DecompositionEngine {
    /// New engine over a validated tree.
    #[must_use]
    pub const fn new(tree: SeriesTree, settings: DecompositionSettings) -> Self {
        Self { tree, settings }
    }

    /// The tree this engine resolves.
    #[must_use]
    pub const fn tree(&self) -> &SeriesTree {
        &self.tree
    }

    /// Decompose one raw bundle into calculated series for every node.
    ///
    /// Either fully succeeds for all nodes and frequencies or fails
    /// outright; no partial output is produced.
    pub fn decompose(
        &self,
        bundle: &RawBundle,
    ) -> Result<DecompositionResult, DecompositionError> {
        let base_index = self.validate_bundle(bundle)?;
        let frame = ReferenceFrame::from_raw(bundle, &self.settings.aggregate)?;

        let mut resolved: HashMap<String, NodeQuantities> = HashMap::new();

        for node in self.tree.post_order() {
            if matches!(node.derivation, Derivation::Residual { .. }) {
                continue;
            }
            let quantities = self.resolve_node(node, bundle, &frame, &resolved, base_index)?;
            resolved.insert(node.name.clone(), quantities);
        }

        for node in self.tree.nodes() {
            if let Derivation::Residual { of, less } = &node.derivation {
                let of_q = require_resolved(&resolved, of)?;
                let less_q = require_resolved(&resolved, less)?;
                let mut quantities = residual_quantities(of_q, less_q);
                if self.is_self_growth(node) {
                    quantities.contribution_q = quantities.growth_q.clone();
                    quantities.contribution_y = quantities.growth_y.clone();
                }
                resolved.insert(node.name.clone(), quantities);
            }
        }

        self.assemble(bundle, &resolved)
            .map_err(DecompositionError::from)
    }

    /// Resolve one non-residual node, children already resolved.
    fn resolve_node(
        &self,
        node: &SeriesNode,
        bundle: &RawBundle,
        frame: &ReferenceFrame,
        resolved: &HashMap<String, NodeQuantities>,
        base_index: usize,
    ) -> Result<NodeQuantities, DecompositionError> {
        let mut quantities = match &node.derivation {
            Derivation::Loaded => {
                let mut q = loaded_quantities(node, bundle)?;
                q.contribution_y =
                    weighted_contribution_yearly(&q.real_y, &q.deflator_y, frame);
                q.contribution_q = weighted_contribution_quarterly(
                    &q.real_q,
                    &q.real_y,
                    &q.deflator_y,
                    frame,
                );
                q
            }
            Derivation::Balance => {
                let children = resolved_children(node, resolved)?;
                balance_quantities(&children)
            }
            Derivation::ChainVolumeSum => {
                let children = resolved_children(node, resolved)?;
                let (nominal_q, nominal_y) = summed_nominals(&children);
                let child_levels: Vec<ChildLevels<'_>> = children
                    .iter()
                    .map(|c| ChildLevels {
                        real_q: &c.real_q,
                        deflator_y: &c.deflator_y,
                    })
                    .collect();
                let (real_q, real_y, deflator_y) = chain_volume_levels(
                    &node.name,
                    &nominal_y,
                    &child_levels,
                    base_index,
                    &bundle.yearly.periods,
                )?;
                let (contribution_q, contribution_y) = summed_contributions(&children);
                let mut q = NodeQuantities {
                    real_q,
                    nominal_q,
                    real_y,
                    nominal_y,
                    deflator_y,
                    contribution_q,
                    contribution_y,
                    ..NodeQuantities::default()
                };
                q.fill_growth();
                q
            }
            // Residuals are handled in the second phase.
            Derivation::Residual { .. } => NodeQuantities::default(),
        };

        if self.is_self_growth(node) {
            quantities.contribution_q = quantities.growth_q.clone();
            quantities.contribution_y = quantities.growth_y.clone();
        }
        Ok(quantities)
    }

    /// The aggregate's contribution to itself is its own growth, and the
    /// tree root is measured against nothing above it.
    fn is_self_growth(&self, node: &SeriesNode) -> bool {
        node.name == self.tree.root().name || node.name == self.settings.aggregate
    }

    /// Check the bundle covers the tree and the configured base year.
    /// Returns the base year's index into the yearly periods.
    fn validate_bundle(&self, bundle: &RawBundle) -> Result<usize, DataError> {
        for frequency in [Frequency::Quarterly, Frequency::Yearly] {
            if bundle.table(frequency).periods.is_empty() {
                return Err(DataError::EmptyTable { frequency });
            }
        }

        let quarters = bundle.quarterly.periods.len();
        let years = bundle.yearly.periods.len();
        if quarters != years * 4 {
            return Err(DataError::RaggedHistory { quarters, years });
        }
        for (y, year) in bundle.yearly.periods.iter().enumerate() {
            for quarter in 0..4 {
                let expected = quarter_label(year, quarter);
                let found = &bundle.quarterly.periods[y * 4 + quarter];
                if *found != expected {
                    return Err(DataError::PeriodMismatch {
                        found: found.clone(),
                        expected,
                    });
                }
            }
        }

        for name in self.tree.series_to_load() {
            for frequency in [Frequency::Quarterly, Frequency::Yearly] {
                let table = bundle.table(frequency);
                check_series(table, &name, "real", frequency, &table.real)?;
                check_series(table, &name, "nominal", frequency, &table.nominal)?;
            }
        }

        let base_label = self.settings.base_year.to_string();
        bundle
            .yearly
            .periods
            .iter()
            .position(|p| *p == base_label)
            .ok_or(DataError::BaseYearOutOfRange {
                base_year: self.settings.base_year,
            })
    }

    /// Assemble the output in tree pre-order, both frequencies.
    fn assemble(
        &self,
        bundle: &RawBundle,
        resolved: &HashMap<String, NodeQuantities>,
    ) -> Result<DecompositionResult, TreeError> {
        let mut quarterly = Vec::with_capacity(self.tree.nodes().len());
        let mut yearly = Vec::with_capacity(self.tree.nodes().len());
        for node in self.tree.nodes() {
            let q = require_resolved(resolved, &node.name)?;
            let deflator_q = deflator_series(&q.nominal_q, &q.real_q);
            quarterly.push(node_series(
                &node.name,
                &bundle.quarterly.periods,
                &q.real_q,
                &q.nominal_q,
                &q.growth_q,
                &q.contribution_q,
                &deflator_q,
            ));
            yearly.push(node_series(
                &node.name,
                &bundle.yearly.periods,
                &q.real_y,
                &q.nominal_y,
                &q.growth_y,
                &q.contribution_y,
                &q.deflator_y,
            ));
        }
        Ok(DecompositionResult { quarterly, yearly })
    }
}

fn resolved_children<'a>(
    node: &SeriesNode,
    resolved: &'a HashMap<String, NodeQuantities>,
) -> Result<Vec<&'a NodeQuantities>, TreeError> {
    node.children
        .iter()
        .map(|child| require_resolved(resolved, child))
        .collect()
}

fn require_resolved<'a>(
    resolved: &'a HashMap<String, NodeQuantities>,
    name: &str,
) -> Result<&'a NodeQuantities, TreeError> {
    resolved.get(name).ok_or_else(|| TreeError::UnknownSeries {
        name: name.to_string(),
    })
}

fn check_series(
    table: &RawTable,
    name: &str,
    kind: &'static str,
    frequency: Frequency,
    map: &HashMap<String, Vec<f64>>,
) -> Result<(), DataError> {
    let values = map.get(name).ok_or_else(|| DataError::MissingSeries {
        name: name.to_string(),
        kind,
        frequency,
    })?;
    if values.len() != table.periods.len() {
        return Err(DataError::LengthMismatch {
            name: name.to_string(),
            kind,
            frequency,
            expected: table.periods.len(),
            actual: values.len(),
        });
    }
    Ok(())
}

fn node_series(
    name: &str,
    periods: &[String],
    real: &[f64],
    nominal: &[f64],
    growth: &[f64],
    contribution: &[f64],
    deflator: &[f64],
) -> NodeSeries {
    let data = periods
        .iter()
        .enumerate()
        .map(|(i, t)| PeriodValue {
            t: t.clone(),
            level_real: real[i],
            level_nominal: nominal[i],
            growth: growth[i],
            contribution: contribution[i],
            deflator: deflator[i],
        })
        .collect();
    NodeSeries {
        name: name.to_string(),
        data,
    }
}
