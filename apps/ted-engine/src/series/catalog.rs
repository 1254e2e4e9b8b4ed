//! The Thailand expenditure-side national-accounts hierarchy.
//!
//! Series names follow the TED API conventions: the engine requests
//! `<name>n` for nominal and `<name>r` for real values.

use super::definition::{Derivation, DisplayMode, SeriesDefinition};
use super::tree::{SeriesTree, TreeError};

/// Year whose real level is defined to equal its nominal level
/// (deflator = 1), anchoring the chain-linking recursion.
pub const BASE_YEAR: i32 = 2002;

/// First year of history requested from TED.
pub const START_YEAR: i32 = 1993;

/// Name of the expenditure-side aggregate every weighted contribution is
/// measured against.
pub const AGGREGATE: &str = "gde";

/// Default chart palette, in display order.
pub const PALETTE: [&str; 10] = [
    "#7cb5ec", "#434348", "#90ed7d", "#f7a35c", "#8085e9", "#f15c80", "#e4d354", "#2b908f",
    "#f45b5b", "#91e8e1",
];

/// The declarative definition of the GDP expenditure tree.
///
/// Imports are negatively signed so that net exports is a plain sum of
/// its children. Change in inventories sits outside the domestic-demand
/// chain sum: its level legitimately crosses zero, which would poison a
/// chained aggregate's deflators. The statistical discrepancy is the
/// residual between the production-side and expenditure-side measures
/// and only its contribution is meaningful to display.
#[must_use]
pub fn expenditure_definition() -> Vec<SeriesDefinition> {
    vec![
        SeriesDefinition::loaded("gdp", "GDP")
            .color(PALETTE[0])
            .children(vec![
                SeriesDefinition::loaded("gde", "Gross Domestic Expenditure")
                    .color(PALETTE[1])
                    .children(vec![
                        SeriesDefinition::new(
                            "dd",
                            "Domestic Demand",
                            Derivation::ChainVolumeSum,
                        )
                        .children(vec![
                            SeriesDefinition::new(
                                "c",
                                "Consumption",
                                Derivation::ChainVolumeSum,
                            )
                            .children(vec![
                                SeriesDefinition::loaded("cp", "Private Consumption")
                                    .color(PALETTE[2]),
                                SeriesDefinition::loaded("cg", "Government Consumption")
                                    .color(PALETTE[3]),
                            ]),
                            SeriesDefinition::new(
                                "i",
                                "Investment",
                                Derivation::ChainVolumeSum,
                            )
                            .children(vec![
                                SeriesDefinition::loaded("ip", "Private Investment")
                                    .color(PALETTE[4]),
                                SeriesDefinition::loaded("ig", "Public Investment")
                                    .color(PALETTE[5]),
                            ]),
                        ]),
                        SeriesDefinition::loaded("stk", "Change in Inventories")
                            .color(PALETTE[6])
                            .hide(&[DisplayMode::Growth]),
                        SeriesDefinition::new("nx", "Net Exports", Derivation::Balance)
                            .children(vec![
                                SeriesDefinition::loaded("x", "Exports").color(PALETTE[7]),
                                SeriesDefinition::loaded("m", "Imports")
                                    .color(PALETTE[8])
                                    .negative(),
                            ]),
                    ]),
                SeriesDefinition::new(
                    "stat",
                    "Statistical Discrepancy",
                    Derivation::Residual {
                        of: "gdp".to_string(),
                        less: "gde".to_string(),
                    },
                )
                .color(PALETTE[9])
                .hide(&[DisplayMode::Level, DisplayMode::Growth]),
            ]),
    ]
}

/// Build the validated, color-resolved Thailand expenditure tree.
pub fn expenditure_tree() -> Result<SeriesTree, TreeError> {
    SeriesTree::build(&expenditure_definition())
}
