//! Error types for the decomposition engine.

use thiserror::Error;

use crate::series::TreeError;
use super::types::Frequency;

/// Data-availability faults in a raw bundle, surfaced before any
/// computation begins. Decomposition either fully succeeds for all nodes
/// and frequencies or fails outright.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DataError {
    /// A series the tree expects to load is absent from the bundle.
    #[error("Series '{name}' ({kind}) missing from {frequency} data")]
    MissingSeries {
        /// Node name.
        name: String,
        /// `"real"` or `"nominal"`.
        kind: &'static str,
        /// Frequency of the missing table.
        frequency: Frequency,
    },

    /// A value vector is not aligned with its period vector.
    #[error(
        "Series '{name}' ({kind}) has {actual} {frequency} values, expected {expected}"
    )]
    LengthMismatch {
        /// Node name.
        name: String,
        /// `"real"` or `"nominal"`.
        kind: &'static str,
        /// Frequency of the misaligned table.
        frequency: Frequency,
        /// Period count.
        expected: usize,
        /// Value count.
        actual: usize,
    },

    /// Quarterly history does not cover whole years.
    #[error("{quarters} quarterly periods do not cover {years} yearly periods")]
    RaggedHistory {
        /// Quarterly period count.
        quarters: usize,
        /// Yearly period count.
        years: usize,
    },

    /// A quarterly period label does not match its year.
    #[error("Quarterly period '{found}' where '{expected}' was expected")]
    PeriodMismatch {
        /// The label found in the bundle.
        found: String,
        /// The label implied by the yearly periods.
        expected: String,
    },

    /// The chain-linking base year is not in the fetched history.
    #[error("Base year {base_year} not present in yearly periods")]
    BaseYearOutOfRange {
        /// The configured base year.
        base_year: i32,
    },

    /// A frequency's tables are empty.
    #[error("Raw bundle has no {frequency} periods")]
    EmptyTable {
        /// The empty frequency.
        frequency: Frequency,
    },
}

/// Arithmetic faults during decomposition. These indicate corrupt input
/// data, not expected sparse history, and are never masked.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ComputeError {
    /// A deflator came out zero or non-finite where the chain-linking
    /// recursion must divide by it.
    #[error("Degenerate deflator for '{name}' at {period}: {value}")]
    DegenerateDeflator {
        /// Node name.
        name: String,
        /// Period label.
        period: String,
        /// The offending value.
        value: f64,
    },

    /// The reference aggregate's real level is zero or non-finite where
    /// the contribution weighting must divide by it.
    #[error("Degenerate reference level for '{name}' at {period}: {value}")]
    DegenerateReferenceLevel {
        /// Node name.
        name: String,
        /// Period label.
        period: String,
        /// The offending value.
        value: f64,
    },
}

/// Any failure of a decomposition call.
#[derive(Debug, Error)]
pub enum DecompositionError {
    /// Tree lookup or configuration fault.
    #[error(transparent)]
    Tree(#[from] TreeError),

    /// Raw bundle incomplete or misaligned.
    #[error(transparent)]
    Data(#[from] DataError),

    /// Arithmetic degeneracy.
    #[error(transparent)]
    Compute(#[from] ComputeError),
}
