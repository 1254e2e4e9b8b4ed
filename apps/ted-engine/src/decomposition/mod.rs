//! Contribution and chain-volume decomposition of national accounts.
//!
//! The engine is a pure function from a raw series bundle and a series
//! tree to calculated levels, growth, and contributions for every node.
//! It performs no I/O and holds no mutable state; see
//! [`DecompositionEngine::decompose`] for the resolution order.

mod aggregate;
mod bootstrap;
mod direct;
mod engine;
mod error;
mod math;
mod types;

pub use engine::DecompositionEngine;
pub use error::{ComputeError, DataError, DecompositionError};
pub use types::{
    DecompositionResult, DecompositionSettings, Frequency, NodeSeries, PeriodValue, RawBundle,
    RawTable, quarter_label,
};
