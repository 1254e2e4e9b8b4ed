// Allow unwrap/expect in tests - tests should panic on unexpected errors
// Allow test-specific patterns and pedantic lints in test code
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::too_many_lines,
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::needless_pass_by_value,
        clippy::default_trait_access,
        clippy::items_after_statements
    )
)]

//! TED Engine - National-Accounts Decomposition Service
//!
//! Fetches Thailand's quarterly and yearly national-accounts series from
//! the TED API, decomposes them into levels, growth, and
//! contribution-to-growth for every node of the expenditure tree, and
//! serves the result over a small REST API.
//!
//! # Modules
//!
//! - `series`: the declarative series hierarchy (tree build, colors,
//!   catalog of the Thailand expenditure tree)
//! - `decomposition`: the pure engine, including the chain-volume
//!   real-level bootstrap and contribution weighting
//! - `source`: the TED HTTP client and raw-bundle assembly
//! - `server`: REST endpoints over the calculated series
//! - `config` / `telemetry`: ambient setup

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod decomposition;
pub mod series;
pub mod server;
pub mod source;
pub mod telemetry;

pub use config::{Config, ConfigError, load_config, load_config_from_string};
pub use decomposition::{
    DecompositionEngine, DecompositionError, DecompositionResult, DecompositionSettings,
    Frequency, RawBundle,
};
pub use series::{SeriesTree, TreeError};
pub use source::{SeriesSource, SourceError, TedClient, load_raw_bundle};
