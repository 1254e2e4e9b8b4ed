//! External data source: raw nominal and real series.
//!
//! The engine needs four fetches per load (nominal and real, quarterly
//! and yearly), joined before decomposition runs. [`load_raw_bundle`]
//! owns that join and the reshaping of wire responses into a
//! [`RawBundle`] keyed by node name.

mod ted;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::decomposition::{Frequency, RawBundle, RawTable};
use crate::series::SeriesTree;

pub use ted::TedClient;

/// Failures talking to or interpreting the data source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Transport-level failure.
    #[error("Request to data source failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status.
    #[error("Data source returned status {status} for {url}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Request URL.
        url: String,
    },

    /// A requested series is absent from the response.
    #[error("Series '{name}' missing from {frequency} response")]
    MissingSeries {
        /// The wire name requested.
        name: String,
        /// Frequency of the request.
        frequency: Frequency,
    },

    /// A series' values are not aligned with the response periods.
    #[error("Series '{name}' has {actual} values for {expected} {frequency} periods")]
    Misaligned {
        /// The wire name.
        name: String,
        /// Frequency of the request.
        frequency: Frequency,
        /// Period count.
        expected: usize,
        /// Value count.
        actual: usize,
    },

    /// The nominal and real responses for one frequency disagree on the
    /// period axis.
    #[error("Nominal and real {frequency} responses disagree on periods")]
    PeriodSkew {
        /// The affected frequency.
        frequency: Frequency,
    },
}

/// Request body for a batch series fetch.
#[derive(Debug, Clone, Serialize)]
pub struct TedRequest {
    /// Wire series names.
    pub series: Vec<String>,
    /// Frequency code, `"Q"` or `"Y"`.
    pub freq: String,
    /// First period requested, `"1993Q1"` or `"1993"`.
    pub start_period: String,
}

/// One series in a fetch response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TedSeries {
    /// Wire series name as requested.
    pub name: String,
    /// Values aligned with the response periods.
    pub values: Vec<f64>,
}

/// Response body of a batch series fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TedResponse {
    /// Period labels, ascending.
    pub periods: Vec<String>,
    /// Requested series, in request order.
    pub series: Vec<TedSeries>,
}

/// A provider of raw time series.
#[async_trait]
pub trait SeriesSource: Send + Sync {
    /// Fetch the named series at one frequency from `start_period` on.
    async fn fetch(
        &self,
        series: &[String],
        frequency: Frequency,
        start_period: &str,
    ) -> Result<TedResponse, SourceError>;
}

/// Nominal wire name for a node (`"gdp"` -> `"gdpn"`).
fn nominal_name(name: &str) -> String {
    format!("{name}n")
}

/// Real wire name for a node (`"gdp"` -> `"gdpr"`).
fn real_name(name: &str) -> String {
    format!("{name}r")
}

/// Fetch every loadable series of the tree at both frequencies and
/// reshape the four responses into one [`RawBundle`].
///
/// All four fetches run concurrently; decomposition cannot start until
/// the last one lands, so a failure of any aborts the load.
pub async fn load_raw_bundle<S>(
    source: &S,
    tree: &SeriesTree,
    start_year: i32,
) -> Result<RawBundle, SourceError>
where
    S: SeriesSource + ?Sized,
{
    let names = tree.series_to_load();
    let nominal: Vec<String> = names.iter().map(|n| nominal_name(n)).collect();
    let real: Vec<String> = names.iter().map(|n| real_name(n)).collect();

    let quarterly_start = format!("{start_year}Q1");
    let yearly_start = start_year.to_string();

    let (nominal_q, real_q, nominal_y, real_y) = tokio::try_join!(
        source.fetch(&nominal, Frequency::Quarterly, &quarterly_start),
        source.fetch(&real, Frequency::Quarterly, &quarterly_start),
        source.fetch(&nominal, Frequency::Yearly, &yearly_start),
        source.fetch(&real, Frequency::Yearly, &yearly_start),
    )?;

    Ok(RawBundle {
        quarterly: reshape(&names, Frequency::Quarterly, nominal_q, real_q)?,
        yearly: reshape(&names, Frequency::Yearly, nominal_y, real_y)?,
    })
}

/// Turn a (nominal, real) response pair into a [`RawTable`] keyed by
/// node name, suffixes stripped.
fn reshape(
    names: &[String],
    frequency: Frequency,
    nominal: TedResponse,
    real: TedResponse,
) -> Result<RawTable, SourceError> {
    if nominal.periods != real.periods {
        return Err(SourceError::PeriodSkew { frequency });
    }

    let mut table = RawTable {
        periods: real.periods.clone(),
        ..RawTable::default()
    };
    for name in names {
        let values = extract(&real, &real_name(name), frequency, table.periods.len())?;
        table.real.insert(name.clone(), values);
        let values = extract(&nominal, &nominal_name(name), frequency, table.periods.len())?;
        table.nominal.insert(name.clone(), values);
    }
    Ok(table)
}

fn extract(
    response: &TedResponse,
    wire_name: &str,
    frequency: Frequency,
    expected: usize,
) -> Result<Vec<f64>, SourceError> {
    let series = response
        .series
        .iter()
        .find(|s| s.name == wire_name)
        .ok_or_else(|| SourceError::MissingSeries {
            name: wire_name.to_string(),
            frequency,
        })?;
    if series.values.len() != expected {
        return Err(SourceError::Misaligned {
            name: wire_name.to_string(),
            frequency,
            expected,
            actual: series.values.len(),
        });
    }
    Ok(series.values.clone())
}
