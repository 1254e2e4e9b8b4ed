//! Data types crossing the decomposition engine's boundaries.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Observation frequency of a time series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Frequency {
    /// Quarterly observations, period labels `YYYYQ#`.
    #[serde(rename = "Q")]
    Quarterly,
    /// Yearly observations, period labels `YYYY`.
    #[serde(rename = "Y")]
    Yearly,
}

impl Frequency {
    /// Number of periods per year at this frequency.
    #[must_use]
    pub const fn periods_per_year(self) -> usize {
        match self {
            Self::Quarterly => 4,
            Self::Yearly => 1,
        }
    }

    /// Wire code used by the TED API (`"Q"` / `"Y"`).
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Quarterly => "Q",
            Self::Yearly => "Y",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Q" => Ok(Self::Quarterly),
            "Y" => Ok(Self::Yearly),
            other => Err(format!("unknown frequency '{other}', expected Q or Y")),
        }
    }
}

/// Expected quarterly period label for a year label and quarter index
/// (0-based), e.g. `("2002", 1)` -> `"2002Q2"`.
#[must_use]
pub fn quarter_label(year: &str, quarter: usize) -> String {
    format!("{year}Q{}", quarter + 1)
}

/// Raw nominal and real vectors for one frequency, aligned to one shared
/// period vector.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    /// Period labels, ascending.
    pub periods: Vec<String>,
    /// Real values per loadable node name, aligned with `periods`.
    pub real: HashMap<String, Vec<f64>>,
    /// Nominal values per loadable node name, aligned with `periods`.
    pub nominal: HashMap<String, Vec<f64>>,
}

/// Raw series for both frequencies; the engine's sole data input.
#[derive(Debug, Clone, Default)]
pub struct RawBundle {
    /// Quarterly table.
    pub quarterly: RawTable,
    /// Yearly table.
    pub yearly: RawTable,
}

impl RawBundle {
    /// The table for a frequency.
    #[must_use]
    pub const fn table(&self, frequency: Frequency) -> &RawTable {
        match frequency {
            Frequency::Quarterly => &self.quarterly,
            Frequency::Yearly => &self.yearly,
        }
    }
}

/// One calculated period record. `growth` and `contribution` are NaN for
/// periods lacking sufficient trailing history; NaN serializes as JSON
/// null.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodValue {
    /// Period label.
    pub t: String,
    /// Signed real (chain-volume) level.
    pub level_real: f64,
    /// Signed nominal level.
    pub level_nominal: f64,
    /// Growth over the same period one year earlier.
    pub growth: f64,
    /// Contribution to the aggregate's growth.
    pub contribution: f64,
    /// Implied deflator, nominal over real.
    pub deflator: f64,
}

/// Calculated series for one node at one frequency.
#[derive(Debug, Clone, Serialize)]
pub struct NodeSeries {
    /// Node name.
    pub name: String,
    /// Period records, ascending.
    pub data: Vec<PeriodValue>,
}

/// Calculated series for every node, per frequency, in tree pre-order.
/// Produced in a single batch pass per load and never mutated afterward.
#[derive(Debug, Clone, Serialize)]
pub struct DecompositionResult {
    /// Quarterly series.
    pub quarterly: Vec<NodeSeries>,
    /// Yearly series.
    pub yearly: Vec<NodeSeries>,
}

impl DecompositionResult {
    /// The series list for a frequency.
    #[must_use]
    pub fn series(&self, frequency: Frequency) -> &[NodeSeries] {
        match frequency {
            Frequency::Quarterly => &self.quarterly,
            Frequency::Yearly => &self.yearly,
        }
    }
}

/// Knobs of a decomposition run.
#[derive(Debug, Clone)]
pub struct DecompositionSettings {
    /// Chain-linking base year.
    pub base_year: i32,
    /// Name of the expenditure aggregate (GDE) that weighted
    /// contributions are measured against.
    pub aggregate: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(Frequency::Quarterly, 4; "quarterly")]
    #[test_case(Frequency::Yearly, 1; "yearly")]
    fn test_periods_per_year(freq: Frequency, expected: usize) {
        assert_eq!(freq.periods_per_year(), expected);
    }

    #[test]
    fn test_frequency_roundtrip() {
        assert_eq!("Q".parse::<Frequency>().unwrap(), Frequency::Quarterly);
        assert_eq!("Y".parse::<Frequency>().unwrap(), Frequency::Yearly);
        assert!("M".parse::<Frequency>().is_err());
        assert_eq!(Frequency::Quarterly.to_string(), "Q");
    }

    #[test]
    fn test_quarter_label() {
        assert_eq!(quarter_label("2002", 0), "2002Q1");
        assert_eq!(quarter_label("2002", 3), "2002Q4");
    }

    #[test]
    fn test_frequency_serde_codes() {
        assert_eq!(
            serde_json::to_string(&Frequency::Quarterly).unwrap(),
            "\"Q\""
        );
        let freq: Frequency = serde_json::from_str("\"Y\"").unwrap();
        assert_eq!(freq, Frequency::Yearly);
    }
}
