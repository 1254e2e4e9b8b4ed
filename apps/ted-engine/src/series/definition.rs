//! Declarative series definitions.
//!
//! A dashboard page declares its series hierarchy as a nested
//! [`SeriesDefinition`] tree. The tree is flattened and validated once by
//! [`crate::series::SeriesTree::build`] before any data is fetched.

use serde::{Deserialize, Serialize};

/// Display modes a node can suppress in the rendering layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    /// Real/nominal level view.
    Level,
    /// Year-over-year growth view.
    Growth,
    /// Contribution-to-growth view.
    Contribution,
}

/// How a node's values come into existence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Derivation {
    /// Fetched directly from the data source (nominal + real vectors).
    Loaded,
    /// Chain-volume aggregate of its children; real levels are
    /// reconstructed by the iterative deflator bootstrap.
    ChainVolumeSum,
    /// Plain arithmetic sum of already-signed children (net exports:
    /// exports plus negatively-signed imports).
    Balance,
    /// Residual of two other nodes anywhere in the tree (statistical
    /// discrepancy: expenditure measure less income-side measure).
    Residual {
        /// Name of the minuend node.
        of: String,
        /// Name of the subtrahend node.
        less: String,
    },
}

impl Derivation {
    /// Whether this node's values must be derived rather than fetched.
    #[must_use]
    pub const fn skip_loading(&self) -> bool {
        !matches!(self, Self::Loaded)
    }
}

/// One node of the declarative series hierarchy.
#[derive(Debug, Clone)]
pub struct SeriesDefinition {
    /// Unique key, stable across frequencies and data requests.
    pub name: String,
    /// Display label.
    pub label: String,
    /// Explicit color (`#rrggbb`). Derived nodes may omit it and blend
    /// their children's colors; leaves must provide one.
    pub color: Option<String>,
    /// Flip the contribution sign relative to the raw value (imports).
    pub negative_contribution: bool,
    /// How the node's values are produced.
    pub derivation: Derivation,
    /// Display modes the rendering layer should suppress for this node.
    pub hide: Vec<DisplayMode>,
    /// Child definitions, in display order.
    pub children: Vec<SeriesDefinition>,
}

impl SeriesDefinition {
    /// New definition with the given derivation and no children.
    #[must_use]
    pub fn new(name: &str, label: &str, derivation: Derivation) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            color: None,
            negative_contribution: false,
            derivation,
            hide: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Shorthand for a node fetched from the data source.
    #[must_use]
    pub fn loaded(name: &str, label: &str) -> Self {
        Self::new(name, label, Derivation::Loaded)
    }

    /// Set an explicit color.
    #[must_use]
    pub fn color(mut self, color: &str) -> Self {
        self.color = Some(color.to_string());
        self
    }

    /// Flip the contribution sign (used for imports).
    #[must_use]
    pub const fn negative(mut self) -> Self {
        self.negative_contribution = true;
        self
    }

    /// Suppress the given display modes.
    #[must_use]
    pub fn hide(mut self, modes: &[DisplayMode]) -> Self {
        self.hide = modes.to_vec();
        self
    }

    /// Attach children, in display order.
    #[must_use]
    pub fn children(mut self, children: Vec<SeriesDefinition>) -> Self {
        self.children = children;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_loading() {
        assert!(!Derivation::Loaded.skip_loading());
        assert!(Derivation::ChainVolumeSum.skip_loading());
        assert!(Derivation::Balance.skip_loading());
        assert!(
            Derivation::Residual {
                of: "gdp".to_string(),
                less: "gde".to_string(),
            }
            .skip_loading()
        );
    }

    #[test]
    fn test_builder() {
        let def = SeriesDefinition::loaded("m", "Imports")
            .color("#f15c80")
            .negative()
            .hide(&[DisplayMode::Growth]);

        assert_eq!(def.name, "m");
        assert_eq!(def.color.as_deref(), Some("#f15c80"));
        assert!(def.negative_contribution);
        assert_eq!(def.hide, vec![DisplayMode::Growth]);
        assert!(def.children.is_empty());
    }
}
