//! The flattened, immutable series tree.
//!
//! [`SeriesTree::build`] turns a nested declarative definition into a flat
//! pre-order list of [`SeriesNode`]s in two pure passes: flatten (assigning
//! parent and depth), then color resolution. Nothing mutates the tree after
//! construction, so no caller can ever observe a partially-initialized node.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use super::color::{Color, blend_equal};
use super::definition::{Derivation, DisplayMode, SeriesDefinition};

/// Sentinel parent name for root nodes.
pub const ROOT_PARENT: &str = "root";

/// Errors from building or querying a series tree.
///
/// All of these are configuration errors: fatal at build time, before any
/// data fetch is attempted.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// Two nodes share a name.
    #[error("Duplicate series name '{name}' in tree definition")]
    DuplicateName {
        /// The offending name.
        name: String,
    },

    /// A derived node has nothing to derive from.
    #[error("Derived series '{name}' has no children")]
    DerivedWithoutChildren {
        /// The offending name.
        name: String,
    },

    /// A leaf node was declared without a color.
    #[error("Leaf series '{name}' has no explicit color")]
    MissingLeafColor {
        /// The offending name.
        name: String,
    },

    /// A color literal failed to parse.
    #[error("Invalid color literal '{value}'")]
    InvalidColor {
        /// The offending literal.
        value: String,
    },

    /// A residual definition references a name outside the tree.
    #[error("Residual series '{name}' references unknown series '{reference}'")]
    UnknownReference {
        /// The residual node.
        name: String,
        /// The missing reference.
        reference: String,
    },

    /// A residual node sits under a derived aggregate. Residuals are
    /// resolved after the whole tree, so an aggregate cannot sum one.
    #[error("Residual series '{name}' cannot be a child of derived series '{parent}'")]
    ResidualChild {
        /// The residual node.
        name: String,
        /// The derived parent.
        parent: String,
    },

    /// Lookup of a name that is not in the tree. Callers treat this as a
    /// programming error, not a runtime data error.
    #[error("Unknown series '{name}'")]
    UnknownSeries {
        /// The requested name.
        name: String,
    },

    /// The definition list was empty.
    #[error("Series tree definition is empty")]
    Empty,
}

/// One flattened tree node. See the module docs for lifecycle.
#[derive(Debug, Clone)]
pub struct SeriesNode {
    /// Unique key, stable across frequencies.
    pub name: String,
    /// Display label.
    pub label: String,
    /// Resolved `#rrggbb` color.
    pub color: String,
    /// Whether the contribution sign is flipped relative to the raw value.
    pub negative_contribution: bool,
    /// How the node's values are produced.
    pub derivation: Derivation,
    /// Display modes suppressed by the rendering layer.
    pub hide: Vec<DisplayMode>,
    /// Child names, in display order.
    pub children: Vec<String>,
    /// Parent name; [`ROOT_PARENT`] for root nodes.
    pub parent: String,
    /// Distance from the root, for display indentation.
    pub depth: usize,
}

impl SeriesNode {
    /// Whether this node's values are derived rather than fetched.
    #[must_use]
    pub const fn skip_loading(&self) -> bool {
        self.derivation.skip_loading()
    }

    /// Level sign applied to the raw values.
    #[must_use]
    pub fn sign(&self) -> f64 {
        if self.negative_contribution { -1.0 } else { 1.0 }
    }
}

/// Immutable flat series hierarchy in pre-order.
#[derive(Debug, Clone)]
pub struct SeriesTree {
    nodes: Vec<SeriesNode>,
    index: HashMap<String, usize>,
}

impl SeriesTree {
    /// Build and validate a tree from nested definitions.
    ///
    /// Flattening is a deterministic pre-order traversal: each node is
    /// emitted before its descendants, children in declared order.
    pub fn build(defs: &[SeriesDefinition]) -> Result<Self, TreeError> {
        if defs.is_empty() {
            return Err(TreeError::Empty);
        }

        let mut nodes = Vec::new();
        for def in defs {
            flatten(def, ROOT_PARENT, 0, &mut nodes);
        }

        let mut index = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            if index.insert(node.name.clone(), i).is_some() {
                return Err(TreeError::DuplicateName {
                    name: node.name.clone(),
                });
            }
        }

        let tree = Self { nodes, index };
        tree.validate()?;
        tree.resolve_colors()
    }

    fn validate(&self) -> Result<(), TreeError> {
        for node in &self.nodes {
            match &node.derivation {
                Derivation::ChainVolumeSum | Derivation::Balance
                    if node.children.is_empty() =>
                {
                    return Err(TreeError::DerivedWithoutChildren {
                        name: node.name.clone(),
                    });
                }
                Derivation::Residual { of, less } => {
                    for reference in [of, less] {
                        if !self.index.contains_key(reference) {
                            return Err(TreeError::UnknownReference {
                                name: node.name.clone(),
                                reference: reference.clone(),
                            });
                        }
                    }
                    if node.parent != ROOT_PARENT {
                        let parent = &self.nodes[self.index[&node.parent]];
                        if matches!(
                            parent.derivation,
                            Derivation::ChainVolumeSum | Derivation::Balance
                        ) {
                            return Err(TreeError::ResidualChild {
                                name: node.name.clone(),
                                parent: node.parent.clone(),
                            });
                        }
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Second pass: blend colors for nodes that did not declare one.
    ///
    /// Runs after the full tree exists because a node's color depends on
    /// its children's resolved colors.
    fn resolve_colors(mut self) -> Result<Self, TreeError> {
        let mut resolved: HashMap<String, Color> = HashMap::new();
        // The node list is pre-order, so walking it backwards visits every
        // child before its parent.
        for i in (0..self.nodes.len()).rev() {
            let node = &self.nodes[i];
            let color = if node.color.is_empty() {
                let child_colors: Vec<Color> = node
                    .children
                    .iter()
                    .filter_map(|c| resolved.get(c).copied())
                    .collect();
                blend_equal(&child_colors).ok_or_else(|| TreeError::MissingLeafColor {
                    name: node.name.clone(),
                })?
            } else {
                Color::parse(&node.color)?
            };
            resolved.insert(node.name.clone(), color);
            self.nodes[i].color = color.to_hex();
        }
        Ok(self)
    }

    /// All nodes in pre-order.
    #[must_use]
    pub fn nodes(&self) -> &[SeriesNode] {
        &self.nodes
    }

    /// Exact-match lookup by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SeriesNode> {
        self.index.get(name).map(|&i| &self.nodes[i])
    }

    /// Lookup that treats an unknown name as an error.
    pub fn require(&self, name: &str) -> Result<&SeriesNode, TreeError> {
        self.get(name).ok_or_else(|| TreeError::UnknownSeries {
            name: name.to_string(),
        })
    }

    /// The first root node (the aggregate the whole page hangs off).
    #[must_use]
    pub fn root(&self) -> &SeriesNode {
        // Build rejects empty definitions, so index 0 always exists.
        &self.nodes[0]
    }

    /// The node's children with derived children recursively replaced by
    /// their own loadable descendants.
    ///
    /// This is the set of names that must actually be fetched from the
    /// data source to reconstruct the node's quantity.
    pub fn raw_children(&self, name: &str) -> Result<Vec<String>, TreeError> {
        let node = self.require(name)?;
        let mut out = Vec::new();
        for child in &node.children {
            let child_node = self.require(child)?;
            if child_node.skip_loading() {
                out.extend(self.raw_children(child)?);
            } else {
                out.push(child_node.name.clone());
            }
        }
        Ok(out)
    }

    /// Names of every node that must be requested from the data source,
    /// in pre-order.
    #[must_use]
    pub fn series_to_load(&self) -> Vec<String> {
        self.nodes
            .iter()
            .filter(|n| !n.skip_loading())
            .map(|n| n.name.clone())
            .collect()
    }

    /// Whether any ancestor of `name` is in the externally-owned
    /// collapsed set. Used by the rendering layer to hide rows.
    pub fn is_any_parent_collapsed(
        &self,
        name: &str,
        collapsed: &HashSet<String>,
    ) -> Result<bool, TreeError> {
        let mut current = self.require(name)?;
        while current.parent != ROOT_PARENT {
            if collapsed.contains(&current.parent) {
                return Ok(true);
            }
            current = self.require(&current.parent)?;
        }
        Ok(false)
    }

    /// Nodes in post-order: every child precedes its parent.
    ///
    /// This is the explicit dependency order the decomposition engine
    /// resolves nodes in.
    #[must_use]
    pub fn post_order(&self) -> Vec<&SeriesNode> {
        let mut out = Vec::with_capacity(self.nodes.len());
        for node in &self.nodes {
            if node.parent == ROOT_PARENT {
                self.post_order_from(node, &mut out);
            }
        }
        out
    }

    fn post_order_from<'a>(&'a self, node: &'a SeriesNode, out: &mut Vec<&'a SeriesNode>) {
        for child in &node.children {
            if let Some(child_node) = self.get(child) {
                self.post_order_from(child_node, out);
            }
        }
        out.push(node);
    }
}

/// Pre-order flatten of one definition subtree.
fn flatten(def: &SeriesDefinition, parent: &str, depth: usize, out: &mut Vec<SeriesNode>) {
    out.push(SeriesNode {
        name: def.name.clone(),
        label: def.label.clone(),
        color: def.color.clone().unwrap_or_default(),
        negative_contribution: def.negative_contribution,
        derivation: def.derivation.clone(),
        hide: def.hide.clone(),
        children: def.children.iter().map(|c| c.name.clone()).collect(),
        parent: parent.to_string(),
        depth,
    });
    for child in &def.children {
        flatten(child, &def.name, depth + 1, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_defs() -> Vec<SeriesDefinition> {
        vec![
            SeriesDefinition::loaded("gdp", "GDP")
                .color("#7cb5ec")
                .children(vec![
                    SeriesDefinition::new("c", "Consumption", Derivation::ChainVolumeSum)
                        .children(vec![
                            SeriesDefinition::loaded("cp", "Private").color("#90ed7d"),
                            SeriesDefinition::loaded("cg", "Government").color("#f7a35c"),
                        ]),
                    SeriesDefinition::new("nx", "Net Exports", Derivation::Balance).children(
                        vec![
                            SeriesDefinition::loaded("x", "Exports").color("#8085e9"),
                            SeriesDefinition::loaded("m", "Imports")
                                .color("#f15c80")
                                .negative(),
                        ],
                    ),
                ]),
        ]
    }

    #[test]
    fn test_preorder_flatten_assigns_parent_and_depth() {
        let tree = SeriesTree::build(&small_defs()).unwrap();
        let names: Vec<&str> = tree.nodes().iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["gdp", "c", "cp", "cg", "nx", "x", "m"]);

        let cp = tree.get("cp").unwrap();
        assert_eq!(cp.parent, "c");
        assert_eq!(cp.depth, 2);

        let gdp = tree.get("gdp").unwrap();
        assert_eq!(gdp.parent, ROOT_PARENT);
        assert_eq!(gdp.depth, 0);
    }

    #[test]
    fn test_build_is_deterministic() {
        let a = SeriesTree::build(&small_defs()).unwrap();
        let b = SeriesTree::build(&small_defs()).unwrap();
        let names = |t: &SeriesTree| {
            t.nodes()
                .iter()
                .map(|n| (n.name.clone(), n.color.clone(), n.depth))
                .collect::<Vec<_>>()
        };
        assert_eq!(names(&a), names(&b));
    }

    #[test]
    fn test_derived_colors_blend_children() {
        let tree = SeriesTree::build(&small_defs()).unwrap();
        // 1:1 mix of #90ed7d and #f7a35c.
        assert_eq!(tree.get("c").unwrap().color, "#c4c86d");
        // Leaves keep their explicit colors.
        assert_eq!(tree.get("x").unwrap().color, "#8085e9");
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let defs = vec![
            SeriesDefinition::loaded("gdp", "GDP").color("#7cb5ec"),
            SeriesDefinition::loaded("gdp", "GDP again").color("#434348"),
        ];
        assert_eq!(
            SeriesTree::build(&defs).unwrap_err(),
            TreeError::DuplicateName {
                name: "gdp".to_string()
            }
        );
    }

    #[test]
    fn test_leaf_without_color_rejected() {
        let defs = vec![SeriesDefinition::loaded("gdp", "GDP")];
        assert_eq!(
            SeriesTree::build(&defs).unwrap_err(),
            TreeError::MissingLeafColor {
                name: "gdp".to_string()
            }
        );
    }

    #[test]
    fn test_derived_without_children_rejected() {
        let defs = vec![SeriesDefinition::new(
            "c",
            "Consumption",
            Derivation::ChainVolumeSum,
        )];
        assert_eq!(
            SeriesTree::build(&defs).unwrap_err(),
            TreeError::DerivedWithoutChildren {
                name: "c".to_string()
            }
        );
    }

    #[test]
    fn test_residual_reference_must_exist() {
        let defs = vec![
            SeriesDefinition::loaded("gdp", "GDP").color("#7cb5ec"),
            SeriesDefinition::new(
                "stat",
                "Stat. Discrepancy",
                Derivation::Residual {
                    of: "gdp".to_string(),
                    less: "gde".to_string(),
                },
            )
            .color("#999999"),
        ];
        assert_eq!(
            SeriesTree::build(&defs).unwrap_err(),
            TreeError::UnknownReference {
                name: "stat".to_string(),
                reference: "gde".to_string()
            }
        );
    }

    #[test]
    fn test_residual_under_derived_parent_rejected() {
        let defs = vec![
            SeriesDefinition::loaded("a", "A").color("#7cb5ec"),
            SeriesDefinition::loaded("b", "B").color("#434348"),
            SeriesDefinition::new("sum", "Sum", Derivation::Balance).children(vec![
                SeriesDefinition::loaded("x", "X").color("#90ed7d"),
                SeriesDefinition::new(
                    "res",
                    "Residual",
                    Derivation::Residual {
                        of: "a".to_string(),
                        less: "b".to_string(),
                    },
                )
                .color("#f7a35c"),
            ]),
        ];
        assert_eq!(
            SeriesTree::build(&defs).unwrap_err(),
            TreeError::ResidualChild {
                name: "res".to_string(),
                parent: "sum".to_string()
            }
        );
    }

    #[test]
    fn test_raw_children_flattens_through_derived_nodes() {
        let tree = SeriesTree::build(&small_defs()).unwrap();
        // Both direct children of gdp are derived, so the raw set is
        // their loadable leaves.
        assert_eq!(
            tree.raw_children("gdp").unwrap(),
            vec!["cp", "cg", "x", "m"]
        );
        assert_eq!(tree.raw_children("nx").unwrap(), vec!["x", "m"]);
    }

    #[test]
    fn test_series_to_load() {
        let tree = SeriesTree::build(&small_defs()).unwrap();
        assert_eq!(tree.series_to_load(), vec!["gdp", "cp", "cg", "x", "m"]);
    }

    #[test]
    fn test_is_any_parent_collapsed() {
        let tree = SeriesTree::build(&small_defs()).unwrap();
        let mut collapsed = HashSet::new();
        assert!(!tree.is_any_parent_collapsed("cp", &collapsed).unwrap());

        collapsed.insert("c".to_string());
        assert!(tree.is_any_parent_collapsed("cp", &collapsed).unwrap());
        // Collapsing a node hides its descendants, not the node itself.
        assert!(!tree.is_any_parent_collapsed("c", &collapsed).unwrap());
        assert!(!tree.is_any_parent_collapsed("x", &collapsed).unwrap());
    }

    #[test]
    fn test_post_order_children_before_parents() {
        let tree = SeriesTree::build(&small_defs()).unwrap();
        let order: Vec<&str> = tree.post_order().iter().map(|n| n.name.as_str()).collect();
        assert_eq!(order, vec!["cp", "cg", "c", "x", "m", "nx", "gdp"]);
    }

    #[test]
    fn test_unknown_lookup() {
        let tree = SeriesTree::build(&small_defs()).unwrap();
        assert!(tree.get("nope").is_none());
        assert_eq!(
            tree.require("nope").unwrap_err(),
            TreeError::UnknownSeries {
                name: "nope".to_string()
            }
        );
    }

    #[test]
    fn test_sign() {
        let tree = SeriesTree::build(&small_defs()).unwrap();
        assert_eq!(tree.get("m").unwrap().sign(), -1.0);
        assert_eq!(tree.get("x").unwrap().sign(), 1.0);
    }
}
