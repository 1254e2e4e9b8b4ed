//! Series-tree model: the hierarchy of named economic series.
//!
//! Pure data plus tree-traversal utilities; no numerics. The
//! decomposition engine consumes the tree read-only.

pub mod catalog;
mod color;
mod definition;
mod tree;

pub use color::Color;
pub use definition::{Derivation, DisplayMode, SeriesDefinition};
pub use tree::{ROOT_PARENT, SeriesNode, SeriesTree, TreeError};
